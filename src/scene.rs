//! Scene graph produced by the document parser
//!
//! The tree structure of the source markup is flattened at parse time:
//! group transforms and styles are folded into each shape, so the scene
//! is a plain paint-ordered list. Later shapes draw over earlier ones.
use crate::{
    geometry::{BBox, Point, Scalar},
    grad::Paint,
    path::{FillRule, Path, StrokeStyle},
};

/// One drawable element, immutable once parsed
///
/// Geometry is stored in document space, all transforms were applied to
/// the control points by the parser.
#[derive(Debug, Clone)]
pub struct Shape {
    pub path: Path,
    pub fill: Option<Paint>,
    pub fill_rule: FillRule,
    pub stroke: Option<Paint>,
    pub stroke_style: StrokeStyle,
    /// group and element opacity folded together, in [0, 1]
    pub opacity: Scalar,
}

impl Shape {
    /// Shape draws nothing and can be dropped at parse time
    pub fn is_invisible(&self) -> bool {
        self.path.is_empty()
            || self.opacity <= 0.0
            || (self.fill.is_none() && self.stroke.is_none())
    }

    /// Bounding box of the geometry, including the stroke extent
    pub fn bbox(&self) -> Option<BBox> {
        let bbox = self.path.bbox()?;
        if self.stroke.is_some() {
            let half = self.stroke_style.width / 2.0;
            Some(
                bbox.extend(bbox.min() - Point::new(half, half))
                    .extend(bbox.max() + Point::new(half, half)),
            )
        } else {
            Some(bbox)
        }
    }
}

/// Parsed SVG document: resolved size plus shapes in paint order
#[derive(Debug, Clone)]
pub struct Document {
    /// width in internal units (px at the parse DPI)
    pub width: Scalar,
    /// height in internal units
    pub height: Scalar,
    pub shapes: Vec<Shape>,
}

impl Document {
    /// Bounding box of the content, `None` for an empty document
    pub fn content_bbox(&self) -> Option<BBox> {
        self.shapes
            .iter()
            .fold(None, |bbox, shape| match (bbox, shape.bbox()) {
                (Some(bbox), Some(other)) => Some(bbox.union(other)),
                (bbox, other) => bbox.or(other),
            })
    }
}
