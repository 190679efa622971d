//! SVG document parser
//!
//! Walks the markup tree and flattens it into a [`Document`]: transforms
//! are applied to control points, styles are folded into shapes, gradient
//! references are resolved against a symbol table built upfront.
//!
//! Malformed attributes never fail the document. Every attribute helper
//! returns an `Option`, absent values fall back to the SVG default and a
//! debug event is emitted, so one bad value drops at most its own
//! attribute. Only document-level problems (empty input, broken markup,
//! missing root element) produce a [`ParseError`].
use crate::{
    color::RGBA,
    geometry::{BBox, PI, Point, Scalar, Transform},
    grad::{GradLinear, GradRadial, GradSpread, GradStop, Paint},
    path::{FillRule, LineCap, LineJoin, Path, PathBuilder, StrokeStyle},
    scene::{Document, Shape},
};
use roxmltree::Node;
use std::{collections::HashMap, io::Read};
use tracing::debug;

/// Default unit used when the caller does not specify one
pub const DEFAULT_UNITS: &str = "px";
/// Default DPI used to resolve physical units
pub const DEFAULT_DPI: Scalar = 96.0;

/// Unrecoverable document-level parsing error
///
/// Never produced for attribute-level malformation, that degrades to
/// defaults instead.
#[derive(Debug)]
pub enum ParseError {
    /// Input byte stream is empty
    Empty,
    /// Markup is malformed beyond recovery
    Xml(roxmltree::Error),
    /// Root `<svg>` element is missing
    MissingRoot,
    /// Failed to read the input stream
    Io(std::io::Error),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Empty => write!(f, "input is empty"),
            ParseError::Xml(error) => write!(f, "malformed markup: {error}"),
            ParseError::MissingRoot => write!(f, "root <svg> element is missing"),
            ParseError::Io(error) => write!(f, "failed to read input: {error}"),
        }
    }
}

impl From<roxmltree::Error> for ParseError {
    fn from(error: roxmltree::Error) -> Self {
        Self::Xml(error)
    }
}

impl From<std::io::Error> for ParseError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl std::error::Error for ParseError {}

impl Document {
    /// Parse SVG text with default units and DPI (`"px"`, 96)
    pub fn parse_str(text: &str) -> Result<Document, ParseError> {
        Self::parse_str_with(text, DEFAULT_UNITS, DEFAULT_DPI)
    }

    /// Parse SVG text, resolving physical units at `dpi` and expressing
    /// the result in `units`
    pub fn parse_str_with(text: &str, units: &str, dpi: Scalar) -> Result<Document, ParseError> {
        let _span = tracing::debug_span!("parse", units, dpi).entered();
        if text.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let xml = roxmltree::Document::parse(text)?;
        let root = xml
            .root()
            .children()
            .find(|node| node.is_element() && node.tag_name().name() == "svg")
            .ok_or(ParseError::MissingRoot)?;
        let mut document = TreeParser::new(dpi).parse_root(root);
        // internally everything is resolved to px, convert to the
        // requested output unit at the end
        let factor = unit_factor(units, dpi).unwrap_or(1.0);
        if (factor - 1.0).abs() > 1e-12 {
            let tr = Transform::new_scale(1.0 / factor, 1.0 / factor);
            document.width /= factor;
            document.height /= factor;
            for shape in document.shapes.iter_mut() {
                shape.path.transform(tr);
                shape.stroke_style.width /= factor;
            }
        }
        Ok(document)
    }

    /// Read the source to exhaustion and parse it with default units and DPI
    pub fn load(input: impl Read) -> Result<Document, ParseError> {
        Self::load_with(input, DEFAULT_UNITS, DEFAULT_DPI)
    }

    /// Read the source to exhaustion, then parse like [`Document::parse_str_with`]
    pub fn load_with(
        mut input: impl Read,
        units: &str,
        dpi: Scalar,
    ) -> Result<Document, ParseError> {
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            return Err(ParseError::Empty);
        }
        let text = String::from_utf8_lossy(&buffer);
        Self::parse_str_with(&text, units, dpi)
    }
}

/// Per-pixel multiplier of a unit suffix, `None` for unknown units
fn unit_factor(units: &str, dpi: Scalar) -> Option<Scalar> {
    match units {
        "" | "px" => Some(1.0),
        "pt" => Some(dpi / 72.0),
        "pc" => Some(dpi / 6.0),
        "mm" => Some(dpi / 25.4),
        "cm" => Some(dpi / 2.54),
        "in" => Some(dpi),
        _ => None,
    }
}

/// Inheritable presentation state, folded down the tree
#[derive(Clone)]
struct Attrs<'a> {
    tr: Transform,
    fill: RawPaint<'a>,
    fill_rule: FillRule,
    fill_opacity: Scalar,
    stroke: RawPaint<'a>,
    stroke_opacity: Scalar,
    stroke_width: Scalar,
    line_cap: LineCap,
    line_join: LineJoin,
    /// element opacities multiplied down the tree
    opacity: Scalar,
    /// value `currentColor` resolves to
    color: RGBA,
}

impl Default for Attrs<'_> {
    fn default() -> Self {
        Self {
            tr: Transform::identity(),
            fill: RawPaint::Color(RGBA::new(0, 0, 0, 255)),
            fill_rule: FillRule::NonZero,
            fill_opacity: 1.0,
            stroke: RawPaint::None,
            stroke_opacity: 1.0,
            stroke_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter(4.0),
            opacity: 1.0,
            color: RGBA::new(0, 0, 0, 255),
        }
    }
}

/// Paint value before gradient references are resolved
///
/// Gradient geometry can depend on the bounding box of the shape using
/// it, so `url(#id)` stays symbolic until the shape is emitted.
#[derive(Clone)]
enum RawPaint<'a> {
    None,
    Color(RGBA),
    CurrentColor,
    Ref(&'a str),
}

struct TreeParser<'a> {
    dpi: Scalar,
    /// paint server symbol table: first pass over the whole tree, so
    /// forward references resolve
    grads: HashMap<&'a str, Node<'a, 'a>>,
    shapes: Vec<Shape>,
    /// resolved viewport, used to resolve percentages
    view_width: Scalar,
    view_height: Scalar,
}

impl<'a> TreeParser<'a> {
    fn new(dpi: Scalar) -> Self {
        Self {
            dpi,
            grads: HashMap::new(),
            shapes: Vec::new(),
            view_width: 0.0,
            view_height: 0.0,
        }
    }

    fn parse_root(mut self, root: Node<'a, 'a>) -> Document {
        // pass one: collect all paint servers by id, anywhere in the tree
        for node in root.descendants() {
            if !node.is_element() {
                continue;
            }
            match node.tag_name().name() {
                "linearGradient" | "radialGradient" => {
                    if let Some(id) = node.attribute("id") {
                        self.grads.entry(id).or_insert(node);
                    }
                }
                _ => (),
            }
        }

        let view_box = root.attribute("viewBox").and_then(parse_view_box);
        let width = root
            .attribute("width")
            .and_then(|value| self.length(value, 0.0));
        let height = root
            .attribute("height")
            .and_then(|value| self.length(value, 0.0));
        let (mut width, mut height) = match (width, height, view_box) {
            (Some(w), Some(h), _) => (w, h),
            (_, _, Some(vb)) => (vb.width(), vb.height()),
            _ => (0.0, 0.0),
        };
        self.view_width = width;
        self.view_height = height;

        // viewBox maps its rectangle onto the viewport, uniformly
        // scaled and centered
        let mut attrs = Attrs::default();
        if let Some(vb) = view_box {
            if vb.width() > 0.0 && vb.height() > 0.0 && width > 0.0 && height > 0.0 {
                let scale = (width / vb.width()).min(height / vb.height());
                let tx = (width - vb.width() * scale) / 2.0;
                let ty = (height - vb.height() * scale) / 2.0;
                attrs.tr = Transform::new_translate(tx, ty)
                    .scale(scale, scale)
                    .translate(-vb.x(), -vb.y());
            }
        }

        // pass two: walk the tree emitting shapes
        for child in root.children() {
            self.element(child, &attrs);
        }

        // no explicit size anywhere, fall back to the content bounds
        let mut document = Document {
            width,
            height,
            shapes: std::mem::take(&mut self.shapes),
        };
        if width <= 0.0 || height <= 0.0 {
            if let Some(bbox) = document.content_bbox() {
                width = bbox.max().x().max(0.0);
                height = bbox.max().y().max(0.0);
            }
            document.width = width;
            document.height = height;
        }
        document
    }

    fn element(&mut self, node: Node<'a, 'a>, parent: &Attrs<'a>) {
        if !node.is_element() {
            return;
        }
        match node.tag_name().name() {
            "g" => {
                let attrs = self.attrs(node, parent);
                for child in node.children() {
                    self.element(child, &attrs);
                }
            }
            // children of defs are only referenced, never painted
            "defs" | "linearGradient" | "radialGradient" => (),
            "path" => {
                let attrs = self.attrs(node, parent);
                let path = node.attribute("d").map(parse_path_data).unwrap_or_default();
                self.emit(path, &attrs);
            }
            "rect" => {
                let attrs = self.attrs(node, parent);
                let x = self.attr_length(node, "x", self.view_width).unwrap_or(0.0);
                let y = self.attr_length(node, "y", self.view_height).unwrap_or(0.0);
                let width = self.attr_length(node, "width", self.view_width);
                let height = self.attr_length(node, "height", self.view_height);
                // rx/ry default to each other when only one is present
                let rx = self.attr_length(node, "rx", self.view_width);
                let ry = self.attr_length(node, "ry", self.view_height);
                let rx = rx.or(ry).unwrap_or(0.0);
                let ry = ry.unwrap_or(rx);
                if let (Some(width), Some(height)) = (width, height) {
                    if width > 0.0 && height > 0.0 {
                        let mut builder = Path::builder();
                        builder.move_to((x, y)).rbox((width, height), (rx, ry));
                        self.emit(builder.build(), &attrs);
                    }
                }
            }
            "circle" => {
                let attrs = self.attrs(node, parent);
                let cx = self.attr_length(node, "cx", self.view_width).unwrap_or(0.0);
                let cy = self.attr_length(node, "cy", self.view_height).unwrap_or(0.0);
                let r = self
                    .attr_length(node, "r", self.view_diagonal())
                    .unwrap_or(0.0);
                if r > 0.0 {
                    let mut builder = Path::builder();
                    builder.ellipse((cx, cy), r, r);
                    self.emit(builder.build(), &attrs);
                }
            }
            "ellipse" => {
                let attrs = self.attrs(node, parent);
                let cx = self.attr_length(node, "cx", self.view_width).unwrap_or(0.0);
                let cy = self.attr_length(node, "cy", self.view_height).unwrap_or(0.0);
                let rx = self.attr_length(node, "rx", self.view_width).unwrap_or(0.0);
                let ry = self.attr_length(node, "ry", self.view_height).unwrap_or(0.0);
                if rx > 0.0 && ry > 0.0 {
                    let mut builder = Path::builder();
                    builder.ellipse((cx, cy), rx, ry);
                    self.emit(builder.build(), &attrs);
                }
            }
            "line" => {
                let attrs = self.attrs(node, parent);
                let x1 = self.attr_length(node, "x1", self.view_width).unwrap_or(0.0);
                let y1 = self.attr_length(node, "y1", self.view_height).unwrap_or(0.0);
                let x2 = self.attr_length(node, "x2", self.view_width).unwrap_or(0.0);
                let y2 = self.attr_length(node, "y2", self.view_height).unwrap_or(0.0);
                let mut builder = Path::builder();
                builder.move_to((x1, y1)).line_to((x2, y2));
                self.emit(builder.build(), &attrs);
            }
            "polyline" | "polygon" => {
                let closed = node.tag_name().name() == "polygon";
                let attrs = self.attrs(node, parent);
                let points = node
                    .attribute("points")
                    .map(parse_points)
                    .unwrap_or_default();
                let mut builder = Path::builder();
                let mut points = points.into_iter();
                if let Some(first) = points.next() {
                    builder.move_to(first);
                    for point in points {
                        builder.line_to(point);
                    }
                    if closed {
                        builder.close();
                    }
                }
                self.emit(builder.build(), &attrs);
            }
            other => {
                debug!(element = other, "skipping unsupported element");
            }
        }
    }

    /// Emit a shape, resolving its symbolic paints
    fn emit(&mut self, mut path: Path, attrs: &Attrs<'a>) {
        if path.is_empty() {
            return;
        }
        path.transform(attrs.tr);
        let bbox = path.bbox();
        let fill = self.resolve_paint(&attrs.fill, attrs.fill_opacity, attrs.color, bbox);
        let stroke = self.resolve_paint(&attrs.stroke, attrs.stroke_opacity, attrs.color, bbox);
        // stroke width scales with the transform like the geometry does
        let stroke_width = attrs.stroke_width * attrs.tr.mean_scale();
        let shape = Shape {
            path,
            fill,
            fill_rule: attrs.fill_rule,
            stroke: stroke.filter(|_| stroke_width > 0.0),
            stroke_style: StrokeStyle {
                width: stroke_width,
                line_cap: attrs.line_cap,
                line_join: attrs.line_join,
            },
            opacity: attrs.opacity,
        };
        if !shape.is_invisible() {
            self.shapes.push(shape);
        }
    }

    /// Fold presentation attributes and the inline `style` into the
    /// inherited state; `style` properties win over attributes
    fn attrs(&self, node: Node<'a, 'a>, parent: &Attrs<'a>) -> Attrs<'a> {
        let mut attrs = parent.clone();
        for attr in node.attributes() {
            self.apply_property(&mut attrs, attr.name(), attr.value());
        }
        if let Some(style) = node.attribute("style") {
            for (name, value) in style_properties(style) {
                self.apply_property(&mut attrs, name, value);
            }
        }
        attrs
    }

    fn apply_property(&self, attrs: &mut Attrs<'a>, name: &str, value: &'a str) {
        let value = value.trim();
        match name {
            "transform" => match parse_transform(value) {
                Some(tr) => attrs.tr = attrs.tr * tr,
                None => debug!(value, "skipping malformed transform"),
            },
            "fill" => {
                if let Some(paint) = parse_raw_paint(value) {
                    attrs.fill = paint;
                } else {
                    debug!(value, "skipping malformed fill");
                }
            }
            "stroke" => {
                if let Some(paint) = parse_raw_paint(value) {
                    attrs.stroke = paint;
                } else {
                    debug!(value, "skipping malformed stroke");
                }
            }
            "color" => {
                if let Ok(color) = value.parse() {
                    attrs.color = color;
                }
            }
            "fill-rule" => match value {
                "nonzero" => attrs.fill_rule = FillRule::NonZero,
                "evenodd" => attrs.fill_rule = FillRule::EvenOdd,
                _ => debug!(value, "skipping malformed fill-rule"),
            },
            "fill-opacity" => {
                if let Some(opacity) = parse_number(value) {
                    attrs.fill_opacity = opacity.clamp(0.0, 1.0);
                }
            }
            "stroke-opacity" => {
                if let Some(opacity) = parse_number(value) {
                    attrs.stroke_opacity = opacity.clamp(0.0, 1.0);
                }
            }
            "stroke-width" => {
                if let Some(width) = self.length(value, self.view_diagonal()) {
                    attrs.stroke_width = width;
                } else {
                    debug!(value, "skipping malformed stroke-width");
                }
            }
            "stroke-linecap" => match value {
                "butt" => attrs.line_cap = LineCap::Butt,
                "round" => attrs.line_cap = LineCap::Round,
                "square" => attrs.line_cap = LineCap::Square,
                _ => debug!(value, "skipping malformed stroke-linecap"),
            },
            "stroke-linejoin" => match value {
                "miter" => {
                    let limit = match attrs.line_join {
                        LineJoin::Miter(limit) => limit,
                        _ => 4.0,
                    };
                    attrs.line_join = LineJoin::Miter(limit);
                }
                "round" => attrs.line_join = LineJoin::Round,
                "bevel" => attrs.line_join = LineJoin::Bevel,
                _ => debug!(value, "skipping malformed stroke-linejoin"),
            },
            "stroke-miterlimit" => {
                if let Some(limit) = parse_number(value) {
                    if let LineJoin::Miter(_) = attrs.line_join {
                        attrs.line_join = LineJoin::Miter(limit.max(1.0));
                    }
                }
            }
            "opacity" => {
                if let Some(opacity) = parse_number(value) {
                    attrs.opacity *= opacity.clamp(0.0, 1.0);
                }
            }
            _ => (),
        }
    }

    fn resolve_paint(
        &self,
        raw: &RawPaint<'a>,
        opacity: Scalar,
        current_color: RGBA,
        bbox: Option<BBox>,
    ) -> Option<Paint> {
        match raw {
            RawPaint::None => None,
            RawPaint::Color(color) => Some(Paint::Color(color.with_opacity(opacity as f32))),
            RawPaint::CurrentColor => {
                Some(Paint::Color(current_color.with_opacity(opacity as f32)))
            }
            RawPaint::Ref(id) => {
                let paint = self.resolve_gradient(id, opacity, bbox);
                if paint.is_none() {
                    debug!(id, "unresolved paint reference");
                }
                paint
            }
        }
    }

    /// Resolve a gradient reference for a shape with the given bounding box
    ///
    /// Attributes missing on the referenced element are inherited through
    /// its `href` chain, matching common authoring-tool output.
    fn resolve_gradient(&self, id: &str, opacity: Scalar, bbox: Option<BBox>) -> Option<Paint> {
        let node = *self.grads.get(id)?;
        let chain = self.href_chain(node);

        let stops = self.gradient_stops(&chain, opacity);
        if stops.is_empty() {
            return None;
        }

        let object_units = chain_attr(&chain, "gradientUnits")
            .map(|units| units != "userSpaceOnUse")
            .unwrap_or(true);
        let spread = match chain_attr(&chain, "spreadMethod") {
            Some("repeat") => GradSpread::Repeat,
            Some("reflect") => GradSpread::Reflect,
            _ => GradSpread::Pad,
        };
        let grad_tr = chain_attr(&chain, "gradientTransform")
            .and_then(parse_transform)
            .unwrap_or_default();

        // gradient space -> document space; evaluation needs the inverse
        let units_tr = if object_units {
            let bbox = bbox?;
            Transform::new(bbox.width(), 0.0, bbox.x(), 0.0, bbox.height(), bbox.y())
        } else {
            Transform::identity()
        };
        let inverse = (units_tr * grad_tr).invert()?;

        let coord = |name: &str, fallback: Scalar, reference: Scalar| -> Scalar {
            let Some(value) = chain_attr(&chain, name) else {
                return fallback;
            };
            let Some((number, percent)) = parse_coord(value) else {
                debug!(name, value, "skipping malformed gradient coordinate");
                return fallback;
            };
            if percent {
                number / 100.0 * if object_units { 1.0 } else { reference }
            } else {
                number
            }
        };

        if node.tag_name().name() == "linearGradient" {
            let x1 = coord("x1", 0.0, self.view_width);
            let y1 = coord("y1", 0.0, self.view_height);
            let x2 = coord("x2", if object_units { 1.0 } else { self.view_width }, self.view_width);
            let y2 = coord("y2", 0.0, self.view_height);
            Some(Paint::LinGrad(GradLinear::new(
                stops,
                spread,
                inverse,
                (x1, y1),
                (x2, y2),
            )))
        } else {
            // the 50% defaults resolve against the matching viewport axis
            let half = |reference: Scalar| if object_units { 0.5 } else { reference / 2.0 };
            let cx = coord("cx", half(self.view_width), self.view_width);
            let cy = coord("cy", half(self.view_height), self.view_height);
            let r = coord("r", half(self.view_diagonal()), self.view_diagonal());
            let fx = coord("fx", cx, self.view_width);
            let fy = coord("fy", cy, self.view_height);
            Some(Paint::RadGrad(GradRadial::new(
                stops,
                spread,
                inverse,
                (cx, cy),
                r,
                (fx, fy),
                0.0,
            )))
        }
    }

    /// Follow `href`/`xlink:href` links, bounded against reference cycles
    fn href_chain(&self, node: Node<'a, 'a>) -> Vec<Node<'a, 'a>> {
        let mut chain = vec![node];
        let mut current = node;
        while chain.len() < 16 {
            let href = current.attributes().find_map(|attr| {
                (attr.name() == "href").then_some(attr.value())
            });
            let Some(id) = href.and_then(|href| href.strip_prefix('#')) else {
                break;
            };
            let Some(next) = self.grads.get(id) else {
                break;
            };
            if chain.iter().any(|seen| seen.id() == next.id()) {
                break;
            }
            chain.push(*next);
            current = *next;
        }
        chain
    }

    /// Stops come from the first element in the chain that has any
    fn gradient_stops(&self, chain: &[Node<'a, 'a>], opacity: Scalar) -> Vec<GradStop> {
        for node in chain {
            let mut stops = Vec::new();
            for child in node.children() {
                if !child.is_element() || child.tag_name().name() != "stop" {
                    continue;
                }
                let mut offset = 0.0;
                let mut color = RGBA::new(0, 0, 0, 255);
                let mut stop_opacity = 1.0;
                let mut property = |name: &str, value: &str| match name {
                    "offset" => {
                        if let Some((number, percent)) = parse_coord(value.trim()) {
                            offset = if percent { number / 100.0 } else { number };
                        }
                    }
                    "stop-color" => {
                        if let Ok(parsed) = value.trim().parse() {
                            color = parsed;
                        }
                    }
                    "stop-opacity" => {
                        if let Some(parsed) = parse_number(value.trim()) {
                            stop_opacity = parsed.clamp(0.0, 1.0);
                        }
                    }
                    _ => (),
                };
                for attr in child.attributes() {
                    property(attr.name(), attr.value());
                }
                if let Some(style) = child.attribute("style") {
                    for (name, value) in style_properties(style) {
                        property(name, value);
                    }
                }
                let color = color.with_opacity((stop_opacity * opacity) as f32);
                stops.push(GradStop::new(offset.clamp(0.0, 1.0), color.into()));
            }
            if !stops.is_empty() {
                return stops;
            }
        }
        Vec::new()
    }

    fn view_diagonal(&self) -> Scalar {
        // percentage reference for lengths that are neither horizontal
        // nor vertical, per the SVG definition
        (self.view_width * self.view_width + self.view_height * self.view_height).sqrt()
            / Scalar::sqrt(2.0)
    }

    fn attr_length(&self, node: Node<'a, 'a>, name: &str, reference: Scalar) -> Option<Scalar> {
        let value = node.attribute(name)?;
        let length = self.length(value, reference);
        if length.is_none() {
            debug!(name, value, "skipping malformed length");
        }
        length
    }

    /// Resolve a length with an optional unit suffix to px
    fn length(&self, value: &str, reference: Scalar) -> Option<Scalar> {
        let value = value.trim();
        let (number, percent) = parse_coord(value)?;
        if percent {
            return Some(number / 100.0 * reference);
        }
        let split = value
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
            .unwrap_or(value.len());
        let factor = unit_factor(value[split..].trim(), self.dpi)?;
        Some(number * factor)
    }
}

/// Number with an optional `%` suffix
fn parse_coord(value: &str) -> Option<(Scalar, bool)> {
    let value = value.trim();
    if let Some(number) = value.strip_suffix('%') {
        return Some((parse_number(number.trim())?, true));
    }
    // strip a unit suffix if any, the caller decides what it means
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(value.len());
    if split == 0 {
        return None;
    }
    Some((parse_number(&value[..split])?, false))
}

fn parse_number(value: &str) -> Option<Scalar> {
    lexical_core::parse(value.trim().as_bytes()).ok()
}

/// Split an inline `style` attribute into properties
fn style_properties(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|item| {
        let (name, value) = item.split_once(':')?;
        Some((name.trim(), value.trim()))
    })
}

fn parse_raw_paint(value: &str) -> Option<RawPaint<'_>> {
    match value {
        "none" => Some(RawPaint::None),
        "currentColor" => Some(RawPaint::CurrentColor),
        _ => {
            if let Some(reference) = value.strip_prefix("url(#") {
                let id = reference.strip_suffix(')')?.trim();
                return Some(RawPaint::Ref(id));
            }
            value.parse().ok().map(RawPaint::Color)
        }
    }
}

/// Attribute inherited through a gradient `href` chain
fn chain_attr<'a>(chain: &[Node<'a, 'a>], name: &str) -> Option<&'a str> {
    chain.iter().find_map(|node| node.attribute(name))
}

fn parse_view_box(value: &str) -> Option<BBox> {
    let mut numbers = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|chunk| !chunk.is_empty())
        .map(parse_number);
    let x = numbers.next()??;
    let y = numbers.next()??;
    let width = numbers.next()??;
    let height = numbers.next()??;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(BBox::new((x, y), (x + width, y + height)))
}

/// Parse the `points` attribute of polyline/polygon, trailing odd
/// number is dropped
fn parse_points(value: &str) -> Vec<Point> {
    let numbers: Vec<Scalar> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|chunk| !chunk.is_empty())
        .filter_map(parse_number)
        .collect();
    numbers
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

/// Parse the `d` attribute, keeping whatever was built before the
/// first syntax error
fn parse_path_data(value: &str) -> Path {
    let mut builder = PathBuilder::new();
    if let Err(error) = builder.append_svg_path(value) {
        debug!(%error, "partial path data");
    }
    builder.build()
}

/// Parse a `transform` attribute: a whitespace separated list of
/// `matrix`, `translate`, `scale`, `rotate`, `skewX`, `skewY`
/// operations composed left-to-right
fn parse_transform(value: &str) -> Option<Transform> {
    let mut tr = Transform::identity();
    let mut rest = value.trim();
    while !rest.is_empty() {
        let open = rest.find('(')?;
        let close = rest.find(')')?;
        if close < open {
            return None;
        }
        let op = rest[..open].trim();
        let args: Vec<Scalar> = rest[open + 1..close]
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|chunk| !chunk.is_empty())
            .map(parse_number)
            .collect::<Option<_>>()?;
        let next = match (op, args.as_slice()) {
            ("matrix", [a, b, c, d, e, f]) => Transform::new(*a, *c, *e, *b, *d, *f),
            ("translate", [tx]) => Transform::new_translate(*tx, 0.0),
            ("translate", [tx, ty]) => Transform::new_translate(*tx, *ty),
            ("scale", [s]) => Transform::new_scale(*s, *s),
            ("scale", [sx, sy]) => Transform::new_scale(*sx, *sy),
            ("rotate", [a]) => Transform::identity().rotate(a * PI / 180.0),
            ("rotate", [a, cx, cy]) => {
                Transform::identity().rotate_around(a * PI / 180.0, (*cx, *cy))
            }
            ("skewX", [a]) => Transform::identity().skew(a * PI / 180.0, 0.0),
            ("skewY", [a]) => Transform::identity().skew(0.0, a * PI / 180.0),
            _ => return None,
        };
        tr = tr * next;
        rest = rest[close + 1..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }
    Some(tr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_parse_transform() {
        let tr = parse_transform("translate(10, 20) scale(2)").unwrap();
        let p = tr.apply(Point::new(1.0, 1.0));
        assert_approx_eq!(p.x(), 12.0);
        assert_approx_eq!(p.y(), 22.0);

        let tr = parse_transform("rotate(90 1 1)").unwrap();
        let p = tr.apply(Point::new(2.0, 1.0));
        assert_approx_eq!(p.x(), 1.0, 1e-9);
        assert_approx_eq!(p.y(), 2.0, 1e-9);

        let tr = parse_transform("matrix(1 0 0 1 5 6)").unwrap();
        let p = tr.apply(Point::new(0.0, 0.0));
        assert_approx_eq!(p.x(), 5.0);
        assert_approx_eq!(p.y(), 6.0);

        assert!(parse_transform("wobble(1 2)").is_none());
        assert!(parse_transform("scale(").is_none());
    }

    #[test]
    fn test_parse_minimal() -> Result<(), ParseError> {
        let doc = Document::parse_str(r#"<svg width="16" height="12"></svg>"#)?;
        assert_approx_eq!(doc.width, 16.0);
        assert_approx_eq!(doc.height, 12.0);
        assert!(doc.shapes.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_failure() {
        assert!(matches!(Document::parse_str(""), Err(ParseError::Empty)));
        assert!(matches!(
            Document::parse_str("  \n "),
            Err(ParseError::Empty)
        ));
        assert!(matches!(
            Document::parse_str("<html><body/></html>"),
            Err(ParseError::MissingRoot)
        ));
        assert!(matches!(
            Document::parse_str("<svg><broken"),
            Err(ParseError::Xml(_))
        ));
    }

    #[test]
    fn test_parse_shapes() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r##"<svg width="100" height="100">
                 <rect x="10" y="10" width="30" height="20" fill="#ff0000"/>
                 <circle cx="50" cy="50" r="10" fill="none" stroke="blue" stroke-width="2"/>
                 <line x1="0" y1="0" x2="100" y2="100" stroke="black"/>
                 <polygon points="10,90 50,90 30,60"/>
               </svg>"##,
        )?;
        assert_eq!(doc.shapes.len(), 4);

        let rect = &doc.shapes[0];
        let bbox = rect.path.bbox().unwrap();
        assert_approx_eq!(bbox.x(), 10.0);
        assert_approx_eq!(bbox.width(), 30.0);
        assert!(matches!(rect.fill, Some(Paint::Color(c)) if c == RGBA::new(255, 0, 0, 255)));
        assert!(rect.stroke.is_none());

        let circle = &doc.shapes[1];
        assert!(circle.fill.is_none());
        assert!(matches!(circle.stroke, Some(Paint::Color(c)) if c == RGBA::new(0, 0, 255, 255)));
        assert_approx_eq!(circle.stroke_style.width, 2.0);

        // polygon gets the default black fill and a closed contour
        let polygon = &doc.shapes[3];
        assert!(polygon.path.subpaths()[0].closed());
        assert!(matches!(polygon.fill, Some(Paint::Color(c)) if c == RGBA::new(0, 0, 0, 255)));
        Ok(())
    }

    #[test]
    fn test_malformed_attribute_does_not_abort() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r##"<svg width="100" height="100">
                 <rect x="10" y="10" width="30" height="20" fill="not-a-color"/>
                 <rect x="nonsense" y="10" width="30" height="20"/>
                 <rect x="50" y="50" width="10" height="10" fill="#00ff00"/>
               </svg>"##,
        )?;
        // first rect keeps the default fill, second falls back to x=0,
        // third is untouched
        assert_eq!(doc.shapes.len(), 3);
        assert!(matches!(doc.shapes[0].fill, Some(Paint::Color(c)) if c == RGBA::new(0, 0, 0, 255)));
        let second = doc.shapes[1].path.bbox().unwrap();
        assert_approx_eq!(second.x(), 0.0);
        assert!(matches!(doc.shapes[2].fill, Some(Paint::Color(c)) if c == RGBA::new(0, 255, 0, 255)));
        Ok(())
    }

    #[test]
    fn test_style_precedence() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r##"<svg width="10" height="10">
                 <rect width="10" height="10" fill="#ff0000" style="fill: #0000ff"/>
               </svg>"##,
        )?;
        assert!(matches!(doc.shapes[0].fill, Some(Paint::Color(c)) if c == RGBA::new(0, 0, 255, 255)));
        Ok(())
    }

    #[test]
    fn test_group_transform_and_opacity() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r#"<svg width="100" height="100">
                 <g transform="translate(10 0)" opacity="0.5">
                   <rect x="0" y="0" width="10" height="10" transform="scale(2)" opacity="0.5"/>
                 </g>
               </svg>"#,
        )?;
        let shape = &doc.shapes[0];
        let bbox = shape.path.bbox().unwrap();
        // group translate composes before element scale
        assert_approx_eq!(bbox.x(), 10.0);
        assert_approx_eq!(bbox.width(), 20.0);
        assert_approx_eq!(shape.opacity, 0.25);
        Ok(())
    }

    #[test]
    fn test_gradient_forward_reference() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r##"<svg width="100" height="100">
                 <rect width="100" height="100" fill="url(#grad)"/>
                 <defs>
                   <linearGradient id="grad">
                     <stop offset="0" stop-color="#000000"/>
                     <stop offset="1" stop-color="#ffffff"/>
                   </linearGradient>
                 </defs>
               </svg>"##,
        )?;
        let Some(Paint::LinGrad(ref grad)) = doc.shapes[0].fill else {
            panic!("expected linear gradient fill");
        };
        // default axis spans the bounding box left to right
        let left: RGBA = grad.at(Point::new(0.0, 50.0)).into();
        let right: RGBA = grad.at(Point::new(100.0, 50.0)).into();
        let mid: RGBA = grad.at(Point::new(50.0, 50.0)).into();
        assert_eq!(left, RGBA::new(0, 0, 0, 255));
        assert_eq!(right, RGBA::new(255, 255, 255, 255));
        assert_eq!(mid, RGBA::new(128, 128, 128, 255));
        Ok(())
    }

    #[test]
    fn test_gradient_unresolved_reference() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r#"<svg width="10" height="10">
                 <rect width="10" height="10" fill="url(#missing)" stroke="red"/>
               </svg>"#,
        )?;
        // fill degrades to absent, the shape still renders its stroke
        assert_eq!(doc.shapes.len(), 1);
        assert!(doc.shapes[0].fill.is_none());
        assert!(doc.shapes[0].stroke.is_some());
        Ok(())
    }

    #[test]
    fn test_current_color() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r##"<svg width="10" height="10">
                 <g color="#00ff00">
                   <rect width="10" height="10" fill="currentColor"/>
                 </g>
                 <rect width="10" height="10" stroke="currentColor"/>
               </svg>"##,
        )?;
        assert!(
            matches!(doc.shapes[0].fill, Some(Paint::Color(c)) if c == RGBA::new(0, 255, 0, 255))
        );
        // `color` is not set on the second shape and defaults to black
        assert!(
            matches!(doc.shapes[1].stroke, Some(Paint::Color(c)) if c == RGBA::new(0, 0, 0, 255))
        );
        Ok(())
    }

    #[test]
    fn test_gradient_href_inheritance() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r##"<svg width="100" height="100">
                 <defs>
                   <linearGradient id="base">
                     <stop offset="0" stop-color="#000000"/>
                     <stop offset="1" stop-color="#ffffff"/>
                   </linearGradient>
                   <linearGradient id="derived" href="#base"/>
                 </defs>
                 <rect width="100" height="100" fill="url(#derived)"/>
               </svg>"##,
        )?;
        // `derived` has no stops of its own, they come through `href`
        let Some(Paint::LinGrad(ref grad)) = doc.shapes[0].fill else {
            panic!("expected linear gradient fill");
        };
        let mid: RGBA = grad.at(Point::new(50.0, 50.0)).into();
        assert_eq!(mid, RGBA::new(128, 128, 128, 255));
        Ok(())
    }

    #[test]
    fn test_radial_defaults_user_space() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r##"<svg width="100" height="50">
                 <defs>
                   <radialGradient id="g" gradientUnits="userSpaceOnUse">
                     <stop offset="0" stop-color="#000000"/>
                     <stop offset="1" stop-color="#ffffff"/>
                   </radialGradient>
                 </defs>
                 <rect width="100" height="50" fill="url(#g)"/>
               </svg>"##,
        )?;
        let Some(Paint::RadGrad(ref grad)) = doc.shapes[0].fill else {
            panic!("expected radial gradient fill");
        };
        // center defaults to the middle of the viewport, (50, 25)
        let center: RGBA = grad.at(Point::new(50.0, 25.0)).into();
        assert_eq!(center, RGBA::new(0, 0, 0, 255));
        // points equidistant from the center along y evaluate the same
        let above: RGBA = grad.at(Point::new(50.0, 10.0)).into();
        let below: RGBA = grad.at(Point::new(50.0, 40.0)).into();
        assert_eq!(above, below);
        assert!(above.r > 0);
        // pad spread saturates far outside the radius
        let far: RGBA = grad.at(Point::new(150.0, 25.0)).into();
        assert_eq!(far, RGBA::new(255, 255, 255, 255));
        Ok(())
    }

    #[test]
    fn test_units_resolution() -> Result<(), ParseError> {
        let doc = Document::parse_str(r#"<svg width="1in" height="2in"></svg>"#)?;
        assert_approx_eq!(doc.width, 96.0);
        assert_approx_eq!(doc.height, 192.0);

        let doc = Document::parse_str(r#"<svg width="72pt" height="25.4mm"></svg>"#)?;
        assert_approx_eq!(doc.width, 96.0);
        assert_approx_eq!(doc.height, 96.0);

        // output expressed in a different unit
        let doc =
            Document::parse_str_with(r#"<svg width="96" height="96"></svg>"#, "in", 96.0)?;
        assert_approx_eq!(doc.width, 1.0);
        assert_approx_eq!(doc.height, 1.0);
        Ok(())
    }

    #[test]
    fn test_viewbox() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r#"<svg width="200" height="200" viewBox="0 0 100 100">
                 <rect x="0" y="0" width="100" height="100"/>
               </svg>"#,
        )?;
        let bbox = doc.shapes[0].path.bbox().unwrap();
        assert_approx_eq!(bbox.width(), 200.0);
        assert_approx_eq!(bbox.height(), 200.0);

        // size falls back to the viewBox dimensions
        let doc = Document::parse_str(r#"<svg viewBox="0 0 40 30"></svg>"#)?;
        assert_approx_eq!(doc.width, 40.0);
        assert_approx_eq!(doc.height, 30.0);
        Ok(())
    }

    #[test]
    fn test_size_from_content() -> Result<(), ParseError> {
        let doc = Document::parse_str(
            r#"<svg><rect x="0" y="0" width="25" height="35"/></svg>"#,
        )?;
        assert_approx_eq!(doc.width, 25.0);
        assert_approx_eq!(doc.height, 35.0);
        Ok(())
    }

    #[test]
    fn test_load() -> Result<(), ParseError> {
        let text = r#"<svg width="3" height="4"></svg>"#;
        let doc = Document::load(std::io::Cursor::new(text.as_bytes()))?;
        assert_approx_eq!(doc.width, 3.0);
        assert!(matches!(
            Document::load(std::io::Cursor::new(b"")),
            Err(ParseError::Empty)
        ));
        Ok(())
    }
}
