//! Scanline rasterizer
//!
//! Renders a [`Document`] into an RGBA pixel buffer. Shapes are flattened
//! into polylines in output space, filled with an active edge table that
//! takes several sample lines per pixel row, and composited back to front
//! with premultiplied alpha-over. Strokes are expanded into closed outline
//! polygons and filled with the non-zero rule.
use crate::{
    color::{ColorF, RGBA},
    geometry::{PI, Point, Scalar, Transform},
    grad::Paint,
    path::{FillRule, LineCap, LineJoin, StrokeStyle},
    scene::{Document, Shape},
};
use std::cmp::Ordering;
use tracing::debug_span;

/// Sample lines taken per pixel row
const SUBSAMPLES: usize = 5;
/// Maximum deviation of the flattened polyline from the curve, in output
/// pixels
const FLATNESS: Scalar = 0.25;
/// Maximum angle covered by one segment of a round join or cap
const ROUND_STEP: Scalar = PI / 16.0;
/// Coverage below this composites to nothing
const COVERAGE_MIN: f32 = 1e-4;
/// Output buffers larger than this many pixels are refused
const PIXEL_COUNT_MAX: usize = 1 << 26;

/// Rasterization failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RasterError {
    /// Scale factor is not strictly positive and finite, or is outside
    /// of the accepted configuration range
    InvalidScale(Scalar),
    /// Output dimensions exceed the allocation ceiling
    TooLarge { width: usize, height: usize },
}

impl std::fmt::Display for RasterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RasterError::InvalidScale(scale) => {
                write!(f, "invalid scale factor: {scale}")
            }
            RasterError::TooLarge { width, height } => {
                write!(f, "output size {width}x{height} exceeds the pixel ceiling")
            }
        }
    }
}

impl std::error::Error for RasterError {}

/// Validated scale factor
///
/// External configuration carries the scale in tenths, an integer in
/// `[1, 100]` covering factors from 0.1 to 10.0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Scale(Scalar);

impl Scale {
    /// Identity scale
    pub const ONE: Scale = Scale(1.0);
    /// Smallest accepted tenths value
    pub const TENTHS_MIN: i32 = 1;
    /// Largest accepted tenths value
    pub const TENTHS_MAX: i32 = 100;

    /// Construct from a configuration value in tenths of the factor
    pub fn from_tenths(tenths: i32) -> Result<Self, RasterError> {
        if !(Self::TENTHS_MIN..=Self::TENTHS_MAX).contains(&tenths) {
            return Err(RasterError::InvalidScale(tenths as Scalar / 10.0));
        }
        Ok(Self(tenths as Scalar / 10.0))
    }

    /// Construct from a raw factor, which must be finite and positive
    pub fn new(factor: Scalar) -> Result<Self, RasterError> {
        if factor.is_finite() && factor > 0.0 {
            Ok(Self(factor))
        } else {
            Err(RasterError::InvalidScale(factor))
        }
    }

    pub fn factor(self) -> Scalar {
        self.0
    }
}

/// RGBA8 pixel buffer, row-major, top row first, premultiplication
/// undone on store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: usize,
    height: usize,
    data: Vec<RGBA>,
}

impl Pixmap {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![RGBA::transparent(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixels in row-major order
    pub fn data(&self) -> &[RGBA] {
        &self.data
    }

    /// Raw view of the buffer, four bytes per pixel in RGBA order
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<RGBA> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }
}

impl Document {
    /// Rasterize the document at the given scale
    ///
    /// The output is `ceil(width * scale)` by `ceil(height * scale)`
    /// pixels, initialized fully transparent, shapes composited in
    /// document order.
    pub fn render(&self, scale: Scale) -> Result<Pixmap, RasterError> {
        let factor = scale.factor();
        let width = (self.width * factor).ceil().max(0.0) as usize;
        let height = (self.height * factor).ceil().max(0.0) as usize;
        let _span = debug_span!("render", width, height, factor).entered();
        match width.checked_mul(height) {
            Some(pixels) if pixels <= PIXEL_COUNT_MAX => (),
            _ => return Err(RasterError::TooLarge { width, height }),
        }
        let mut pixmap = Pixmap::new(width, height);
        if width == 0 || height == 0 {
            return Ok(pixmap);
        }
        let tr = Transform::new_scale(factor, factor);
        for shape in self.shapes.iter() {
            render_shape(&mut pixmap, shape, tr, factor);
        }
        Ok(pixmap)
    }
}

fn render_shape(pixmap: &mut Pixmap, shape: &Shape, tr: Transform, factor: Scalar) {
    if let Some(paint) = &shape.fill {
        // open contours are implicitly closed for filling
        let rings: Vec<Vec<Point>> = shape
            .path
            .subpaths()
            .iter()
            .map(|subpath| subpath.flatten(tr, FLATNESS))
            .collect();
        composite_fill(pixmap, &rings, shape.fill_rule, paint, shape.opacity, factor);
    }
    if let Some(paint) = &shape.stroke {
        let half = shape.stroke_style.width * factor / 2.0;
        if half <= 0.0 {
            return;
        }
        let mut rings = Vec::new();
        for subpath in shape.path.subpaths() {
            let line = subpath.flatten(tr, FLATNESS);
            stroke_outline(&line, subpath.closed(), half, &shape.stroke_style, &mut rings);
        }
        // outline orientation makes the non-zero rule carve the hole
        composite_fill(pixmap, &rings, FillRule::NonZero, paint, shape.opacity, factor);
    }
}

/// Monotonic in `y`, winding `dir` tells which way the original segment
/// crossed the sample line
struct Edge {
    y0: Scalar,
    y1: Scalar,
    x: Scalar,
    dxdy: Scalar,
    dir: i32,
}

fn build_edges(rings: &[Vec<Point>]) -> Vec<Edge> {
    let mut edges = Vec::new();
    for ring in rings {
        if ring.len() < 2 {
            continue;
        }
        for index in 0..ring.len() {
            let p0 = ring[index];
            let p1 = ring[(index + 1) % ring.len()];
            if (p0.y() - p1.y()).abs() < 1e-12 {
                continue;
            }
            let (top, bottom, dir) = if p0.y() < p1.y() {
                (p0, p1, 1)
            } else {
                (p1, p0, -1)
            };
            edges.push(Edge {
                y0: top.y(),
                y1: bottom.y(),
                x: top.x(),
                dxdy: (bottom.x() - top.x()) / (bottom.y() - top.y()),
                dir,
            });
        }
    }
    edges.sort_by(|e0, e1| e0.y0.partial_cmp(&e1.y0).unwrap_or(Ordering::Equal));
    edges
}

/// Fill closed polygons into the pixmap with the shape's paint
///
/// For every pixel row [`SUBSAMPLES`] sample lines are intersected with
/// the active edges, spans accumulate fractional coverage at their ends,
/// and the row is composited in one pass.
fn composite_fill(
    pixmap: &mut Pixmap,
    rings: &[Vec<Point>],
    fill_rule: FillRule,
    paint: &Paint,
    opacity: Scalar,
    factor: Scalar,
) {
    let edges = build_edges(rings);
    if edges.is_empty() {
        return;
    }
    let width = pixmap.width;
    let opacity = opacity.clamp(0.0, 1.0) as f32;
    let weight = 1.0 / SUBSAMPLES as f32;
    let solid = paint.to_solid().map(ColorF::from);

    let mut cover = vec![0.0f32; width];
    let mut active: Vec<usize> = Vec::new();
    let mut hits: Vec<(Scalar, i32)> = Vec::new();
    let mut next_edge = 0;

    for y in 0..pixmap.height {
        // rows fully above the next edge have nothing to do
        if active.is_empty() {
            match edges.get(next_edge) {
                Some(edge) if edge.y0 < (y + 1) as Scalar => (),
                _ => continue,
            }
        }
        cover.fill(0.0);
        let mut covered = false;
        for sample in 0..SUBSAMPLES {
            let sy = y as Scalar + (sample as Scalar + 0.5) / SUBSAMPLES as Scalar;
            while next_edge < edges.len() && edges[next_edge].y0 <= sy {
                active.push(next_edge);
                next_edge += 1;
            }
            active.retain(|&index| edges[index].y1 > sy);
            if active.is_empty() {
                continue;
            }
            hits.clear();
            for &index in active.iter() {
                let edge = &edges[index];
                if edge.y0 <= sy {
                    hits.push((edge.x + (sy - edge.y0) * edge.dxdy, edge.dir));
                }
            }
            hits.sort_by(|h0, h1| h0.0.partial_cmp(&h1.0).unwrap_or(Ordering::Equal));
            match fill_rule {
                FillRule::NonZero => {
                    let mut winding = 0;
                    let mut start = 0.0;
                    for &(x, dir) in hits.iter() {
                        let previous = winding;
                        winding += dir;
                        if previous == 0 && winding != 0 {
                            start = x;
                        } else if previous != 0 && winding == 0 {
                            covered |= accumulate_span(&mut cover, start, x, weight);
                        }
                    }
                }
                FillRule::EvenOdd => {
                    for pair in hits.chunks_exact(2) {
                        covered |= accumulate_span(&mut cover, pair[0].0, pair[1].0, weight);
                    }
                }
            }
        }
        if !covered {
            continue;
        }
        let row = y * width;
        for (x, coverage) in cover.iter().enumerate() {
            let coverage = coverage.min(1.0);
            if coverage < COVERAGE_MIN {
                continue;
            }
            let color = match solid {
                Some(color) => color,
                // gradients sample at the pixel center mapped back to
                // document space
                None => paint.at(Point::new(
                    (x as Scalar + 0.5) / factor,
                    (y as Scalar + 0.5) / factor,
                )),
            };
            let src = color.mul_alpha(coverage * opacity);
            let dst: ColorF = pixmap.data[row + x].into();
            pixmap.data[row + x] = dst.blend_over(src).into();
        }
    }
}

/// Add one span of a sample line to the row coverage, clipped to the
/// buffer, with fractional coverage at both ends
///
/// Returns true when anything was accumulated.
fn accumulate_span(cover: &mut [f32], x0: Scalar, x1: Scalar, weight: f32) -> bool {
    let x0 = x0.max(0.0);
    let x1 = x1.min(cover.len() as Scalar);
    if x1 <= x0 {
        return false;
    }
    let i0 = x0.floor() as usize;
    let i1 = (x1.ceil() as usize).min(cover.len());
    if i0 + 1 >= i1 {
        cover[i0] += (x1 - x0) as f32 * weight;
    } else {
        cover[i0] += ((i0 + 1) as Scalar - x0) as f32 * weight;
        for value in cover[i0 + 1..i1 - 1].iter_mut() {
            *value += weight;
        }
        cover[i1 - 1] += (x1 - (i1 - 1) as Scalar) as f32 * weight;
    }
    true
}

/// Expand a flattened contour into closed outline polygons
///
/// Open contours become a single ring: the left offset forward, the end
/// cap, the left offset of the reversed contour, the start cap. Closed
/// contours become two rings with opposite orientation so the non-zero
/// fill leaves the interior empty.
fn stroke_outline(
    line: &[Point],
    closed: bool,
    half: Scalar,
    style: &StrokeStyle,
    out: &mut Vec<Vec<Point>>,
) {
    let mut points: Vec<Point> = Vec::with_capacity(line.len());
    for &point in line {
        if points.last().is_none_or(|last| last.dist(point) > 1e-9) {
            points.push(point);
        }
    }
    let mut closed = closed;
    if closed && points.len() > 2 {
        if points[0].dist(points[points.len() - 1]) <= 1e-9 {
            points.pop();
        }
    } else if closed {
        closed = false;
    }
    if points.len() < 2 {
        return;
    }

    if closed {
        let mut ring = Vec::with_capacity(points.len() * 2);
        offset_ring(&mut ring, &points, half, style.line_join);
        out.push(ring);
        points.reverse();
        let mut ring = Vec::with_capacity(points.len() * 2);
        offset_ring(&mut ring, &points, half, style.line_join);
        out.push(ring);
    } else {
        let mut ring = Vec::with_capacity(points.len() * 4);
        offset_side(&mut ring, &points, half, style.line_join);
        if let Some(dir) = (points[points.len() - 1] - points[points.len() - 2]).normalize() {
            emit_cap(&mut ring, points[points.len() - 1], dir, half, style.line_cap);
        }
        points.reverse();
        offset_side(&mut ring, &points, half, style.line_join);
        if let Some(dir) = (points[points.len() - 1] - points[points.len() - 2]).normalize() {
            emit_cap(&mut ring, points[points.len() - 1], dir, half, style.line_cap);
        }
        out.push(ring);
    }
}

/// Left offset of a closed contour, a join emitted at every vertex
fn offset_ring(out: &mut Vec<Point>, points: &[Point], half: Scalar, join: LineJoin) {
    let count = points.len();
    for index in 0..count {
        let previous = points[(index + count - 1) % count];
        let current = points[index];
        let next = points[(index + 1) % count];
        let (Some(d0), Some(d1)) = (
            (current - previous).normalize(),
            (next - current).normalize(),
        ) else {
            continue;
        };
        emit_join(out, current, d0, d1, half, join);
    }
}

/// Left offset of an open contour, endpoints offset straight across
fn offset_side(out: &mut Vec<Point>, points: &[Point], half: Scalar, join: LineJoin) {
    if let Some(dir) = (points[1] - points[0]).normalize() {
        out.push(points[0] + half * dir.normal());
    }
    for window in points.windows(3) {
        let (Some(d0), Some(d1)) = (
            (window[1] - window[0]).normalize(),
            (window[2] - window[1]).normalize(),
        ) else {
            continue;
        };
        emit_join(out, window[1], d0, d1, half, join);
    }
    let last = points.len() - 1;
    if let Some(dir) = (points[last] - points[last - 1]).normalize() {
        out.push(points[last] + half * dir.normal());
    }
}

/// Join geometry on the left side of a vertex between unit directions
/// `d0` and `d1`
///
/// The left side is outer when the turn is clockwise in the y-down
/// coordinate system, inner corners just take both offset points and
/// the overlap is absorbed by the winding.
fn emit_join(out: &mut Vec<Point>, p: Point, d0: Point, d1: Point, half: Scalar, join: LineJoin) {
    let n0 = d0.normal();
    let n1 = d1.normal();
    let p0 = p + half * n0;
    let p1 = p + half * n1;
    let turn = d0.cross(d1);
    if turn.abs() < 1e-12 && d0.dot(d1) > 0.0 {
        out.push(p0);
        return;
    }
    if turn <= 0.0 {
        out.push(p0);
        out.push(p1);
        return;
    }
    match join {
        LineJoin::Bevel => {
            out.push(p0);
            out.push(p1);
        }
        LineJoin::Miter(limit) => {
            // ratio of the miter length to the stroke half width
            let cos_half = ((1.0 + d0.dot(d1)) / 2.0).max(0.0).sqrt();
            let bisector = (n0 + n1).normalize();
            match bisector {
                Some(bisector) if cos_half * limit >= 1.0 => {
                    out.push(p + half / cos_half * bisector);
                }
                _ => {
                    out.push(p0);
                    out.push(p1);
                }
            }
        }
        LineJoin::Round => {
            out.push(p0);
            arc_between(out, p, n0, n1, half);
            out.push(p1);
        }
    }
}

/// Intermediate points of the arc from `p + half * n0` to `p + half * n1`
fn arc_between(out: &mut Vec<Point>, center: Point, n0: Point, n1: Point, half: Scalar) {
    let Some(angle) = n0.angle_between(n1) else {
        return;
    };
    let steps = (angle.abs() / ROUND_STEP).ceil() as usize;
    let start = n0.y().atan2(n0.x());
    for step in 1..steps {
        let a = start + angle * step as Scalar / steps as Scalar;
        out.push(center + half * Point::new(a.cos(), a.sin()));
    }
}

/// Cap at an endpoint `p` with outgoing direction `dir`
///
/// The left side edge ends at `p + half * n`, the returning side starts
/// at `p - half * n`, the cap bridges the two.
fn emit_cap(out: &mut Vec<Point>, p: Point, dir: Point, half: Scalar, cap: LineCap) {
    let n = dir.normal();
    match cap {
        LineCap::Butt => (),
        LineCap::Square => {
            out.push(p + half * n + half * dir);
            out.push(p - half * n + half * dir);
        }
        LineCap::Round => {
            // half turn from the left offset through the tip
            let start = n.y().atan2(n.x());
            let steps = (PI / ROUND_STEP).ceil() as usize;
            for step in 0..=steps {
                let a = start + PI * step as Scalar / steps as Scalar;
                out.push(p + half * Point::new(a.cos(), a.sin()));
            }
        }
    }
}
