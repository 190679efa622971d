//! Paths built of cubic bezier contours, the `d` attribute parser and
//! the canvas-style builder producing them.
use crate::{
    curve::{Cubic, Quad},
    ellipse::EllipArc,
    geometry::{BBox, EPSILON, Point, Scalar, Transform},
};
use std::{fmt, str::FromStr};

/// Rule determining what is "inside" of a possibly self-intersecting path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum LineJoin {
    Miter(Scalar),
    Bevel,
    Round,
}

impl Default for LineJoin {
    fn default() -> Self {
        Self::Miter(4.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct StrokeStyle {
    pub width: Scalar,
    pub line_join: LineJoin,
    pub line_cap: LineCap,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            line_join: LineJoin::default(),
            line_cap: LineCap::default(),
        }
    }
}

/// One contiguous contour of cubic segments
///
/// Non-empty, consecutive segments share an endpoint. A closed subpath
/// has an implicit line back to its start.
#[derive(Clone, PartialEq)]
pub struct SubPath {
    cubics: Vec<Cubic>,
    closed: bool,
}

impl fmt::Debug for SubPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cubic in self.cubics.iter() {
            writeln!(f, "{cubic:?}")?;
        }
        if self.closed {
            writeln!(f, "Close")
        } else {
            writeln!(f, "End")
        }
    }
}

impl SubPath {
    pub fn new(cubics: Vec<Cubic>, closed: bool) -> Option<Self> {
        if cubics.is_empty() {
            None
        } else {
            Some(Self { cubics, closed })
        }
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn cubics(&self) -> &[Cubic] {
        &self.cubics
    }

    pub fn start(&self) -> Point {
        self.cubics
            .first()
            .expect("SubPath is never empty")
            .start()
    }

    pub fn end(&self) -> Point {
        self.cubics.last().expect("SubPath is never empty").end()
    }

    /// Apply transformation to the sub-path in place
    pub fn transform(&mut self, tr: Transform) {
        for cubic in self.cubics.iter_mut() {
            *cubic = cubic.transform(tr);
        }
    }

    pub fn bbox(&self, init: Option<BBox>) -> BBox {
        self.cubics
            .iter()
            .fold(init, |bbox, cubic| Some(cubic.bbox(bbox)))
            .expect("SubPath is never empty")
    }

    /// Polyline approximation of the contour, starting at `start()`
    ///
    /// The closing segment of a closed subpath is not emitted, consumers
    /// close the polyline according to their own fill/stroke semantics.
    pub fn flatten(&self, tr: Transform, tolerance: Scalar) -> Vec<Point> {
        let mut line = Vec::with_capacity(self.cubics.len() * 4);
        line.push(tr.apply(self.start()));
        for cubic in self.cubics.iter() {
            cubic.transform(tr).flatten_into(tolerance, &mut line);
        }
        line
    }
}

/// Collection of subpaths treated as a single unit
#[derive(Clone, PartialEq, Default)]
pub struct Path {
    subpaths: Vec<SubPath>,
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subpaths.is_empty() {
            write!(f, "Empty")?;
        } else {
            for subpath in self.subpaths.iter() {
                subpath.fmt(f)?
            }
        }
        Ok(())
    }
}

impl Path {
    pub fn new(subpaths: Vec<SubPath>) -> Self {
        Self { subpaths }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn subpaths(&self) -> &[SubPath] {
        &self.subpaths
    }

    /// Convenience method to create `PathBuilder`
    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    /// Apply transformation to the path in place
    pub fn transform(&mut self, tr: Transform) {
        for subpath in self.subpaths.iter_mut() {
            subpath.transform(tr);
        }
    }

    /// Bounding box over all control points extrema
    pub fn bbox(&self) -> Option<BBox> {
        self.subpaths
            .iter()
            .fold(None, |bbox, subpath| Some(subpath.bbox(bbox)))
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(text: &str) -> Result<Path, Self::Err> {
        let mut builder = PathBuilder::new();
        builder.append_svg_path(text)?;
        Ok(builder.build())
    }
}

/// Path builder similar to Canvas/Cairo interface
///
/// Everything is stored as cubics: lines become cubics with control
/// points placed at the third points of the chord, which have zero
/// flatness and cost nothing to rasterize.
#[derive(Clone, Default)]
pub struct PathBuilder {
    position: Point,
    subpath: Vec<Cubic>,
    subpaths: Vec<SubPath>,
    /// control point to reflect for a following `S` command
    cubic_ctrl: Option<Point>,
    /// control point to reflect for a following `T` command
    quad_ctrl: Option<Point>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build path
    pub fn build(&mut self) -> Path {
        let PathBuilder {
            subpath,
            mut subpaths,
            ..
        } = std::mem::take(self);
        subpaths.extend(SubPath::new(subpath, false));
        Path::new(subpaths)
    }

    /// Extend path from a string in the SVG path `d` format
    pub fn append_svg_path(&mut self, string: impl AsRef<[u8]>) -> Result<&mut Self, PathError> {
        let parser = PathParser::new(string.as_ref());
        parser.parse(self)?;
        Ok(self)
    }

    /// Current position of the builder
    pub fn position(&self) -> Point {
        self.position
    }

    /// Move current position, ending current subpath
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let subpath = std::mem::take(&mut self.subpath);
        self.subpaths.extend(SubPath::new(subpath, false));
        self.position = p.into();
        self.cubic_ctrl = None;
        self.quad_ctrl = None;
        self
    }

    /// Close current subpath
    pub fn close(&mut self) -> &mut Self {
        let subpath = std::mem::take(&mut self.subpath);
        if let Some(cubic) = subpath.first() {
            self.position = cubic.start();
        }
        self.subpaths.extend(SubPath::new(subpath, true));
        self.cubic_ctrl = None;
        self.quad_ctrl = None;
        self
    }

    /// Add line from the current position to the specified point
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        if !self.position.is_close_to(p) {
            let d = p - self.position;
            let cubic = Cubic::new(
                self.position,
                self.position + (1.0 / 3.0) * d,
                self.position + (2.0 / 3.0) * d,
                p,
            );
            self.subpath.push(cubic);
            self.position = p;
        }
        self.cubic_ctrl = None;
        self.quad_ctrl = None;
        self
    }

    /// Add quadratic bezier curve
    pub fn quad_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        let p1 = p1.into();
        let quad = Quad::new(self.position, p1, p2);
        let cubic: Cubic = quad.into();
        self.position = cubic.end();
        self.subpath.push(cubic);
        self.cubic_ctrl = None;
        self.quad_ctrl = Some(p1);
        self
    }

    /// Add smooth quadratic bezier curve
    pub fn quad_smooth_to(&mut self, p2: impl Into<Point>) -> &mut Self {
        let p1 = match self.quad_ctrl {
            Some(ctrl) => 2.0 * self.position - ctrl,
            None => self.position,
        };
        self.quad_to(p1, p2)
    }

    /// Add cubic bezier curve
    pub fn cubic_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        let cubic = Cubic::new(self.position, p1, p2, p3);
        self.position = cubic.end();
        self.cubic_ctrl = Some(cubic.smooth());
        self.quad_ctrl = None;
        self.subpath.push(cubic);
        self
    }

    /// Add smooth cubic bezier curve
    pub fn cubic_smooth_to(&mut self, p2: impl Into<Point>, p3: impl Into<Point>) -> &mut Self {
        let p1 = self.cubic_ctrl.unwrap_or(self.position);
        self.cubic_to(p1, p2, p3)
    }

    /// Add elliptical arc segment
    pub fn arc_to(
        &mut self,
        radii: impl Into<Point>,
        x_axis_rot: Scalar,
        large: bool,
        sweep: bool,
        p: impl Into<Point>,
    ) -> &mut Self {
        let radii: Point = radii.into();
        let p = p.into();
        let arc = EllipArc::new_param(
            self.position,
            p,
            radii.x(),
            radii.y(),
            x_axis_rot,
            large,
            sweep,
        );
        match arc {
            // degenerate arc turns into a line per the SVG implementation notes
            None => self.line_to(p),
            Some(arc) => {
                self.subpath.extend(arc.to_cubics());
                self.position = p;
                self.cubic_ctrl = None;
                self.quad_ctrl = None;
                self
            }
        }
    }

    /// Add axis-aligned ellipse contour centered at `center`
    pub fn ellipse(&mut self, center: impl Into<Point>, rx: Scalar, ry: Scalar) -> &mut Self {
        // (4/3)*tan(pi/8) = 4*(sqrt(2)-1)/3 = 0.5522847498307935
        const K: Scalar = 0.5522847498307935;
        let center = center.into();
        let (rx, ry) = (rx.abs(), ry.abs());
        if rx < EPSILON || ry < EPSILON {
            return self;
        }
        let x_offset = Point::new(K * rx, 0.0);
        let y_offset = Point::new(0.0, K * ry);
        let p0 = center - Point::new(rx, 0.0);
        let p1 = center - Point::new(0.0, ry);
        let p2 = center + Point::new(rx, 0.0);
        let p3 = center + Point::new(0.0, ry);
        self.move_to(p0)
            .cubic_to(p0 - y_offset, p1 - x_offset, p1)
            .cubic_to(p1 + x_offset, p2 - y_offset, p2)
            .cubic_to(p2 + y_offset, p3 + x_offset, p3)
            .cubic_to(p3 - x_offset, p0 + y_offset, p0)
            .close()
    }

    /// Add box with rounded corners, with current position being the
    /// low-x low-y corner
    pub fn rbox(&mut self, size: impl Into<Point>, radii: impl Into<Point>) -> &mut Self {
        let size = size.into();
        let width = size.x().abs();
        let height = size.y().abs();
        // corner radii cannot exceed half of the box side
        let Point([rx, ry]) = radii.into();
        let rx = rx.abs().min(width / 2.0);
        let ry = ry.abs().min(height / 2.0);
        let radii = Point::new(rx, ry);

        let lx = self.position.x();
        let ly = self.position.y();
        let hx = lx + width;
        let hy = ly + height;
        let rounded = rx > EPSILON && ry > EPSILON;

        self.move_to((lx + rx, ly)).line_to((hx - rx, ly));
        if rounded {
            self.arc_to(radii, 0.0, false, true, (hx, ly + ry));
        }
        self.line_to((hx, hy - ry));
        if rounded {
            self.arc_to(radii, 0.0, false, true, (hx - rx, hy));
        }
        self.line_to((lx + rx, hy));
        if rounded {
            self.arc_to(radii, 0.0, false, true, (lx, hy - ry));
        }
        self.line_to((lx, ly + ry));
        if rounded {
            self.arc_to(radii, 0.0, false, true, (lx + rx, ly));
        }
        self.close()
    }
}

/// Error of the SVG path `d` grammar with a byte offset into the input
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathError {
    pub reason: &'static str,
    pub offset: usize,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at offset {})", self.reason, self.offset)
    }
}

impl std::error::Error for PathError {}

/// Parser for the SVG path `d` attribute grammar
#[derive(Debug)]
pub struct PathParser<'a> {
    // unparsed input
    text: &'a [u8],
    // current offset in the text
    offset: usize,
    // previous command, used for implicit repetition
    prev_cmd: Option<u8>,
    // position from which the next curve will start
    position: Point,
}

impl<'a> PathParser<'a> {
    pub fn new(text: &'a [u8]) -> PathParser<'a> {
        Self {
            text,
            offset: 0,
            prev_cmd: None,
            position: Point::new(0.0, 0.0),
        }
    }

    fn error(&self, reason: &'static str) -> PathError {
        PathError {
            reason,
            offset: self.offset,
        }
    }

    /// Byte at the current position
    fn current(&self) -> Result<u8, PathError> {
        match self.text.get(self.offset) {
            Some(byte) => Ok(*byte),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn advance(&mut self, count: usize) {
        self.offset += count;
    }

    fn is_eof(&self) -> bool {
        self.offset >= self.text.len()
    }

    /// Consume insignificant separators
    fn parse_separators(&mut self) {
        while !self.is_eof() {
            match self.text[self.offset] {
                b' ' | b'\t' | b'\r' | b'\n' | b',' => {
                    self.offset += 1;
                }
                _ => break,
            }
        }
    }

    fn parse_digits(&mut self) -> bool {
        let mut found = false;
        while let Ok(b'0'..=b'9') = self.current() {
            self.advance(1);
            found = true;
        }
        found
    }

    fn parse_sign(&mut self) {
        if let Ok(b'-' | b'+') = self.current() {
            self.advance(1);
        }
    }

    /// Parse single scalar
    fn parse_scalar(&mut self) -> Result<Scalar, PathError> {
        self.parse_separators();
        let start = self.offset;
        self.parse_sign();
        let whole = self.parse_digits();
        if !self.is_eof() {
            let fraction = match self.current()? {
                b'.' => {
                    self.advance(1);
                    self.parse_digits()
                }
                _ => false,
            };
            if !whole && !fraction {
                return Err(self.error("failed to parse scalar"));
            }
            if let Ok(b'e' | b'E') = self.current() {
                self.advance(1);
                self.parse_sign();
                if !self.parse_digits() {
                    return Err(self.error("failed to parse scalar exponent"));
                }
            }
        } else if !whole {
            return Err(self.error("failed to parse scalar"));
        }
        lexical_core::parse(&self.text[start..self.offset])
            .map_err(|_| self.error("failed to parse scalar"))
    }

    /// Parse pair of scalars, converted to absolute coordinates
    fn parse_point(&mut self) -> Result<Point, PathError> {
        let x = self.parse_scalar()?;
        let y = self.parse_scalar()?;
        let is_relative = match self.prev_cmd {
            Some(cmd) => cmd.is_ascii_lowercase(),
            None => false,
        };
        if is_relative {
            Ok(Point([x, y]) + self.position)
        } else {
            Ok(Point([x, y]))
        }
    }

    /// Parse SVG flag (`0` or `1`) used by the elliptical arc command
    fn parse_flag(&mut self) -> Result<bool, PathError> {
        self.parse_separators();
        match self.current()? {
            b'0' => {
                self.advance(1);
                Ok(false)
            }
            b'1' => {
                self.advance(1);
                Ok(true)
            }
            _ => Err(self.error("failed to parse flag")),
        }
    }

    /// Parse command, falling back to implicit repetition of the previous one
    fn parse_cmd(&mut self) -> Result<u8, PathError> {
        let cmd = self.current()?;
        match cmd {
            b'M' | b'm' | b'L' | b'l' | b'V' | b'v' | b'H' | b'h' | b'C' | b'c' | b'S' | b's'
            | b'Q' | b'q' | b'T' | b't' | b'A' | b'a' | b'Z' | b'z' => {
                self.advance(1);
                // implicit repetition of a move is a line
                self.prev_cmd = if cmd == b'm' {
                    Some(b'l')
                } else if cmd == b'M' {
                    Some(b'L')
                } else if cmd == b'Z' || cmd == b'z' {
                    None
                } else {
                    Some(cmd)
                };
                Ok(cmd)
            }
            _ => match self.prev_cmd {
                Some(cmd) => Ok(cmd),
                None => Err(self.error("failed to parse path command")),
            },
        }
    }

    /// Parse SVG path and apply changes to the path builder
    pub fn parse(mut self, builder: &mut PathBuilder) -> Result<(), PathError> {
        loop {
            self.parse_separators();
            if self.is_eof() {
                break;
            }
            self.position = builder.position();
            let cmd = self.parse_cmd()?;
            match cmd {
                b'M' | b'm' => {
                    builder.move_to(self.parse_point()?);
                }
                b'L' | b'l' => {
                    builder.line_to(self.parse_point()?);
                }
                b'V' | b'v' => {
                    let y = self.parse_scalar()?;
                    let p0 = builder.position();
                    let p1 = if cmd == b'v' {
                        Point::new(p0.x(), p0.y() + y)
                    } else {
                        Point::new(p0.x(), y)
                    };
                    builder.line_to(p1);
                }
                b'H' | b'h' => {
                    let x = self.parse_scalar()?;
                    let p0 = builder.position();
                    let p1 = if cmd == b'h' {
                        Point::new(p0.x() + x, p0.y())
                    } else {
                        Point::new(x, p0.y())
                    };
                    builder.line_to(p1);
                }
                b'Q' | b'q' => {
                    builder.quad_to(self.parse_point()?, self.parse_point()?);
                }
                b'T' | b't' => {
                    builder.quad_smooth_to(self.parse_point()?);
                }
                b'C' | b'c' => {
                    builder.cubic_to(
                        self.parse_point()?,
                        self.parse_point()?,
                        self.parse_point()?,
                    );
                }
                b'S' | b's' => {
                    builder.cubic_smooth_to(self.parse_point()?, self.parse_point()?);
                }
                b'A' | b'a' => {
                    let rx = self.parse_scalar()?;
                    let ry = self.parse_scalar()?;
                    let x_axis_rot = self.parse_scalar()?;
                    let large_flag = self.parse_flag()?;
                    let sweep_flag = self.parse_flag()?;
                    let dst = self.parse_point()?;
                    builder.arc_to((rx, ry), x_axis_rot, large_flag, sweep_flag, dst);
                }
                b'Z' | b'z' => {
                    builder.close();
                }
                _ => unreachable!(),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_parse_basic() -> Result<(), PathError> {
        let path: Path = "M10 10 L90 10 90 90 H10 Z".parse()?;
        assert_eq!(path.subpaths().len(), 1);
        let subpath = &path.subpaths()[0];
        assert!(subpath.closed());
        assert_eq!(subpath.cubics().len(), 3);
        assert!(subpath.start().is_close_to(Point::new(10.0, 10.0)));
        assert!(subpath.end().is_close_to(Point::new(10.0, 90.0)));

        let bbox = path.bbox().unwrap();
        assert_approx_eq!(bbox.x(), 10.0);
        assert_approx_eq!(bbox.y(), 10.0);
        assert_approx_eq!(bbox.width(), 80.0);
        assert_approx_eq!(bbox.height(), 80.0);
        Ok(())
    }

    #[test]
    fn test_parse_relative_and_implicit() -> Result<(), PathError> {
        // implicit repetition of `m` continues as relative line
        let path: Path = "m1,1 2,0 0,2 z".parse()?;
        let subpath = &path.subpaths()[0];
        assert!(subpath.closed());
        assert_eq!(subpath.cubics().len(), 2);
        assert!(subpath.cubics()[0].end().is_close_to(Point::new(3.0, 1.0)));
        assert!(subpath.cubics()[1].end().is_close_to(Point::new(3.0, 3.0)));

        // `Z` starts a new subpath at the closed subpath start
        let path: Path = "M0,0L1-1L1,0ZL0,1 L1,1Z".parse()?;
        assert_eq!(path.subpaths().len(), 2);
        assert!(path.subpaths()[1].start().is_close_to(Point::new(0.0, 0.0)));
        Ok(())
    }

    #[test]
    fn test_parse_curves() -> Result<(), PathError> {
        let path: Path = "M0 0 C 0 1 1 1 1 0 S 2 -1 2 0 Q 2.5 1 3 0 T 4 0".parse()?;
        let subpath = &path.subpaths()[0];
        assert_eq!(subpath.cubics().len(), 4);
        // smooth cubic reflects the previous control point
        let [p0, p1, _, _] = subpath.cubics()[1].points();
        assert!(p0.is_close_to(Point::new(1.0, 0.0)));
        assert!(p1.is_close_to(Point::new(1.0, -1.0)));
        // smooth quad reflects the previous quadratic control point:
        // elevated first control is p + 2/3 * (ctrl - p)
        let [q0, q1, _, _] = subpath.cubics()[3].points();
        assert!(q0.is_close_to(Point::new(3.0, 0.0)));
        assert!(q1.is_close_to(Point::new(
            3.0 + 2.0 / 3.0 * 0.5,
            -2.0 / 3.0
        )));
        Ok(())
    }

    #[test]
    fn test_parse_arc() -> Result<(), PathError> {
        let path: Path = "M0 0 A 5 5 0 0 1 10 0".parse()?;
        let subpath = &path.subpaths()[0];
        assert!(subpath.end().is_close_to(Point::new(10.0, 0.0)));
        // degenerate radii fall back to a line
        let path: Path = "M0 0 A 0 0 0 0 1 10 0".parse()?;
        assert_eq!(path.subpaths()[0].cubics().len(), 1);
        Ok(())
    }

    #[test]
    fn test_parse_error_offset() {
        let err = "M10 10 L garbage".parse::<Path>().unwrap_err();
        assert_eq!(err.offset, 9);
        assert!("".parse::<Path>().unwrap().is_empty());
    }

    #[test]
    fn test_rbox() {
        let mut builder = Path::builder();
        builder.move_to((1.0, 2.0)).rbox((4.0, 2.0), (0.0, 0.0));
        let path = builder.build();
        let bbox = path.bbox().unwrap();
        assert_approx_eq!(bbox.x(), 1.0);
        assert_approx_eq!(bbox.y(), 2.0);
        assert_approx_eq!(bbox.width(), 4.0);
        assert_approx_eq!(bbox.height(), 2.0);
        assert!(path.subpaths()[0].closed());

        // oversized radii are clamped to half of the side
        let mut builder = Path::builder();
        builder.move_to((0.0, 0.0)).rbox((2.0, 2.0), (5.0, 5.0));
        let bbox = builder.build().bbox().unwrap();
        assert_approx_eq!(bbox.width(), 2.0, 1e-6);
        assert_approx_eq!(bbox.height(), 2.0, 1e-6);
    }

    #[test]
    fn test_ellipse() {
        let mut builder = Path::builder();
        builder.ellipse((5.0, 5.0), 3.0, 2.0);
        let path = builder.build();
        let bbox = path.bbox().unwrap();
        assert_approx_eq!(bbox.x(), 2.0, 1e-6);
        assert_approx_eq!(bbox.y(), 3.0, 1e-6);
        assert_approx_eq!(bbox.width(), 6.0, 1e-6);
        assert_approx_eq!(bbox.height(), 4.0, 1e-6);
    }

    #[test]
    fn test_flatten_contiguous() -> Result<(), PathError> {
        let path: Path = "M0 0 C 0 10 10 10 10 0 Q 15 -10 20 0".parse()?;
        let line = path.subpaths()[0].flatten(Transform::identity(), 0.05);
        assert!(line.len() > 4);
        assert!(line.first().unwrap().is_close_to(Point::new(0.0, 0.0)));
        assert!(line.last().unwrap().is_close_to(Point::new(20.0, 0.0)));
        Ok(())
    }
}
