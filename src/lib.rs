//! SVG to raster conversion core
//!
//! Main features:
//!  - SVG document parsing into a flat scene of cubic bezier shapes
//!  - Anti-aliased scanline rasterization into an RGBA8 buffer
//!  - Linear and radial gradient paints
//!
#![deny(warnings)]

mod color;
mod curve;
mod ellipse;
mod geometry;
mod grad;
mod path;
mod rasterize;
mod scene;
mod svg;
mod utils;

pub use color::{ColorError, ColorF, RGBA};
pub use curve::{Cubic, Quad};
pub use ellipse::EllipArc;
pub use geometry::{BBox, EPSILON, PI, Point, Scalar, Transform};
pub use grad::{GradLinear, GradRadial, GradSpread, GradStop, GradStops, Paint};
pub use path::{
    FillRule, LineCap, LineJoin, Path, PathBuilder, PathError, PathParser, StrokeStyle, SubPath,
};
pub use rasterize::{Pixmap, RasterError, Scale};
pub use scene::{Document, Shape};
pub use svg::{DEFAULT_DPI, DEFAULT_UNITS, ParseError};
