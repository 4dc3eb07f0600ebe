//! isoline-export: Pure format serializers (sans-IO)
//!
//! Converts stitched contour polylines into output formats. Currently
//! supports SVG.

pub mod svg;

pub use svg::{Bounds, SvgMetadata, build_path_data, to_svg};
