//! SVG export serializer.
//!
//! Converts stitched contour polylines into an SVG string using the
//! [`svg`] crate for document construction, XML escaping, and path data
//! formatting.
//!
//! Each level becomes a `<g>` element carrying its level value in a
//! `data-level` attribute, and each polyline inside it a `<path>` built
//! from `M` (move to) and `L` (line to) commands. Closed polylines drop
//! their repeated last point and end with the close command instead.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Group, Path, Title};
use svg::node::{Node, Text, Value};

use isoline_pipeline::{Point, Polyline, ScalarGrid, Tolerance};

/// Namespace for the embedded configuration element.
const CONFIG_NAMESPACE: &str = "https://github.com/isoline-rs/isoline/ns/1";

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically by
/// the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source grid's file stem.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized contour configuration, emitted inside `<metadata>` in a
    /// namespaced `<isoline:config>` element so exported files can be
    /// reproduced.
    pub config_json: Option<&'a str>,
}

/// Axis-aligned extent of the grid in coordinate space.
///
/// Becomes the SVG `viewBox`, so contours keep their grid coordinates
/// unchanged in the output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Extent of the grid's column (x) and row (y) coordinates.
    ///
    /// Coordinate arrays may run in either direction. Empty coordinate
    /// arrays give a zero extent at the origin.
    #[must_use]
    pub fn from_grid(grid: &ScalarGrid) -> Self {
        let (min_x, max_x) = extent(&grid.col_coords);
        let (min_y, max_y) = extent(&grid.row_coords);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0)
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(0.0)
    }
}

fn extent(coords: &[f64]) -> (f64, f64) {
    coords
        .iter()
        .copied()
        .filter(|c| c.is_finite())
        .fold(None, |acc, c| match acc {
            None => Some((c, c)),
            Some((lo, hi)) => Some((f64::min(lo, c), f64::max(hi, c))),
        })
        .unwrap_or((0.0, 0.0))
}

/// Build an SVG path `d` attribute string from a polyline.
///
/// Uses `M` for the first point and `L` for subsequent points. When
/// `closed` is set the last point is assumed to repeat the first and is
/// replaced by the close command. Returns an empty string for polylines
/// with fewer than 2 points.
///
/// Coordinates are formatted by the [`svg`] crate using `f32` precision.
///
/// # Examples
///
/// ```
/// use isoline_pipeline::{Point, Polyline};
/// use isoline_export::build_path_data;
///
/// let polyline = Polyline::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// let d = build_path_data(&polyline, false);
/// assert_eq!(d, "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(polyline: &Polyline, closed: bool) -> String {
    let points = polyline.points();
    if points.len() < 2 {
        return String::new();
    }
    let body = if closed && points.len() > 2 {
        &points[1..points.len() - 1]
    } else {
        &points[1..]
    };

    let xy = |p: &Point| (p.x, p.y);
    let mut data = Data::new().move_to(xy(&points[0]));
    for p in body {
        data = data.line_to(xy(p));
    }
    if closed && points.len() > 2 {
        data = data.close();
    }
    String::from(Value::from(data))
}

/// Serialize contour polylines into an SVG document string.
///
/// `levels[k]` holds the polylines of level `k`; `level_values[k]` is
/// written to that group's `data-level` attribute when present. Polylines
/// with fewer than 2 points are skipped. `tolerance` decides which
/// polylines are closed, and should be the one the stitcher used.
///
/// # Examples
///
/// ```
/// use isoline_pipeline::{Point, Polyline, Tolerance};
/// use isoline_export::{Bounds, SvgMetadata, to_svg};
///
/// let levels = vec![vec![
///     Polyline::new(vec![Point::new(1.0, 1.5), Point::new(2.5, 3.0)]),
/// ]];
/// let bounds = Bounds { min_x: 0.0, min_y: 0.0, max_x: 4.0, max_y: 4.0 };
/// let metadata = SvgMetadata {
///     title: Some("ridge"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&levels, &[0.5], bounds, &Tolerance::new(1e-4, 1e-4), &metadata);
/// assert!(svg.contains("<title>ridge</title>"));
/// assert!(svg.contains(r#"data-level="0.5""#));
/// assert!(svg.contains("M1,1.5 L2.5,3"));
/// ```
#[must_use]
pub fn to_svg(
    levels: &[Vec<Polyline>],
    level_values: &[f64],
    bounds: Bounds,
    tolerance: &Tolerance,
    metadata: &SvgMetadata<'_>,
) -> String {
    let mut doc = Document::new()
        .set("width", bounds.width())
        .set("height", bounds.height())
        .set(
            "viewBox",
            (bounds.min_x, bounds.min_y, bounds.width(), bounds.height()),
        );

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("isoline:config");
        config_el.assign("xmlns:isoline", CONFIG_NAMESPACE);
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    for (idx, polylines) in levels.iter().enumerate() {
        let mut group = Group::new()
            .set("data-level-index", idx)
            .set("fill", "none")
            .set("stroke", "black")
            .set("stroke-width", 1)
            .set("vector-effect", "non-scaling-stroke");
        if let Some(&value) = level_values.get(idx) {
            group = group.set("data-level", value);
        }

        for polyline in polylines {
            let d = build_path_data(polyline, polyline.is_closed(tolerance));
            if d.is_empty() {
                continue;
            }
            group = group.add(Path::new().set("d", d));
        }
        doc = doc.add(group);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
