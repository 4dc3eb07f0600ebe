//! Integration test: contour a synthetic grid and export it to SVG.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use isoline_export::{Bounds, SvgMetadata, to_svg};
use isoline_pipeline::{ContourConfig, ScalarGrid, StitcherKind, trace_contours};

/// Two Gaussian bumps on a 40x60 grid with coordinates in metres.
#[allow(clippy::cast_precision_loss)]
fn twin_peaks() -> ScalarGrid {
    let (rows, cols) = (40, 60);
    let bump = |x: f64, y: f64, cx: f64, cy: f64| (-((x - cx).powi(2) + (y - cy).powi(2)) / 40.0).exp();
    let mut values = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            let (y, x) = (i as f64, j as f64);
            values.push(bump(x, y, 18.0, 20.0) + 0.8 * bump(x, y, 42.0, 19.0));
        }
    }
    ScalarGrid {
        rows,
        cols,
        values,
        row_coords: (0..rows).map(|i| 100.0 + i as f64 * 2.0).collect(),
        col_coords: (0..cols).map(|j| j as f64 * 2.0).collect(),
    }
}

#[test]
fn twin_peaks_pipeline_to_svg() {
    let grid = twin_peaks();
    let levels = [0.2, 0.5, 0.9];
    let config = ContourConfig {
        stitcher: StitcherKind::VectorChain,
        ..ContourConfig::default()
    };
    let result = trace_contours(&grid, &levels, &config).expect("valid grid");

    // The saddle between the peaks is below every level, so the two lower
    // levels circle each peak separately and the top level only reaches
    // the taller one.
    let closed: Vec<usize> = result
        .polylines
        .iter()
        .map(|level| level.iter().filter(|p| p.is_closed(&result.tolerance)).count())
        .collect();
    assert_eq!(closed, vec![2, 2, 1]);
    assert_eq!(result.polyline_count(), 5);

    let config_json = serde_json::to_string(&config).unwrap();
    let metadata = SvgMetadata {
        title: Some("twin-peaks"),
        description: Some("levels 0.2, 0.5, 0.9"),
        config_json: Some(&config_json),
    };
    let svg = to_svg(
        &result.polylines,
        &levels,
        Bounds::from_grid(&grid),
        &result.tolerance,
        &metadata,
    );

    assert!(svg.contains("<svg"));
    assert!(svg.contains("</svg>"));
    assert!(svg.contains(r#"viewBox="0 100 118 78""#));
    assert_eq!(svg.matches("<g").count(), levels.len());
    assert_eq!(svg.matches("<path").count(), result.polyline_count());
    assert!(svg.contains(r#"data-level="0.9""#));
    assert!(svg.contains("VectorChain"));
}
