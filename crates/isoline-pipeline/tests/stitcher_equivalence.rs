//! Integration test: both stitchers agree on a synthetic multi-peak field.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use isoline_pipeline::{
    ContourConfig, ContourResult, Point, Polyline, ScalarGrid, StitcherKind, trace_contours,
    trace_segments,
};

const LEVELS: [f64; 4] = [-0.55, -0.05, 0.35, 0.8];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Smooth field with several peaks and pits, sampled on a non-square grid
/// with non-unit spacing.
#[allow(clippy::cast_precision_loss)]
fn wavy_grid() -> ScalarGrid {
    let (rows, cols) = (24, 32);
    let mut values = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            let (y, x) = (i as f64, j as f64);
            values.push((y * 0.45).sin() * (x * 0.38).cos() + 0.013 * x);
        }
    }
    ScalarGrid {
        rows,
        cols,
        values,
        row_coords: (0..rows).map(|i| i as f64 * 0.5).collect(),
        col_coords: (0..cols).map(|j| j as f64 * 0.25).collect(),
    }
}

fn run(kind: StitcherKind) -> ContourResult {
    let config = ContourConfig {
        stitcher: kind,
        ..ContourConfig::default()
    };
    trace_contours(&wavy_grid(), &LEVELS, &config).expect("valid grid")
}

fn edge_count(polylines: &[Polyline]) -> usize {
    polylines.iter().map(Polyline::edge_count).sum()
}

fn all_points(polylines: &[Polyline]) -> Vec<Point> {
    polylines
        .iter()
        .flat_map(|p| p.points().iter().copied())
        .collect()
}

#[test]
fn greedy_consumes_every_segment_once() {
    init_logger();
    let segments = trace_segments(&wavy_grid(), &LEVELS, &ContourConfig::default()).unwrap();
    let greedy = run(StitcherKind::Greedy);

    for (level, polylines) in greedy.polylines.iter().enumerate() {
        let traced = segments.level_segment_counts[level];
        assert!(traced > 0, "level {level} should cross the field");
        assert_eq!(edge_count(polylines), traced, "level {level}");
        assert!(all_points(polylines).len() <= 2 * traced);
    }
}

#[test]
fn stitchers_find_the_same_contours() {
    init_logger();
    let greedy = run(StitcherKind::Greedy);
    let vector = run(StitcherKind::VectorChain);
    let tol = greedy.tolerance;
    assert_eq!(tol, vector.tolerance);

    for (level, (g, v)) in greedy.polylines.iter().zip(&vector.polylines).enumerate() {
        assert_eq!(g.len(), v.len(), "polyline count differs at level {level}");

        let closed_g = g.iter().filter(|p| p.is_closed(&tol)).count();
        let closed_v = v.iter().filter(|p| p.is_closed(&tol)).count();
        assert_eq!(closed_g, closed_v, "closed count differs at level {level}");

        // Condensation only ever drops points that lie on a straight run.
        let greedy_points = all_points(g);
        let vector_points = all_points(v);
        assert!(vector_points.len() <= greedy_points.len());
        for p in &vector_points {
            assert!(
                greedy_points.iter().any(|q| tol.coincident(*p, *q)),
                "vector-chain point {p:?} missing from greedy output at level {level}",
            );
        }
    }
}

#[test]
fn packed_output_matches_polylines() {
    init_logger();
    for kind in [StitcherKind::Greedy, StitcherKind::VectorChain] {
        let result = run(kind);
        let packed = &result.packed;
        assert_eq!(packed.level_count(), LEVELS.len());
        assert_eq!(packed.polygon_count, result.polyline_count());
        assert_eq!(packed.lengths.len(), packed.polygon_count);
        assert_eq!(packed.lengths.iter().sum::<usize>(), packed.x.len());
        assert_eq!(packed.x.len(), packed.y.len());

        let flat = all_points(&result.polylines.concat());
        assert_eq!(flat.len(), packed.x.len());
        for (p, (&x, &y)) in flat.iter().zip(packed.x.iter().zip(&packed.y)) {
            assert_eq!(*p, Point::new(x, y));
        }
    }
}
