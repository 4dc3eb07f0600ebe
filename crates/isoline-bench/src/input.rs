//! Grid loading and level selection for the bench CLI.

use std::path::{Path, PathBuf};

use isoline_pipeline::{ContourError, ScalarGrid};

/// Errors raised while preparing pipeline input.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The grid file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `.json` grid did not deserialize into a [`ScalarGrid`].
    #[error("invalid grid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other file failed to decode as an image.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// The loaded grid is inconsistent.
    #[error(transparent)]
    Contour(#[from] ContourError),

    /// Levels could not be generated from the grid's values.
    #[error("cannot generate levels: {0}")]
    Levels(String),
}

/// Load a grid from `path`.
///
/// Files with a `.json` extension must hold a serialized [`ScalarGrid`].
/// Anything else is decoded as an image and converted to grayscale, one
/// sample per pixel with pixel indices as coordinates.
///
/// # Errors
///
/// Returns an [`InputError`] if the file cannot be read or decoded, or if
/// the resulting grid fails validation.
pub fn load_grid(path: &Path) -> Result<ScalarGrid, InputError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let grid = if is_json {
        let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text)?
    } else {
        grid_from_image(&image::open(path)?)
    };

    grid.validate()?;
    log::info!(
        "loaded {}x{} grid from {}",
        grid.rows,
        grid.cols,
        path.display()
    );
    Ok(grid)
}

/// Convert an image to a grid of 8-bit luminance samples.
pub fn grid_from_image(img: &image::DynamicImage) -> ScalarGrid {
    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    let values = gray.pixels().map(|p| f64::from(p.0[0])).collect();
    ScalarGrid::with_index_coords(height as usize, width as usize, values)
}

/// `count` evenly spaced levels strictly inside the grid's value range.
///
/// The extremes are excluded because a level equal to the global minimum
/// or maximum only touches isolated samples.
///
/// # Errors
///
/// Returns [`InputError::Levels`] if `count` is zero, the grid has no
/// finite values, or all values are equal.
#[allow(clippy::cast_precision_loss)]
pub fn even_levels(grid: &ScalarGrid, count: usize) -> Result<Vec<f64>, InputError> {
    if count == 0 {
        return Err(InputError::Levels("level count must be positive".to_string()));
    }
    let (lo, hi) = grid
        .value_range()
        .ok_or_else(|| InputError::Levels("grid has no finite values".to_string()))?;
    if hi <= lo {
        return Err(InputError::Levels(format!("grid is flat at {lo}")));
    }
    let step = (hi - lo) / (count + 1) as f64;
    Ok((1..=count).map(|k| step.mul_add(k as f64, lo)).collect())
}
