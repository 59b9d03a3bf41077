use nalgebra::DMatrix;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::coefficients::{design_matrix, weighted_projection_matrix};
use crate::error::{Result, SmoothError};
use crate::filter::{fill_rows, fold_missing, prepare_weights};

/// Polynomial degree of the SG-style boundary overlay.
const BOUNDARY_DEGREE: usize = 1;

/// Window shape for the moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverageConfig {
    win_left: usize,
    win_right: usize,
    sg_style: bool,
}

impl MovingAverageConfig {
    /// Window of `halfwin` samples on each side of the output position
    pub fn symmetric(halfwin: usize) -> Self {
        Self { win_left: halfwin, win_right: halfwin, sg_style: false }
    }

    /// Window of `win_left` samples before and `win_right` after the output position
    pub fn asymmetric(win_left: usize, win_right: usize) -> Self {
        Self { win_left, win_right, sg_style: false }
    }

    /// Replaces the first and last `halfwin` outputs with a weighted linear fit
    /// over the boundary frames. Only honored for symmetric windows.
    pub fn with_sg_style(mut self, sg_style: bool) -> Self {
        self.sg_style = sg_style;
        self
    }

    pub fn win_left(&self) -> usize {
        self.win_left
    }

    pub fn win_right(&self) -> usize {
        self.win_right
    }

    pub fn sg_style(&self) -> bool {
        self.sg_style
    }
}

impl Default for MovingAverageConfig {
    fn default() -> Self {
        Self::symmetric(1)
    }
}

/// A missing-value-aware weighted moving average.
///
/// Near the ends of the sequence the window is clipped to the available
/// samples rather than padded or reflected.
#[derive(Debug, Clone, Default)]
pub struct MovingAverage {
    config: MovingAverageConfig,
}

impl MovingAverage {
    pub fn new(config: MovingAverageConfig) -> Self {
        Self { config }
    }

    /// Returns the window configuration
    pub fn config(&self) -> &MovingAverageConfig {
        &self.config
    }

    /// Averages `data` over the configured window.
    ///
    /// Each output is `Σ w·y / Σ w` over the finite samples of its window, or
    /// NaN when the window carries no weight. With weights other than 0 and 1
    /// this differs from an unweighted sum over the weight total (`Σ y / Σ w`):
    /// the weights here act as relative sample importances, so a constant
    /// input stays constant.
    ///
    /// # Errors
    ///
    /// * [`SmoothError::LengthMismatch`] / [`SmoothError::InvalidWeight`] for bad weights
    /// * [`SmoothError::InvalidWindow`] if SG-style boundaries are requested and
    ///   `data` is shorter than the frame
    ///
    /// # Example
    ///
    /// ```rust
    /// use sg_movmean::{MovingAverage, MovingAverageConfig};
    ///
    /// let ma = MovingAverage::new(MovingAverageConfig::asymmetric(2, 0));
    /// let out = ma.apply(&[4.0, 8.0, f64::NAN, -1.0], None).unwrap();
    /// assert_eq!(out, vec![4.0, 6.0, 6.0, 3.5]);
    /// ```
    pub fn apply(&self, data: &[f64], weights: Option<&[f64]>) -> Result<Vec<f64>> {
        let MovingAverageConfig { win_left, win_right, sg_style } = self.config;
        let overlay = sg_style && win_left == win_right && win_left > 0;
        if sg_style && win_left != win_right {
            log::warn!(
                "SG-style boundaries need a symmetric window (got {} left, {} right); skipping",
                win_left,
                win_right
            );
        }
        if overlay && data.len() < 2 * win_left + 1 {
            return Err(SmoothError::InvalidWindow { frame: 2 * win_left + 1, len: data.len() });
        }

        let (y, w) = prepare_weights(data, weights)?;
        let mut out = window_means(&y, &w, win_left, win_right);
        if overlay {
            overlay_boundaries(&y, &w, win_left, &mut out)?;
        }
        Ok(out)
    }
}

/// Weighted window means over already-cleaned values and weights.
///
/// Missing samples must have been folded to zero weight. The window for
/// position `i` is `[i - win_left, i + win_right]` clipped to `[0, n - 1]`.
pub(crate) fn window_means(y: &[f64], w: &[f64], win_left: usize, win_right: usize) -> Vec<f64> {
    let n = y.len();
    (0..n)
        .map(|i| {
            let begin = i.saturating_sub(win_left);
            let end = i.saturating_add(win_right).min(n - 1);

            let (sum, sum_w) = (begin..=end)
                .fold((0.0, 0.0), |(sum, sum_w), j| (sum + w[j] * y[j], sum_w + w[j]));
            if sum_w > 0.0 {
                sum / sum_w
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Overwrites the first and last `halfwin` outputs with a weighted linear fit
/// of the first and last frames. A boundary frame without enough weighted
/// samples, or whose weights make the fit rank deficient, keeps its
/// moving-average values.
fn overlay_boundaries(y: &[f64], w: &[f64], halfwin: usize, out: &mut [f64]) -> Result<()> {
    let n = y.len();
    let frame = 2 * halfwin + 1;
    let design = design_matrix(halfwin, BOUNDARY_DEGREE);

    let boundaries = [(0, 0..halfwin), (n - frame, halfwin + 1..frame)];
    for (start, rows) in boundaries {
        let window = start..start + frame;
        match weighted_projection_matrix(&design, &w[window.clone()]) {
            Ok(b) => fill_rows(&b, rows, &y[window], start, out),
            Err(e @ (SmoothError::InsufficientSupport { .. } | SmoothError::SingularDesign { .. })) => {
                log::debug!("boundary frame at {}: {}; keeping moving average", start, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Applies the asymmetric moving average to every row of `mat` independently.
///
/// Non-finite entries are missing values; a row position whose window holds
/// none of its row's finite samples is NaN. With the `parallel` feature rows are
/// processed concurrently.
pub fn movmean_2d(mat: &DMatrix<f64>, win_left: usize, win_right: usize) -> DMatrix<f64> {
    let (nrows, ncols) = mat.shape();
    let smooth_row = |i: usize| {
        let row: Vec<f64> = mat.row(i).iter().copied().collect();
        let (y, w) = fold_missing(&row, vec![1.0; ncols]);
        window_means(&y, &w, win_left, win_right)
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = (0..nrows).into_par_iter().map(smooth_row).collect();
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = (0..nrows).map(smooth_row).collect();

    DMatrix::from_fn(nrows, ncols, |i, j| rows[i][j])
}
