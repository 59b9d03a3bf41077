//! # Weighted Savitzky-Golay and moving-average smoothing
//!
//! Smoothing for noisy numeric sequences that may contain gaps (NaN or
//! infinite samples). Two filter families are provided:
//!
//! - A Savitzky-Golay filter (local polynomial least squares), optionally
//!   sample-weighted. The convolution kernels come from a projection matrix
//!   built through a QR decomposition of the polynomial design matrix; its
//!   leading and trailing rows smooth the two ends of the sequence.
//! - A weighted moving average over a symmetric or asymmetric window that is
//!   clipped at the sequence ends, with an optional SG-style mode that replaces
//!   the boundary values by a weighted linear fit.
//!
//! Missing samples never raise errors: they are given zero weight, and an
//! output whose window carries no weight at all is NaN.
//!
//! ## Example
//!
//! ```rust
//! use sg_movmean::{movmean, smooth_wsg};
//!
//! let data = vec![1.0, 3.0, 2.0, f64::NAN, 6.0, 8.0, 10.0, 1.0];
//! let smoothed = smooth_wsg(&data, 2, 2, None).expect("Valid parameters");
//! let averaged = movmean(&data, 2, false, None).expect("Valid parameters");
//! assert_eq!(smoothed.len(), averaged.len());
//! ```

mod coefficients;
mod error;
mod filter;
mod moving_average;

pub use coefficients::{design_matrix, projection_matrix, weighted_projection_matrix, ProjectionCache};
pub use error::{Result, SmoothError};
pub use filter::{FilterConfig, SavitzkyGolayFilter};
pub use moving_average::{movmean_2d, MovingAverage, MovingAverageConfig};

/// Default half window of [`design_matrix`] when none is given
pub const DEFAULT_DESIGN_HALFWIN: usize = 5;
/// Default polynomial degree of [`design_matrix`] when none is given
pub const DEFAULT_DESIGN_DEGREE: usize = 2;
/// Default left window of [`movmean_2d`]
pub const DEFAULT_ROWWISE_WIN_LEFT: usize = 3;
/// Default right window of [`movmean_2d`]
pub const DEFAULT_ROWWISE_WIN_RIGHT: usize = 0;

/// Savitzky-Golay smoothing with optional sample weights.
///
/// Non-finite samples are ignored (zero weight). This is a convenience wrapper
/// around [`SavitzkyGolayFilter::apply_weighted`]; the usual defaults are
/// `halfwin = 1` and `degree = 1`.
///
/// # Example
///
/// ```rust
/// use sg_movmean::smooth_wsg;
///
/// let y = vec![1.0, 3.0, 2.0, 5.0, 6.0, 8.0, 10.0, 1.0];
/// let w: Vec<f64> = (1..=8).map(|i| i as f64 / 8.0).collect();
/// let smoothed = smooth_wsg(&y, 2, 2, Some(&w)).unwrap();
/// assert_eq!(smoothed.len(), y.len());
/// ```
pub fn smooth_wsg(data: &[f64], halfwin: usize, degree: usize, weights: Option<&[f64]>) -> Result<Vec<f64>> {
    SavitzkyGolayFilter::new(halfwin, degree)?.apply_weighted(data, weights)
}

/// Unweighted Savitzky-Golay smoothing. Input must be finite.
pub fn smooth_sg(data: &[f64], halfwin: usize, degree: usize) -> Result<Vec<f64>> {
    SavitzkyGolayFilter::new(halfwin, degree)?.apply(data)
}

/// Moving average over `[i - halfwin, i + halfwin]`, clipped to the sequence.
///
/// With `sg_style` the first and last `halfwin` values come from a weighted
/// linear fit of the boundary frames instead of the clipped average.
///
/// # Example
///
/// ```rust
/// use sg_movmean::movmean;
///
/// let out = movmean(&[1.0, 2.0, 3.0, 4.0, 5.0], 2, false, None).unwrap();
/// assert_eq!(out, vec![2.0, 2.5, 3.0, 3.5, 4.0]);
/// ```
pub fn movmean(data: &[f64], halfwin: usize, sg_style: bool, weights: Option<&[f64]>) -> Result<Vec<f64>> {
    let config = MovingAverageConfig::symmetric(halfwin).with_sg_style(sg_style);
    MovingAverage::new(config).apply(data, weights)
}

/// Moving average over `[i - win_left, i + win_right]`, clipped to the sequence.
pub fn movmean2(data: &[f64], win_left: usize, win_right: usize, weights: Option<&[f64]>) -> Result<Vec<f64>> {
    MovingAverage::new(MovingAverageConfig::asymmetric(win_left, win_right)).apply(data, weights)
}
