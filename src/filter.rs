use std::iter;
use std::ops::Range;

use nalgebra::DMatrix;

use crate::coefficients::{design_matrix, projection_matrix, ProjectionCache};
use crate::error::{Result, SmoothError};
use crate::moving_average::window_means;

/// Configuration for the Savitzky-Golay filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Half of the window; the frame spans `2 * halfwin + 1` samples
    pub halfwin: usize,
    /// Degree of the local polynomial
    pub degree: usize,
}

impl FilterConfig {
    /// Creates a new filter configuration with validation
    pub fn new(halfwin: usize, degree: usize) -> Result<Self> {
        let frame = 2 * halfwin + 1;
        if degree >= frame {
            return Err(SmoothError::InvalidDegree { degree, frame });
        }
        Ok(Self { halfwin, degree })
    }

    /// Full window width, `2 * halfwin + 1`
    pub fn frame(&self) -> usize {
        2 * self.halfwin + 1
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { halfwin: 1, degree: 1 }
    }
}

/// A Savitzky-Golay smoother with optional sample weights.
///
/// The design matrix and the unweighted projection matrix are built once at
/// construction. Each row of the projection matrix is the kernel that evaluates
/// the local fit at one position of the window: the center row smooths the
/// interior, the leading and trailing rows produce the head and tail of the
/// sequence from its first and last full windows.
#[derive(Debug, Clone)]
pub struct SavitzkyGolayFilter {
    config: FilterConfig,
    design: DMatrix<f64>,
    projection: DMatrix<f64>,
}

impl SavitzkyGolayFilter {
    /// Creates a new Savitzky-Golay filter with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `halfwin` - Half of the window size
    /// * `degree` - Degree of the polynomial to fit (must be < `2 * halfwin + 1`)
    ///
    /// # Example
    ///
    /// ```rust
    /// use sg_movmean::SavitzkyGolayFilter;
    ///
    /// let filter = SavitzkyGolayFilter::new(2, 2).expect("Valid parameters");
    /// assert_eq!(filter.config().frame(), 5);
    /// ```
    pub fn new(halfwin: usize, degree: usize) -> Result<Self> {
        Self::with_config(FilterConfig::new(halfwin, degree)?)
    }

    /// Creates a filter with custom configuration
    pub fn with_config(config: FilterConfig) -> Result<Self> {
        let design = design_matrix(config.halfwin, config.degree);
        let projection = projection_matrix(&design)?;
        Ok(Self { config, design, projection })
    }

    /// Returns the filter configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// The polynomial design matrix of the window
    pub fn design_matrix(&self) -> &DMatrix<f64> {
        &self.design
    }

    /// The unweighted projection matrix of the window
    pub fn projection_matrix(&self) -> &DMatrix<f64> {
        &self.projection
    }

    /// Smooths `data` with uniform weights.
    ///
    /// Input must be finite; there is no missing-value handling on this path and
    /// a non-finite sample spreads to every output whose window contains it. Use
    /// [`apply_weighted`](Self::apply_weighted) for gappy data.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sg_movmean::SavitzkyGolayFilter;
    ///
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0];
    /// let filter = SavitzkyGolayFilter::new(2, 2).expect("Valid parameters");
    /// let smoothed = filter.apply(&data).expect("Long enough");
    /// assert_eq!(smoothed.len(), data.len());
    /// ```
    pub fn apply(&self, data: &[f64]) -> Result<Vec<f64>> {
        self.check_len(data.len())?;
        let frame = self.config.frame();
        let mut out = vec![0.0; data.len()];
        for (start, rows) in self.segments(data.len()) {
            fill_rows(&self.projection, rows, &data[start..start + frame], start, &mut out);
        }
        Ok(out)
    }

    /// Smooths `data` by weighted local least squares.
    ///
    /// Non-finite samples are treated as missing: their value and weight are set
    /// to zero. When every weight is equal the precomputed projection matrix is
    /// shared by all windows; otherwise each window gets the projection matrix of
    /// its own weights. A window with fewer weighted samples than `degree + 1`,
    /// or whose weights leave the fit numerically rank deficient (e.g. a weight
    /// many orders of magnitude below the rest), falls back to the weighted
    /// moving average (same `halfwin`) for the positions it would have produced.
    ///
    /// # Errors
    ///
    /// * [`SmoothError::InvalidWindow`] if `data` is shorter than the frame
    /// * [`SmoothError::LengthMismatch`] / [`SmoothError::InvalidWeight`] for bad weights
    pub fn apply_weighted(&self, data: &[f64], weights: Option<&[f64]>) -> Result<Vec<f64>> {
        self.check_len(data.len())?;
        let (y, w) = prepare_weights(data, weights)?;

        let n = y.len();
        let h = self.config.halfwin;
        let frame = self.config.frame();
        let uniform = w[0] > 0.0 && w.iter().all(|v| v.to_bits() == w[0].to_bits());
        if uniform {
            log::trace!("uniform weights, sharing one projection matrix across {} windows", n - 2 * h);
        }

        let mut cache = ProjectionCache::new();
        let mut fallback: Option<Vec<f64>> = None;
        let mut out = vec![f64::NAN; n];

        for (start, rows) in self.segments(n) {
            let window = start..start + frame;
            let projection = if uniform {
                Ok(&self.projection)
            } else {
                cache.weighted(&self.design, h, &w[window.clone()])
            };

            match projection {
                Ok(b) => fill_rows(b, rows, &y[window], start, &mut out),
                // The full-weight design is known to be of full rank, so a
                // singular window comes from its weights alone
                Err(e @ (SmoothError::InsufficientSupport { .. } | SmoothError::SingularDesign { .. })) => {
                    log::debug!("window at {}: {}; using moving average", start, e);
                    let means = fallback.get_or_insert_with(|| window_means(&y, &w, h, h));
                    for k in rows {
                        out[start + k] = means[start + k];
                    }
                }
                Err(e) => return Err(e),
            }
        }

        if !uniform {
            log::trace!(
                "weighted smoothing decomposed {} weight patterns ({} cache hits)",
                cache.len(),
                cache.hits()
            );
        }
        Ok(out)
    }

    fn check_len(&self, len: usize) -> Result<()> {
        let frame = self.config.frame();
        if len < frame {
            return Err(SmoothError::InvalidWindow { frame, len });
        }
        Ok(())
    }

    /// Window start and projection rows for the head, each interior position, and the tail.
    ///
    /// Requires `n >= frame`. When `n == frame` head and tail share the center
    /// position, which both compute from the same window.
    fn segments(&self, n: usize) -> impl Iterator<Item = (usize, Range<usize>)> {
        let h = self.config.halfwin;
        let frame = self.config.frame();
        iter::once((0, 0..h + 1))
            .chain((h + 1..n - h - 1).map(move |i| (i - h, h..h + 1)))
            .chain(iter::once((n - frame, h..frame)))
    }
}

/// Applies the given projection rows to one window, writing outputs at `start + row`.
pub(crate) fn fill_rows(b: &DMatrix<f64>, rows: Range<usize>, window: &[f64], start: usize, out: &mut [f64]) {
    for k in rows {
        out[start + k] = b.row(k).iter().zip(window).map(|(c, v)| c * v).sum();
    }
}

/// Validates caller weights and folds non-finite samples into zero weight.
///
/// Returns the cleaned values and weights: a missing sample becomes value 0 with
/// weight 0, so it takes part in matrix arithmetic without contributing.
pub(crate) fn prepare_weights(data: &[f64], weights: Option<&[f64]>) -> Result<(Vec<f64>, Vec<f64>)> {
    let w = match weights {
        Some(w) => {
            if w.len() != data.len() {
                return Err(SmoothError::LengthMismatch { expected: data.len(), got: w.len() });
            }
            if let Some(&bad) = w.iter().find(|v| !v.is_finite() || **v < 0.0) {
                return Err(SmoothError::InvalidWeight(bad));
            }
            w.to_vec()
        }
        None => vec![1.0; data.len()],
    };

    let (y, w) = fold_missing(data, w);
    if !w.is_empty() && w.iter().all(|&v| v == 0.0) {
        log::warn!("all {} samples carry zero weight; every output will be NaN", w.len());
    }
    Ok((y, w))
}

/// Zeroes value and weight of every non-finite sample.
pub(crate) fn fold_missing(data: &[f64], mut w: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    let mut y = data.to_vec();
    for (value, weight) in y.iter_mut().zip(w.iter_mut()) {
        if !value.is_finite() {
            *value = 0.0;
            *weight = 0.0;
        }
    }
    (y, w)
}
