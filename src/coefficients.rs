use ahash::AHashMap;
use nalgebra::DMatrix;
use std::collections::hash_map::Entry;

use crate::error::{Result, SmoothError};

/// Relative threshold on the diagonal of `R` below which a column is treated as dependent.
const RANK_TOLERANCE: f64 = 1e-10;

/// Builds the polynomial design (Vandermonde) matrix of a symmetric window.
///
/// Row `i` holds the monomials of the centered offset `i - halfwin`, so
/// `S[(i, j)] = (i - halfwin)^j` for a frame of `2 * halfwin + 1` points and
/// `degree + 1` columns.
///
/// # Example
///
/// ```rust
/// use sg_movmean::design_matrix;
///
/// let s = design_matrix(2, 2);
/// assert_eq!(s.nrows(), 5);
/// assert_eq!(s[(0, 1)], -2.0);
/// ```
pub fn design_matrix(halfwin: usize, degree: usize) -> DMatrix<f64> {
    let frame = 2 * halfwin + 1;
    DMatrix::from_fn(frame, degree + 1, |i, j| {
        let x = i as f64 - halfwin as f64; // Center the window around 0
        x.powi(j as i32)
    })
}

/// Computes the least-squares projection (hat) matrix `S (SᵗS)⁻¹ Sᵗ` of a design matrix.
///
/// Goes through the economy QR decomposition `S = QR` and the triangular solve
/// `Rᵗ T = Sᵗ`, so that `B = Tᵗ T` without ever inverting `SᵗS`. Row `k` of the
/// result is the smoothing kernel that evaluates the local fit at window position `k`.
pub fn projection_matrix(design: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    check_shape(design)?;
    let r = design.clone().qr().r();
    solve_projection(design, &r)
}

/// Computes the weighted least-squares projection matrix of a design matrix.
///
/// Decomposes `diag(√w) S`, solves the same triangular system against the
/// unweighted `Sᵗ`, and scales column `j` of `Tᵗ T` by `w[j]`. Applying row `k`
/// to a window of observations yields the weighted polynomial fit at offset `k`;
/// zero-weighted samples drop out of every row.
///
/// # Errors
///
/// * [`SmoothError::LengthMismatch`] if `weights` does not cover the frame
/// * [`SmoothError::InsufficientSupport`] if fewer than `degree + 1` weights are non-zero
pub fn weighted_projection_matrix(design: &DMatrix<f64>, weights: &[f64]) -> Result<DMatrix<f64>> {
    check_shape(design)?;
    let (frame, cols) = design.shape();
    if weights.len() != frame {
        return Err(SmoothError::LengthMismatch { expected: frame, got: weights.len() });
    }
    if let Some(&bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(SmoothError::InvalidWeight(bad));
    }

    let support = weights.iter().filter(|&&w| w > 0.0).count();
    if support < cols {
        return Err(SmoothError::InsufficientSupport { support, required: cols });
    }

    let scaled = DMatrix::from_fn(frame, cols, |i, j| weights[i].sqrt() * design[(i, j)]);
    let r = scaled.qr().r();
    let mut b = solve_projection(design, &r)?;

    for (j, &w) in weights.iter().enumerate() {
        b.column_mut(j).scale_mut(w);
    }
    Ok(b)
}

fn check_shape(design: &DMatrix<f64>) -> Result<()> {
    let (frame, cols) = design.shape();
    if cols == 0 || cols > frame {
        return Err(SmoothError::InvalidDegree { degree: cols.saturating_sub(1), frame });
    }
    Ok(())
}

/// Solves `Rᵗ T = Sᵗ` and returns `Tᵗ T`, rejecting rank-deficient `R`.
fn solve_projection(design: &DMatrix<f64>, r: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let (frame, cols) = design.shape();
    let singular = SmoothError::SingularDesign { degree: cols - 1, frame };

    let diag = r.diagonal();
    let scale = diag.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || diag.iter().any(|v| v.abs() <= RANK_TOLERANCE * scale) {
        return Err(singular);
    }

    let t = r
        .transpose()
        .solve_lower_triangular(&design.transpose())
        .ok_or(singular)?;
    Ok(t.transpose() * &t)
}

/// Cache key: frame geometry plus the exact bit pattern of the window weights.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ProjectionKey {
    halfwin: usize,
    degree: usize,
    weights: Vec<u64>,
}

/// Memoizes weighted projection matrices by window weight pattern.
///
/// Series with sparse gaps produce long runs of identical weight windows, so
/// most per-window rebuilds in the weighted smoother become lookups. A cache is
/// meant to live for a single smoothing call.
#[derive(Debug, Default)]
pub struct ProjectionCache {
    matrices: AHashMap<ProjectionKey, DMatrix<f64>>,
    hits: usize,
}

impl ProjectionCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the weighted projection matrix for `weights`, computing it on first use.
    ///
    /// `design` must be the design matrix for `(halfwin, degree)`. Failures are
    /// not cached.
    pub fn weighted(
        &mut self,
        design: &DMatrix<f64>,
        halfwin: usize,
        weights: &[f64],
    ) -> Result<&DMatrix<f64>> {
        let key = ProjectionKey {
            halfwin,
            degree: design.ncols().saturating_sub(1),
            weights: weights.iter().map(|w| w.to_bits()).collect(),
        };

        match self.matrices.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                Ok(&*entry.into_mut())
            }
            Entry::Vacant(entry) => {
                log::trace!("projection cache miss (halfwin={}, weights={:?})", halfwin, weights);
                let b = weighted_projection_matrix(design, weights)?;
                Ok(&*entry.insert(b))
            }
        }
    }

    /// Number of distinct weight patterns decomposed so far
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// Returns true if nothing has been computed yet
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// Number of lookups answered without a decomposition
    pub fn hits(&self) -> usize {
        self.hits
    }
}
