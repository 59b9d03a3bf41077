use thiserror::Error;

/// Error types for smoothing operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SmoothError {
    /// Frame (window) size exceeds the number of samples
    #[error("Invalid window: frame of {frame} points does not fit a sequence of {len} points")]
    InvalidWindow { frame: usize, len: usize },

    /// Polynomial degree must be less than the frame size
    #[error("Invalid polynomial degree: {degree}. Must be less than frame size ({frame})")]
    InvalidDegree { degree: usize, frame: usize },

    /// Weight vector length does not match the data it weights
    #[error("Length mismatch: expected {expected} weights, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Weights must be finite and non-negative
    #[error("Invalid weight: {0}. Weights must be finite and non-negative")]
    InvalidWeight(f64),

    /// Design matrix is not of full column rank
    #[error("Singular design matrix for degree {degree} over a frame of {frame} points")]
    SingularDesign { degree: usize, frame: usize },

    /// Too few non-zero weights in a window to fit the polynomial
    #[error("Insufficient support: {support} weighted samples, need at least {required}")]
    InsufficientSupport { support: usize, required: usize },
}

/// Result type for smoothing operations
pub type Result<T> = std::result::Result<T, SmoothError>;
