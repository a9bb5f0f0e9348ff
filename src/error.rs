//! Error types for Gaussian computations.

use thiserror::Error;

/// Errors reported by distributions, kernels and the algorithms built on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalError {
    /// Operand dimensions disagree.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A covariance matrix failed its Cholesky factorization.
    #[error("Covariance matrix is not positive definite")]
    NonPositiveDefinite,

    /// The innovation covariance of a Kalman update is singular.
    #[error("Innovation covariance is singular")]
    SingularInnovation,

    /// Density of a Dirac distribution queried away from its location.
    #[error("Dirac distribution has no density away from its mean")]
    DegenerateDensity,
}
