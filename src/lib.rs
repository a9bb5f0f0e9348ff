#![allow(non_snake_case)]
//! `markov-kernels` provides multivariate normal distributions, linear-Gaussian
//! Markov kernels, and the algebra that ties them together: marginalizing a
//! kernel through a distribution, inverting it with Bayes' rule, sampling
//! Markov chains, and Kalman filtering and smoothing.
//!
//! Everything is generic over the scalar field, so the same code handles real
//! vectors and circularly-symmetric complex ones. Degenerate point masses are
//! first class: a [`Normal::Dirac`] or [`Kernel::Dirac`] has zero covariance and
//! flows through every operation without a matrix inverse.
//!
//! ```
//! use markov_kernels::{compose, condition_on_observation, Kernel, Normal};
//! use ndarray::array;
//!
//! let prior = Normal::isotropic(array![0., 0.], 1.);
//! let process = Kernel::linear(array![[0.9, 0.], [0.19, 0.9]], array![[0.19, 0.], [0., 0.19]]).unwrap();
//! let measurement = Kernel::linear(array![[1., -1.]], array![[0.1]]).unwrap();
//!
//! let predicted = compose(&prior, &process).unwrap();
//! let (posterior, _) = condition_on_observation(&predicted, &measurement, array![0.5].view()).unwrap();
//! assert!(posterior.var().iter().all(|&v| v < 1.));
//! ```
extern crate nalgebra;
extern crate ndarray;
extern crate ndarray_rand;
extern crate statrs;

pub mod algebra;
mod dist_util;
pub mod distributions;
mod error;
pub mod filter;
pub mod kernels;
pub mod sampler;
pub mod scalar;
mod util;

pub use algebra::{compose, condition_on_observation, invert};
pub use distributions::Normal;
pub use error::NormalError;
pub use filter::{rts_smooth, KalmanFilter};
pub use kernels::{ConditionalMean, Kernel};
pub use sampler::{sample, sample_outputs, sample_path, NormalSampler};
pub use scalar::NormalScalar;

/// Absolute and relative tolerance for deciding that two Dirac locations coincide
pub const DIRAC_TOLERANCE: f64 = 1e-10;

/// Cholesky factorization and triangular solves on ndarray matrices
///
/// Matrices are Hermitian for complex fields; `L^H` is the conjugate transpose.
pub mod linalg {
    pub use crate::dist_util::{
        back_substitute, cholesky, cholesky_solve, forward_substitute, ln_det, semidefinite_sqrt, whiten,
    };
    pub use crate::util::{hermitian, symmetrize};
}
