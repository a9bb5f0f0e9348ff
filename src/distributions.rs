//! Gaussian distributions and their degenerate point-mass limit
use crate::dist_util;
use crate::error::NormalError;
use crate::scalar::NormalScalar;
use crate::util;
use nalgebra::ComplexField;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use num::Zero;
use serde::Deserialize;
use serde::Serialize;

/// Multivariate normal distribution over a real or complex field
///
/// `Dirac` is the zero-covariance limit: all mass at `mean`. It carries no
/// covariance matrix; [`Normal::cov`] synthesizes the zero matrix when asked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Normal<T> {
	Gaussian { mean: Array1<T>, cov: Array2<T> },
	Dirac { mean: Array1<T> },
}

impl<T: NormalScalar> Normal<T> {
	pub fn new(mean: Array1<T>, cov: Array2<T>) -> Result<Self, NormalError> {
		util::check_square(&cov, mean.len())?;
		Ok(Normal::Gaussian { mean, cov })
	}

	/// `N(mean, variance * I)`
	pub fn isotropic(mean: Array1<T>, variance: T::RealField) -> Self {
		let cov = Array2::eye(mean.len()) * T::from_real(variance);
		Normal::Gaussian { mean, cov }
	}

	pub fn dirac(mean: Array1<T>) -> Self {
		Normal::Dirac { mean }
	}

	pub fn mean(&self) -> &Array1<T> {
		match self {
			Normal::Gaussian { mean, .. } | Normal::Dirac { mean } => mean,
		}
	}

	pub fn cov(&self) -> Array2<T> {
		match self {
			Normal::Gaussian { cov, .. } => cov.clone(),
			Normal::Dirac { mean } => Array2::zeros((mean.len(), mean.len())),
		}
	}

	pub fn dim(&self) -> usize {
		self.mean().len()
	}

	pub fn is_dirac(&self) -> bool {
		matches!(self, Normal::Dirac { .. })
	}

	/// Marginal variances, the real diagonal of the covariance
	pub fn var(&self) -> Array1<T::RealField> {
		match self {
			Normal::Gaussian { cov, .. } => cov.diag().mapv(|x| x.real()),
			Normal::Dirac { mean } => Array1::zeros(mean.len()),
		}
	}

	pub fn std(&self) -> Array1<T::RealField> {
		self.var().mapv(|v| v.sqrt())
	}

	/// Checks the stored covariance matches the mean
	pub(crate) fn check(&self) -> Result<(), NormalError> {
		match self {
			Normal::Gaussian { mean, cov } => util::check_square(cov, mean.len()),
			Normal::Dirac { .. } => Ok(()),
		}
	}

	/// Cholesky factor of the covariance; a Dirac has none
	pub(crate) fn cholesky(&self) -> Result<Array2<T>, NormalError> {
		match self {
			Normal::Gaussian { cov, .. } => dist_util::cholesky(cov),
			Normal::Dirac { .. } => Err(NormalError::NonPositiveDefinite),
		}
	}

	/// Log density at `x`
	///
	/// A Dirac has density `+inf` at its mean and none elsewhere.
	pub fn logpdf(&self, x: ArrayView1<T>) -> Result<T::RealField, NormalError> {
		self.check()?;
		util::check_dim(self.dim(), x.len())?;
		match self {
			Normal::Dirac { mean } => {
				if util::coincide(mean.view(), x) {
					Ok(util::real(f64::INFINITY))
				} else {
					Err(NormalError::DegenerateDensity)
				}
			}
			Normal::Gaussian { mean, cov } => {
				let L = dist_util::cholesky(cov)?;
				let dev = &x - mean;
				let maha_dist = dist_util::sum_sqr(dist_util::forward_substitute(&L, dev.view())?.iter());
				let d = util::real::<T::RealField>(mean.len() as f64);
				Ok(-dist_util::field_weight::<T>()
					* (d * dist_util::ln_normalizer::<T>() + dist_util::ln_det(&L) + maha_dist))
			}
		}
	}

	/// Whitened residual `L^{-1} (x - mean)` where `cov = L L^H`
	pub fn residual(&self, x: ArrayView1<T>) -> Result<Array1<T>, NormalError> {
		self.check()?;
		util::check_dim(self.dim(), x.len())?;
		let L = self.cholesky()?;
		let dev = &x - self.mean();
		dist_util::forward_substitute(&L, dev.view())
	}

	/// Differential entropy in nats, zero for a Dirac by convention
	pub fn entropy(&self) -> Result<T::RealField, NormalError> {
		self.check()?;
		match self {
			Normal::Dirac { .. } => Ok(T::RealField::zero()),
			Normal::Gaussian { .. } => {
				let L = self.cholesky()?;
				let d = util::real::<T::RealField>(self.dim() as f64);
				Ok(dist_util::field_weight::<T>()
					* (d * dist_util::ln_entropy_constant::<T>() + dist_util::ln_det(&L)))
			}
		}
	}

	/// `KL(self || other)`
	///
	/// A Dirac diverges infinitely from any Gaussian, and from another Dirac
	/// unless the two coincide. Divergence into a Dirac is undefined and
	/// reported as `NonPositiveDefinite`.
	pub fn kldivergence(&self, other: &Normal<T>) -> Result<T::RealField, NormalError> {
		self.check()?;
		other.check()?;
		util::check_dim(self.dim(), other.dim())?;
		match (self, other) {
			(Normal::Dirac { mean: m1 }, Normal::Dirac { mean: m2 }) => {
				if util::coincide(m1.view(), m2.view()) {
					Ok(T::RealField::zero())
				} else {
					Ok(util::real(f64::INFINITY))
				}
			}
			(Normal::Dirac { .. }, Normal::Gaussian { .. }) => Ok(util::real(f64::INFINITY)),
			(Normal::Gaussian { .. }, Normal::Dirac { .. }) => Err(NormalError::NonPositiveDefinite),
			(Normal::Gaussian { mean: m1, .. }, Normal::Gaussian { mean: m2, .. }) => {
				let L1 = self.cholesky()?;
				let L2 = other.cholesky()?;
				let trace_term = dist_util::sum_sqr(dist_util::whiten(&L2, &L1)?.iter());
				let dev = m2 - m1;
				let maha_dist = dist_util::sum_sqr(dist_util::forward_substitute(&L2, dev.view())?.iter());
				let d = util::real::<T::RealField>(self.dim() as f64);
				Ok(dist_util::field_weight::<T>()
					* (trace_term + maha_dist - d + dist_util::ln_det(&L2) - dist_util::ln_det(&L1)))
			}
		}
	}
}
