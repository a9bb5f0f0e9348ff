//! Linear-Gaussian conditional distributions
use crate::distributions::Normal;
use crate::error::NormalError;
use crate::scalar::NormalScalar;
use crate::util;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use serde::Deserialize;
use serde::Serialize;

/// Conditional distribution of an output `y` given an input `x`
///
/// `LinearGaussian` is `y | x ~ N(slope x + intercept, cov)`, `Dirac` is the
/// deterministic map `y = slope x + intercept`. A missing intercept is zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Kernel<T> {
    LinearGaussian {
        slope: Array2<T>,
        intercept: Option<Array1<T>>,
        cov: Array2<T>,
    },
    Dirac {
        slope: Array2<T>,
        intercept: Option<Array1<T>>,
    },
}

/// The affine map `x -> slope x + intercept` of a kernel
#[derive(Clone, Copy, Debug)]
pub struct ConditionalMean<'a, T> {
    slope: &'a Array2<T>,
    intercept: Option<&'a Array1<T>>,
}

impl<'a, T: NormalScalar> ConditionalMean<'a, T> {
    pub fn eval(&self, x: ArrayView1<T>) -> Result<Array1<T>, NormalError> {
        util::check_dim(self.slope.ncols(), x.len())?;
        let y = self.slope.dot(&x);
        Ok(match self.intercept {
            Some(b) => y + b,
            None => y,
        })
    }

    pub fn slope(&self) -> &'a Array2<T> {
        self.slope
    }

    pub fn intercept(&self) -> Option<&'a Array1<T>> {
        self.intercept
    }
}

impl<T: NormalScalar> Kernel<T> {
    pub fn linear(slope: Array2<T>, cov: Array2<T>) -> Result<Self, NormalError> {
        util::check_square(&cov, slope.nrows())?;
        Ok(Kernel::LinearGaussian {
            slope,
            intercept: None,
            cov,
        })
    }

    pub fn affine(slope: Array2<T>, intercept: Array1<T>, cov: Array2<T>) -> Result<Self, NormalError> {
        util::check_dim(slope.nrows(), intercept.len())?;
        util::check_square(&cov, slope.nrows())?;
        Ok(Kernel::LinearGaussian {
            slope,
            intercept: Some(intercept),
            cov,
        })
    }

    pub fn dirac(slope: Array2<T>) -> Self {
        Kernel::Dirac {
            slope,
            intercept: None,
        }
    }

    pub fn dirac_affine(slope: Array2<T>, intercept: Array1<T>) -> Result<Self, NormalError> {
        util::check_dim(slope.nrows(), intercept.len())?;
        Ok(Kernel::Dirac {
            slope,
            intercept: Some(intercept),
        })
    }

    pub fn slope(&self) -> &Array2<T> {
        match self {
            Kernel::LinearGaussian { slope, .. } | Kernel::Dirac { slope, .. } => slope,
        }
    }

    pub fn intercept(&self) -> Option<&Array1<T>> {
        match self {
            Kernel::LinearGaussian { intercept, .. } | Kernel::Dirac { intercept, .. } => {
                intercept.as_ref()
            }
        }
    }

    pub fn input_dim(&self) -> usize {
        self.slope().ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.slope().nrows()
    }

    pub fn is_dirac(&self) -> bool {
        matches!(self, Kernel::Dirac { .. })
    }

    pub fn mean(&self) -> ConditionalMean<'_, T> {
        ConditionalMean {
            slope: self.slope(),
            intercept: self.intercept(),
        }
    }

    /// Conditional covariance, the zero matrix for a deterministic kernel
    pub fn cov(&self) -> Array2<T> {
        match self {
            Kernel::LinearGaussian { cov, .. } => cov.clone(),
            Kernel::Dirac { slope, .. } => Array2::zeros((slope.nrows(), slope.nrows())),
        }
    }

    /// Checks the stored parameters agree on the output dimension
    pub(crate) fn check(&self) -> Result<(), NormalError> {
        if let Some(b) = self.intercept() {
            util::check_dim(self.output_dim(), b.len())?;
        }
        match self {
            Kernel::LinearGaussian { cov, .. } => util::check_square(cov, self.output_dim()),
            Kernel::Dirac { .. } => Ok(()),
        }
    }

    /// The distribution of the output given input `x`
    pub fn condition(&self, x: ArrayView1<T>) -> Result<Normal<T>, NormalError> {
        self.check()?;
        let mean = self.mean().eval(x)?;
        Ok(match self {
            Kernel::LinearGaussian { cov, .. } => Normal::Gaussian {
                mean,
                cov: cov.clone(),
            },
            Kernel::Dirac { .. } => Normal::Dirac { mean },
        })
    }
}
