//! Marginalization and Bayes inversion of linear-Gaussian kernels
use crate::dist_util;
use crate::distributions::Normal;
use crate::error::NormalError;
use crate::kernels::Kernel;
use crate::scalar::NormalScalar;
use crate::util;
use log::trace;
use ndarray::Array2;
use ndarray::ArrayView1;

/// Chapman-Kolmogorov: the distribution of `y` when `x ~ prior` and `y | x ~ kernel`
pub fn compose<T: NormalScalar>(prior: &Normal<T>, kernel: &Kernel<T>) -> Result<Normal<T>, NormalError> {
    prior.check()?;
    kernel.check()?;
    util::check_dim(kernel.input_dim(), prior.dim())?;
    let mean = kernel.mean().eval(prior.mean().view())?;
    match (prior, kernel) {
        (Normal::Dirac { .. }, Kernel::Dirac { .. }) => Ok(Normal::Dirac { mean }),
        (Normal::Dirac { .. }, Kernel::LinearGaussian { cov: Q, .. }) => Ok(Normal::Gaussian {
            mean,
            cov: Q.clone(),
        }),
        (Normal::Gaussian { cov: Sigma, .. }, _) => {
            let Phi = kernel.slope();
            let propagated = Phi.dot(Sigma).dot(&util::hermitian(Phi));
            let cov = match kernel {
                Kernel::LinearGaussian { cov: Q, .. } => propagated + Q,
                Kernel::Dirac { .. } => propagated,
            };
            Ok(Normal::Gaussian {
                mean,
                cov: util::symmetrize(cov),
            })
        }
    }
}

/// Bayes inversion of `kernel` against `prior`
///
/// Returns the marginal of the output together with the backward kernel
/// `x | y`. For a Gaussian prior the backward kernel has slope
/// `G = Sigma C^H S^{-1}`, intercept `mu - G (C mu + b)`, and the Joseph-form
/// posterior covariance `(I - G C) Sigma (I - G C)^H + G R G^H`. For a Dirac
/// prior it maps every output to the prior point.
pub fn invert<T: NormalScalar>(prior: &Normal<T>, kernel: &Kernel<T>) -> Result<(Normal<T>, Kernel<T>), NormalError> {
    let marginal = compose(prior, kernel)?;
    let backward = match prior {
        Normal::Dirac { mean } => Kernel::Dirac {
            slope: Array2::zeros((prior.dim(), kernel.output_dim())),
            intercept: Some(mean.clone()),
        },
        Normal::Gaussian { mean: mu, cov: Sigma } => {
            let C = kernel.slope();
            let S = marginal.cov();
            let L_S = dist_util::cholesky(&S).map_err(|_| {
                trace!("innovation covariance of dimension {} is singular", S.nrows());
                NormalError::SingularInnovation
            })?;
            // S and Sigma are Hermitian, so G^H = S^{-1} C Sigma
            let gain = util::hermitian(&dist_util::cholesky_solve(&L_S, &C.dot(Sigma))?);

            let i_gc = Array2::eye(prior.dim()) - gain.dot(C);
            let joseph = i_gc.dot(Sigma).dot(&util::hermitian(&i_gc));
            let cov = match kernel {
                Kernel::LinearGaussian { cov: R, .. } => joseph + gain.dot(R).dot(&util::hermitian(&gain)),
                Kernel::Dirac { .. } => joseph,
            };
            let intercept = mu - &gain.dot(marginal.mean());
            Kernel::LinearGaussian {
                slope: gain,
                intercept: Some(intercept),
                cov: util::symmetrize(cov),
            }
        }
    };
    Ok((marginal, backward))
}

/// Kalman update: the posterior of `x` after observing `z` from `kernel`,
/// along with the backward kernel it was read from
pub fn condition_on_observation<T: NormalScalar>(
    prior: &Normal<T>,
    kernel: &Kernel<T>,
    z: ArrayView1<T>,
) -> Result<(Normal<T>, Kernel<T>), NormalError> {
    util::check_dim(kernel.output_dim(), z.len())?;
    let (_, backward) = invert(prior, kernel)?;
    let posterior = backward.condition(z)?;
    Ok((posterior, backward))
}
