//! Realizations of distributions and of Markov chains driven by kernels
use crate::dist_util;
use crate::distributions::Normal;
use crate::error::NormalError;
use crate::kernels::Kernel;
use crate::scalar::NormalScalar;
use crate::util;
use ndarray::Array;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use ndarray_rand::RandomExt;
use rand::prelude::Distribution;
use rand::Rng;

/// A distribution with its covariance already factored, for repeated draws
#[derive(Clone, Debug)]
pub struct NormalSampler<T> {
    loc: Array1<T>,
    factor: Option<Array2<T>>,
}

impl<T: NormalScalar> Normal<T> {
    /// Factors the covariance once; positive semi-definite covariances are accepted
    pub fn sampler(&self) -> Result<NormalSampler<T>, NormalError> {
        self.check()?;
        let factor = match self {
            Normal::Gaussian { cov, .. } => Some(dist_util::semidefinite_sqrt(cov)?),
            Normal::Dirac { .. } => None,
        };
        Ok(NormalSampler {
            loc: self.mean().clone(),
            factor,
        })
    }
}

impl<T: NormalScalar> Distribution<Array1<T>> for NormalSampler<T> {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<T> {
        match &self.factor {
            Some(lower) => {
                let ind_sample: Array1<T> = Array::random_using(self.loc.len(), T::noise(), rng);
                &self.loc + &lower.dot(&ind_sample)
            }
            None => self.loc.clone(),
        }
    }
}

/// One draw from `dist`. A Dirac consumes no randomness.
pub fn sample<T: NormalScalar, R: Rng + ?Sized>(dist: &Normal<T>, rng: &mut R) -> Result<Array1<T>, NormalError> {
    Ok(dist.sampler()?.sample(rng))
}

struct KernelSampler<'a, T> {
    kernel: &'a Kernel<T>,
    factor: Option<Array2<T>>,
}

impl<'a, T: NormalScalar> KernelSampler<'a, T> {
    fn new(kernel: &'a Kernel<T>) -> Result<Self, NormalError> {
        kernel.check()?;
        let factor = match kernel {
            Kernel::LinearGaussian { cov, .. } => Some(dist_util::semidefinite_sqrt(cov)?),
            Kernel::Dirac { .. } => None,
        };
        Ok(KernelSampler { kernel, factor })
    }

    fn sample<R: Rng + ?Sized>(&self, x: ArrayView1<T>, rng: &mut R) -> Result<Array1<T>, NormalError> {
        let mean = self.kernel.mean().eval(x)?;
        Ok(match &self.factor {
            Some(lower) => {
                let ind_sample: Array1<T> = Array::random_using(mean.len(), T::noise(), rng);
                mean + lower.dot(&ind_sample)
            }
            None => mean,
        })
    }
}

/// Path of the Markov chain `x_0 ~ initial`, `x_t ~ kernel(x_{t-1})`
///
/// Row `t` of the result is `x_t`, so there are `n + 1` rows.
pub fn sample_path<T: NormalScalar, R: Rng + ?Sized>(
    initial: &Normal<T>,
    kernel: &Kernel<T>,
    rng: &mut R,
    n: usize,
) -> Result<Array2<T>, NormalError> {
    util::check_dim(kernel.input_dim(), kernel.output_dim())?;
    util::check_dim(kernel.input_dim(), initial.dim())?;
    let step = KernelSampler::new(kernel)?;

    let mut path = Array2::zeros((n + 1, initial.dim()));
    path.row_mut(0).assign(&sample(initial, rng)?);
    for t in 1..=n {
        let next = step.sample(path.row(t - 1), rng)?;
        path.row_mut(t).assign(&next);
    }
    Ok(path)
}

/// One draw from `kernel` for every row of `xs`, e.g. noisy measurements of a sampled path
pub fn sample_outputs<T: NormalScalar, R: Rng + ?Sized>(
    kernel: &Kernel<T>,
    xs: ArrayView2<T>,
    rng: &mut R,
) -> Result<Array2<T>, NormalError> {
    util::check_dim(kernel.input_dim(), xs.ncols())?;
    let step = KernelSampler::new(kernel)?;
    let mut ys = Array2::zeros((xs.nrows(), kernel.output_dim()));
    for (x, mut y) in xs.rows().into_iter().zip(ys.rows_mut()) {
        y.assign(&step.sample(x, rng)?);
    }
    Ok(ys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::max_abs_diff;
    use crate::util::testing::random_covariance;
    use ndarray::array;
    use ndarray_stats::CorrelationExt;
    use num::complex::Complex;
    use rand::rngs::StdRng;
    use rand::RngCore;
    use rand::SeedableRng;

    #[test]
    fn test_path_reproducible() {
        let initial = Normal::isotropic(array![0., 0.], 1.);
        let kernel = Kernel::linear(array![[0.9, 0.], [0.19, 0.9]], Array2::eye(2) * 0.19).unwrap();
        let a = sample_path(&initial, &kernel, &mut StdRng::seed_from_u64(42), 10).unwrap();
        let b = sample_path(&initial, &kernel, &mut StdRng::seed_from_u64(42), 10).unwrap();
        assert_eq!(a.dim(), (11, 2));
        assert_eq!(a, b);
        let c = sample_path(&initial, &kernel, &mut StdRng::seed_from_u64(43), 10).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_dirac_path_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(1);
        let path = sample_path(&Normal::dirac(array![1.]), &Kernel::dirac(array![[2.]]), &mut rng, 3).unwrap();
        assert_eq!(path, array![[1.], [2.], [4.], [8.]]);
        assert_eq!(rng.next_u64(), StdRng::seed_from_u64(1).next_u64());
    }

    #[test]
    fn test_dirac_sample_consumes_no_randomness() {
        let mut rng = StdRng::seed_from_u64(8);
        let x = sample(&Normal::dirac(array![3., 4.]), &mut rng).unwrap();
        assert_eq!(x, array![3., 4.]);
        assert_eq!(rng.next_u64(), StdRng::seed_from_u64(8).next_u64());
    }

    #[test]
    fn test_empirical_covariance() {
        let mut rng = StdRng::seed_from_u64(17);
        let d = 3;
        let cov = random_covariance(d, &mut rng);
        let dist = Normal::new(array![1., -2., 0.5], cov.clone()).unwrap();
        let sampler = dist.sampler().unwrap();
        let n = 40000;
        let mut draws = Array2::zeros((n, d));
        for mut row in draws.rows_mut() {
            row.assign(&sampler.sample(&mut rng));
        }
        let empirical = draws.t().cov(1.).unwrap();
        let scale = cov.diag().fold(0_f64, |m, &v| m.max(v));
        assert!(max_abs_diff(&empirical, &cov) < 0.05 * scale);
        let mean = draws.mean_axis(ndarray::Axis(0)).unwrap();
        assert!((&mean - dist.mean()).iter().all(|g| g.abs() < 0.05 * scale.sqrt()));
    }

    #[test]
    fn test_semidefinite_sampling() {
        let dist: Normal<f64> = Normal::new(array![0., 0.], array![[1., 1.], [1., 1.]]).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..10 {
            let x = sample(&dist, &mut rng).unwrap();
            assert!((x[0] - x[1]).abs() < 1e-12, "{:?}", x);
        }
    }

    #[test]
    fn test_indefinite_covariance_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let swap = Normal::new(array![0., 0.], array![[0., 1.], [1., 0.]]).unwrap();
        assert_eq!(sample(&swap, &mut rng), Err(NormalError::NonPositiveDefinite));
        let skew = Normal::new(array![0., 0.], array![[0., 1.], [1., 1.]]).unwrap();
        assert!(matches!(skew.sampler(), Err(NormalError::NonPositiveDefinite)));
        let kernel = Kernel::linear(Array2::eye(2), array![[0., 1.], [1., 0.]]).unwrap();
        assert_eq!(
            sample_path(&Normal::dirac(array![0., 0.]), &kernel, &mut rng, 1),
            Err(NormalError::NonPositiveDefinite)
        );
    }

    #[test]
    fn test_small_scale_sampling() {
        let mut rng = StdRng::seed_from_u64(12);
        let variance = 1e-17;
        let sampler = Normal::<f64>::isotropic(array![0., 0.], variance).sampler().unwrap();
        let n = 20000;
        let total: f64 = (0..n)
            .map(|_| {
                let x: Array1<f64> = sampler.sample(&mut rng);
                x.dot(&x)
            })
            .sum();
        let ratio = total / (2. * n as f64) / variance;
        assert!((ratio - 1.).abs() < 0.05, "variance ratio {}", ratio);
    }

    #[test]
    fn test_complex_residual_power() {
        let mut rng = StdRng::seed_from_u64(21);
        let zero = Complex::new(0., 0.);
        let cov = array![
            [Complex::new(2., 0.), Complex::new(0.5, 0.5)],
            [Complex::new(0.5, -0.5), Complex::new(1., 0.)]
        ];
        let dist = Normal::new(array![zero, Complex::new(1., -1.)], cov).unwrap();
        let sampler = dist.sampler().unwrap();
        let n = 20000;
        let total: f64 = (0..n)
            .map(|_| {
                let r = dist.residual(sampler.sample(&mut rng).view()).unwrap();
                r.iter().map(|z| z.norm_sqr()).sum::<f64>()
            })
            .sum();
        let power = total / n as f64;
        assert!((power - 2.).abs() < 0.06, "residual power {}", power);
    }

    #[test]
    fn test_sample_outputs() {
        let mut rng = StdRng::seed_from_u64(6);
        let xs = array![[1., 2.], [3., 4.], [5., 6.]];
        let exact = sample_outputs(&Kernel::dirac(array![[1., -1.]]), xs.view(), &mut rng).unwrap();
        assert_eq!(exact, array![[-1.], [-1.], [-1.]]);
        let noisy = Kernel::linear(array![[1., -1.]], array![[0.1]]).unwrap();
        assert_eq!(sample_outputs(&noisy, xs.view(), &mut rng).unwrap().dim(), (3, 1));
        assert!(matches!(
            sample_outputs(&noisy, xs.t(), &mut rng),
            Err(NormalError::DimensionMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_path_requires_square_kernel() {
        let mut rng = StdRng::seed_from_u64(0);
        let kernel = Kernel::dirac(array![[1., 0.]]);
        assert!(matches!(
            sample_path(&Normal::dirac(array![0., 0.]), &kernel, &mut rng, 2),
            Err(NormalError::DimensionMismatch { .. })
        ));
    }
}
