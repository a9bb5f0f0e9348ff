use crate::error::NormalError;
use crate::scalar::NormalScalar;
use crate::util;
use approx::AbsDiffEq;
use log::trace;
use nalgebra::Cholesky;
use nalgebra::ComplexField;
use nalgebra::DMatrix;
use nalgebra::DVector;
use nalgebra::RealField;
use nalgebra::SymmetricEigen;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use num::Zero;
use statrs::consts::LN_PI;
use statrs::consts::LN_SQRT_2PI;
use statrs::consts::LN_SQRT_2PIE;

fn to_matrix<T: NormalScalar>(a: &Array2<T>) -> DMatrix<T> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

fn to_vector<T: NormalScalar>(b: ArrayView1<T>) -> DVector<T> {
    DVector::from_iterator(b.len(), b.iter().cloned())
}

fn from_matrix<T: NormalScalar>(m: &DMatrix<T>) -> Array2<T> {
    Array2::from_shape_fn(m.shape(), |(i, j)| m[(i, j)])
}

/// Lower triangular `L` with `sigma = L L^H`, for Hermitian positive definite `sigma`
///
/// Only the lower triangle of `sigma` is read.
pub fn cholesky<T: NormalScalar>(sigma: &Array2<T>) -> Result<Array2<T>, NormalError> {
    util::check_square(sigma, sigma.nrows())?;
    let L = match Cholesky::new(to_matrix(sigma)) {
        Some(chol) => chol.unpack(),
        None => {
            trace!("cholesky failed on a {0}x{0} matrix", sigma.nrows());
            return Err(NormalError::NonPositiveDefinite);
        }
    };
    // complex square roots never fail, so a negative pivot shows up as an imaginary diagonal
    let zero = T::RealField::zero();
    if !L
        .diagonal()
        .iter()
        .all(|l| l.real() > zero && l.imaginary().modulus() <= l.real())
    {
        trace!("cholesky pivot of a {0}x{0} matrix is not positive", sigma.nrows());
        return Err(NormalError::NonPositiveDefinite);
    }
    Ok(from_matrix(&L))
}

/// A square root `A` with `sigma = A A^H`, for Hermitian positive semi-definite `sigma`
///
/// Built from the eigendecomposition, so singular covariances are accepted.
/// Eigenvalues below `-eps * d * max |lambda|` are rejected; those within
/// that tolerance of zero contribute nothing.
pub fn semidefinite_sqrt<T: NormalScalar>(sigma: &Array2<T>) -> Result<Array2<T>, NormalError> {
    let d = sigma.nrows();
    util::check_square(sigma, d)?;
    let eps = T::RealField::default_epsilon();
    let eigen =
        SymmetricEigen::try_new(to_matrix(sigma), eps, 0).ok_or(NormalError::NonPositiveDefinite)?;

    let zero = T::RealField::zero();
    let scale = eigen.eigenvalues.iter().fold(zero, |m, &v| m.max(v.modulus()));
    let tol = eps * util::real::<T::RealField>(d as f64) * scale;
    if eigen.eigenvalues.iter().any(|&v| v < -tol) {
        trace!("covariance has an eigenvalue below {:?}", -tol);
        return Err(NormalError::NonPositiveDefinite);
    }
    // eigenvalues within round-off of zero span null directions
    let roots: Array1<T> = eigen
        .eigenvalues
        .iter()
        .map(|&v| if v > tol { T::from_real(v.sqrt()) } else { T::zero() })
        .collect();
    Ok(from_matrix(&eigen.eigenvectors) * &roots)
}

/// Solves `L x = b` for lower triangular `L`
pub fn forward_substitute<T: NormalScalar>(L: &Array2<T>, b: ArrayView1<T>) -> Result<Array1<T>, NormalError> {
    util::check_square(L, b.len())?;
    to_matrix(L)
        .solve_lower_triangular(&to_vector(b))
        .map(|x| x.iter().cloned().collect())
        .ok_or(NormalError::NonPositiveDefinite)
}

/// Solves `L^H x = b` for lower triangular `L`
pub fn back_substitute<T: NormalScalar>(L: &Array2<T>, b: ArrayView1<T>) -> Result<Array1<T>, NormalError> {
    util::check_square(L, b.len())?;
    to_matrix(L)
        .ad_solve_lower_triangular(&to_vector(b))
        .map(|x| x.iter().cloned().collect())
        .ok_or(NormalError::NonPositiveDefinite)
}

/// `L^{-1} B`
pub fn whiten<T: NormalScalar>(L: &Array2<T>, B: &Array2<T>) -> Result<Array2<T>, NormalError> {
    util::check_square(L, B.nrows())?;
    to_matrix(L)
        .solve_lower_triangular(&to_matrix(B))
        .map(|X| from_matrix(&X))
        .ok_or(NormalError::NonPositiveDefinite)
}

/// Solves `A X = B` where `A = L L^H`
pub fn cholesky_solve<T: NormalScalar>(L: &Array2<T>, B: &Array2<T>) -> Result<Array2<T>, NormalError> {
    util::check_square(L, B.nrows())?;
    let L = to_matrix(L);
    L.solve_lower_triangular(&to_matrix(B))
        .and_then(|Y| L.ad_solve_lower_triangular(&Y))
        .map(|X| from_matrix(&X))
        .ok_or(NormalError::NonPositiveDefinite)
}

/// `ln det(A)` from the Cholesky factor of `A`
pub fn ln_det<T: NormalScalar>(L: &Array2<T>) -> T::RealField {
    let two = util::real::<T::RealField>(2.);
    two * L
        .diag()
        .iter()
        .fold(T::RealField::zero(), |acc, l| acc + l.real().ln())
}

/// Squared Euclidean norm `x^H x`
pub fn sum_sqr<'a, T: NormalScalar>(x: impl IntoIterator<Item = &'a T>) -> T::RealField {
    x.into_iter()
        .fold(T::RealField::zero(), |acc, v| acc + v.modulus_squared())
}

/// `1/2` for real fields, `1` for complex ones: the weight in front of the
/// log-determinant in densities, entropies and divergences
pub fn field_weight<T: NormalScalar>() -> T::RealField {
    if T::IS_REAL {
        util::real(0.5)
    } else {
        util::real(1.)
    }
}

/// Per-dimension log normalizer: `ln(2 pi)` for real fields, `ln(pi)` for complex ones
pub fn ln_normalizer<T: NormalScalar>() -> T::RealField {
    if T::IS_REAL {
        util::real(2. * LN_SQRT_2PI)
    } else {
        util::real(LN_PI)
    }
}

/// Per-dimension entropy constant: `ln(2 pi e)` for real fields, `ln(pi e)` for complex ones
pub fn ln_entropy_constant<T: NormalScalar>() -> T::RealField {
    if T::IS_REAL {
        util::real(2. * LN_SQRT_2PIE)
    } else {
        util::real(LN_PI + 1.)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::max_abs_diff;
    use crate::util::testing::random_covariance;
    use ndarray::array;
    use num::complex::Complex;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_cholesky_reconstructs() {
        let mut rng = StdRng::seed_from_u64(3);
        let sigma = random_covariance(4, &mut rng);
        let L = cholesky(&sigma).unwrap();
        assert!(max_abs_diff(&L.dot(&L.t()), &sigma) < 1e-12);
        for i in 0..4 {
            for j in i + 1..4 {
                assert_eq!(L[[i, j]], 0.);
            }
        }
    }

    #[test]
    fn test_cholesky_hermitian() {
        let sigma = array![
            [Complex::new(4., 0.), Complex::new(1., 2.)],
            [Complex::new(1., -2.), Complex::new(6., 0.)]
        ];
        let L = cholesky(&sigma).unwrap();
        let back = L.dot(&util::hermitian(&L));
        for (a, b) in back.iter().zip(sigma.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
        assert!((L[[0, 0]] - Complex::new(2., 0.)).norm() < 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let sigma = array![[1., 2.], [2., 1.]];
        assert_eq!(cholesky(&sigma), Err(NormalError::NonPositiveDefinite));
        let singular = array![[1., 1.], [1., 1.]];
        assert_eq!(cholesky(&singular), Err(NormalError::NonPositiveDefinite));
        let complex = array![
            [Complex::new(1., 0.), Complex::new(0., 2.)],
            [Complex::new(0., -2.), Complex::new(1., 0.)]
        ];
        assert_eq!(cholesky(&complex), Err(NormalError::NonPositiveDefinite));
        let not_square: Array2<f64> = Array2::zeros((2, 3));
        assert!(matches!(
            cholesky(&not_square),
            Err(NormalError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_cholesky_small_scale() {
        let sigma = array![[2e-17, 1e-17], [1e-17, 3e-17]];
        let L = cholesky(&sigma).unwrap();
        let back = L.dot(&L.t());
        assert!(max_abs_diff(&back, &sigma) < 1e-30);
        assert!((ln_det(&L) - 5e-34_f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_semidefinite_sqrt() {
        let sigma = array![[1., 1., 0.], [1., 1., 0.], [0., 0., 2.]];
        let A = semidefinite_sqrt(&sigma).unwrap();
        assert!(max_abs_diff(&A.dot(&A.t()), &sigma) < 1e-12);
        let zero: Array2<f64> = Array2::zeros((2, 2));
        assert_eq!(semidefinite_sqrt(&zero).unwrap(), zero);
        let tiny = array![[1e-17, 0.], [0., 4e-17]];
        let A = semidefinite_sqrt(&tiny).unwrap();
        assert!(max_abs_diff(&A.dot(&A.t()), &tiny) < 1e-30);
    }

    #[test]
    fn test_semidefinite_sqrt_rejects_indefinite() {
        for sigma in [
            array![[1., 0.], [0., -1.]],
            array![[0., 1.], [1., 0.]],
            array![[0., 1.], [1., 1.]],
        ] {
            assert_eq!(
                semidefinite_sqrt(&sigma),
                Err(NormalError::NonPositiveDefinite),
                "{:?}",
                sigma
            );
        }
    }

    #[test]
    fn test_cholesky_solve_and_ln_det() {
        let a = array![[4., 2.], [2., 3.]];
        let L = cholesky(&a).unwrap();
        let b = array![[8.], [7.]];
        let x = cholesky_solve(&L, &b).unwrap();
        assert!(max_abs_diff(&a.dot(&x), &b) < 1e-12);
        assert!((ln_det(&L) - 8_f64.ln()).abs() < 1e-12);
        let w = whiten(&L, &L).unwrap();
        assert!(max_abs_diff(&w, &Array2::eye(2)) < 1e-12);
        let y = forward_substitute(&L, array![2., 1.].view()).unwrap();
        let z = back_substitute(&L, y.view()).unwrap();
        assert!((a.dot(&z) - array![2., 1.]).iter().all(|e| e.abs() < 1e-12));
    }

    #[test]
    fn test_field_constants() {
        assert_eq!(field_weight::<f64>(), 0.5);
        assert_eq!(field_weight::<Complex<f64>>(), 1.);
        let pi = std::f64::consts::PI;
        assert!((ln_normalizer::<f64>() - (2. * pi).ln()).abs() < 1e-14);
        assert!((ln_normalizer::<Complex<f64>>() - pi.ln()).abs() < 1e-14);
        let e = std::f64::consts::E;
        assert!((ln_entropy_constant::<f64>() - (2. * pi * e).ln()).abs() < 1e-14);
        assert!((ln_entropy_constant::<Complex<f32>>() - (pi * e).ln() as f32).abs() < 1e-6);
    }
}
