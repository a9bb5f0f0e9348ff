use crate::error::NormalError;
use crate::scalar::NormalScalar;
use crate::DIRAC_TOLERANCE;
use nalgebra::ComplexField;
use nalgebra::RealField;
use ndarray::Array2;
use ndarray::ArrayView1;
use num::Zero;

/// Conjugate transpose
pub fn hermitian<T: NormalScalar>(a: &Array2<T>) -> Array2<T> {
    a.t().mapv(|x| x.conjugate())
}

/// Hermitian part `(A + A^H) / 2`, removes round-off asymmetry from covariances
pub fn symmetrize<T: NormalScalar>(a: Array2<T>) -> Array2<T> {
    let half = T::from_real(real(0.5));
    (&a + &hermitian(&a)) * half
}

pub fn check_dim(expected: usize, got: usize) -> Result<(), NormalError> {
    if expected != got {
        return Err(NormalError::DimensionMismatch { expected, got });
    }
    Ok(())
}

/// Checks that `a` is a `dim` x `dim` matrix
pub fn check_square<T>(a: &Array2<T>, dim: usize) -> Result<(), NormalError> {
    let (rows, cols) = a.dim();
    check_dim(dim, rows)?;
    check_dim(dim, cols)
}

pub fn real<R: RealField>(x: f64) -> R {
    nalgebra::convert(x)
}

/// Whether `x` and `y` agree to within `DIRAC_TOLERANCE`, relative to their magnitude
pub fn coincide<T: NormalScalar>(x: ArrayView1<T>, y: ArrayView1<T>) -> bool {
    if x.len() != y.len() {
        return false;
    }
    let zero = T::RealField::zero();
    let scale = x
        .iter()
        .chain(y.iter())
        .fold(zero, |m, v| m.max(v.modulus()));
    let gap = x
        .iter()
        .zip(y.iter())
        .fold(zero, |m, (&a, &b)| m.max((a - b).modulus()));
    gap <= real::<T::RealField>(DIRAC_TOLERANCE) * (real::<T::RealField>(1.) + scale)
}
