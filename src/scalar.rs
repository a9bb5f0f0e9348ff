//! Scalar fields normal distributions are defined over.
//!
//! Real vectors use the usual multivariate normal; complex vectors use the
//! circularly-symmetric complex normal, whose real and imaginary parts are
//! independent with half the variance each. Conjugation, real parts and
//! moduli come from [`nalgebra::ComplexField`]; this trait adds what the
//! field's noise source and normalizing constants need.
use nalgebra::ComplexField;
use ndarray::LinalgScalar;
use ndarray::ScalarOperand;
use ndarray_rand::rand_distr::StandardNormal;
use num::complex::Complex;
use num::traits::FloatConst;
use num::Float;
use rand::prelude::Distribution;
use rand::Rng;
use std::fmt::Debug;

/// Element type of the random vectors: `f32`, `f64`, `Complex<f32>` or `Complex<f64>`.
pub trait NormalScalar: ComplexField + LinalgScalar + ScalarOperand + PartialEq + Debug {
    /// Standard normal draws in this field, unit expected squared modulus.
    type Noise: Distribution<Self>;

    const IS_REAL: bool;

    fn noise() -> Self::Noise;
}

impl NormalScalar for f32 {
    type Noise = StandardNormal;
    const IS_REAL: bool = true;

    fn noise() -> StandardNormal {
        StandardNormal
    }
}

impl NormalScalar for f64 {
    type Noise = StandardNormal;
    const IS_REAL: bool = true;

    fn noise() -> StandardNormal {
        StandardNormal
    }
}

/// Circularly-symmetric complex standard normal: real and imaginary parts are
/// independent `N(0, 1/2)`.
#[derive(Clone, Copy, Debug)]
pub struct CircularStandardNormal;

impl<T> Distribution<Complex<T>> for CircularStandardNormal
where
    T: Float + FloatConst,
    StandardNormal: Distribution<T>,
{
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Complex<T> {
        let re: T = StandardNormal.sample(rng);
        let im: T = StandardNormal.sample(rng);
        Complex::new(re, im) * T::FRAC_1_SQRT_2()
    }
}

impl NormalScalar for Complex<f32> {
    type Noise = CircularStandardNormal;
    const IS_REAL: bool = false;

    fn noise() -> CircularStandardNormal {
        CircularStandardNormal
    }
}

impl NormalScalar for Complex<f64> {
    type Noise = CircularStandardNormal;
    const IS_REAL: bool = false;

    fn noise() -> CircularStandardNormal {
        CircularStandardNormal
    }
}
