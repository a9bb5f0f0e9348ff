//! Kalman filtering and Rauch-Tung-Striebel smoothing
use crate::algebra::compose;
use crate::algebra::condition_on_observation;
use crate::algebra::invert;
use crate::distributions::Normal;
use crate::error::NormalError;
use crate::kernels::Kernel;
use crate::scalar::NormalScalar;
use crate::util;
use log::debug;
use ndarray::ArrayView1;
use ndarray::ArrayView2;
use std::iter::FusedIterator;

/// Linear-Gaussian state-space model
///
/// `x_0 ~ prior`, `x_t | x_{t-1} ~ process`, `z_t | x_t ~ measurement`.
#[derive(Clone, Debug)]
pub struct KalmanFilter<T> {
    prior: Normal<T>,
    process: Kernel<T>,
    measurement: Kernel<T>,
}

impl<T: NormalScalar> KalmanFilter<T> {
    pub fn new(prior: Normal<T>, process: Kernel<T>, measurement: Kernel<T>) -> Result<Self, NormalError> {
        prior.check()?;
        process.check()?;
        measurement.check()?;
        util::check_dim(prior.dim(), process.input_dim())?;
        util::check_dim(prior.dim(), process.output_dim())?;
        util::check_dim(prior.dim(), measurement.input_dim())?;
        Ok(KalmanFilter {
            prior,
            process,
            measurement,
        })
    }

    pub fn prior(&self) -> &Normal<T> {
        &self.prior
    }

    pub fn process(&self) -> &Kernel<T> {
        &self.process
    }

    pub fn measurement(&self) -> &Kernel<T> {
        &self.measurement
    }

    /// Predict with the process kernel, then update on `z`
    pub fn step(&self, current: &Normal<T>, z: ArrayView1<T>) -> Result<Normal<T>, NormalError> {
        let predicted = compose(current, &self.process)?;
        let (filtered, _) = condition_on_observation(&predicted, &self.measurement, z)?;
        Ok(filtered)
    }

    /// Lazily filters `observations`, yielding one distribution per observation
    ///
    /// The first error is yielded once and ends the run.
    pub fn run<'b, I>(&self, observations: I) -> Filtered<'_, T, I::IntoIter>
    where
        I: IntoIterator<Item = ArrayView1<'b, T>>,
    {
        Filtered {
            filter: self,
            observations: observations.into_iter(),
            state: State::AwaitingObservation(self.prior.clone()),
            t: 0,
        }
    }

    /// Filters every row of `observations`; the first error wins
    pub fn filter(&self, observations: ArrayView2<T>) -> Result<Vec<Normal<T>>, NormalError> {
        self.run(observations.rows()).collect()
    }
}

enum State<T> {
    AwaitingObservation(Normal<T>),
    Done,
}

/// Iterator returned by [`KalmanFilter::run`]
pub struct Filtered<'a, T, I> {
    filter: &'a KalmanFilter<T>,
    observations: I,
    state: State<T>,
    t: usize,
}

impl<'a, 'b, T, I> Iterator for Filtered<'a, T, I>
where
    T: NormalScalar + 'b,
    I: Iterator<Item = ArrayView1<'b, T>>,
{
    type Item = Result<Normal<T>, NormalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = match &self.state {
            State::AwaitingObservation(current) => current,
            State::Done => return None,
        };
        let z = match self.observations.next() {
            Some(z) => z,
            None => {
                self.state = State::Done;
                return None;
            }
        };
        match self.filter.step(current, z) {
            Ok(filtered) => {
                debug!("filtered observation {}", self.t);
                self.t += 1;
                self.state = State::AwaitingObservation(filtered.clone());
                Some(Ok(filtered))
            }
            Err(e) => {
                debug!("filter halted at observation {}: {}", self.t, e);
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}

impl<'a, 'b, T, I> FusedIterator for Filtered<'a, T, I>
where
    T: NormalScalar + 'b,
    I: Iterator<Item = ArrayView1<'b, T>>,
{
}

/// Smoothed marginals from the filtered ones
///
/// Each filtered distribution is inverted against the process kernel and the
/// resulting backward kernel carries the smoothed distribution one step back.
pub fn rts_smooth<T: NormalScalar>(process: &Kernel<T>, filtered: &[Normal<T>]) -> Result<Vec<Normal<T>>, NormalError> {
    let mut next = match filtered.last() {
        Some(last) => last.clone(),
        None => return Ok(Vec::new()),
    };
    let mut smoothed = Vec::with_capacity(filtered.len());
    smoothed.push(next.clone());
    for current in filtered[..filtered.len() - 1].iter().rev() {
        let (_, backward) = invert(current, process)?;
        next = compose(&next, &backward)?;
        smoothed.push(next.clone());
    }
    smoothed.reverse();
    Ok(smoothed)
}
