//! Repeated-trial statistics.
//!
//! Trials are independent: each gets its own seed (`base_seed + index`), its
//! own scheduler, and its own load profile, so they run on scoped worker
//! threads with nothing shared but the read-only run configuration.

use std::fmt;
use std::thread;

use crate::sim::types::ScheduleError;

/// Mean and population standard deviation of a set of trial outcomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation (divides by `n`).
    pub std_dev: f64,
    /// Number of samples.
    pub samples: usize,
}

impl Moments {
    /// Computes the first two moments of `samples`.
    ///
    /// An empty slice yields all-zero moments.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
                samples: 0,
            };
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: var.sqrt(),
            samples: samples.len(),
        }
    }
}

impl fmt::Display for Moments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} ± {:.4} (n={})", self.mean, self.std_dev, self.samples)
    }
}

/// Runs `trials` samples over `workers` threads and returns them in trial order.
///
/// Trial `i` calls `sample(base_seed.wrapping_add(i))`.
///
/// # Errors
///
/// Returns the error of the lowest-indexed failing trial.
pub fn run_trials<T, F>(
    trials: usize,
    base_seed: u64,
    workers: usize,
    sample: F,
) -> Result<Vec<T>, ScheduleError>
where
    T: Send,
    F: Fn(u64) -> Result<T, ScheduleError> + Sync,
{
    let seed_of = |i: usize| base_seed.wrapping_add(i as u64);
    let workers = workers.clamp(1, trials.max(1));
    if workers == 1 {
        return (0..trials).map(|i| sample(seed_of(i))).collect();
    }

    let chunk = trials.div_ceil(workers);
    let sample = &sample;
    let chunks: Vec<Result<Vec<T>, ScheduleError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let range = (w * chunk).min(trials)..((w + 1) * chunk).min(trials);
                scope.spawn(move || -> Result<Vec<T>, ScheduleError> {
                    range.map(|i| sample(seed_of(i))).collect()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut outcomes = Vec::with_capacity(trials);
    for chunk in chunks {
        outcomes.extend(chunk?);
    }
    Ok(outcomes)
}

/// Runs `trials` samples and reduces them to [`Moments`].
///
/// # Errors
///
/// Propagates the first trial error.
pub fn first_moments<F>(
    trials: usize,
    base_seed: u64,
    workers: usize,
    sample: F,
) -> Result<Moments, ScheduleError>
where
    F: Fn(u64) -> Result<f64, ScheduleError> + Sync,
{
    let samples: Vec<f64> = run_trials(trials, base_seed, workers, sample)?;
    Ok(Moments::from_samples(&samples))
}

/// Evaluates `sample` at every parameter and returns the one with the lowest
/// mean, keeping the first on ties.
///
/// Returns `Ok(None)` when `params` is empty.
///
/// # Errors
///
/// Propagates the first trial error.
pub fn best_over<F>(
    params: &[f64],
    trials: usize,
    base_seed: u64,
    workers: usize,
    sample: F,
) -> Result<Option<(f64, Moments)>, ScheduleError>
where
    F: Fn(f64, u64) -> Result<f64, ScheduleError> + Sync,
{
    let mut best: Option<(f64, Moments)> = None;
    for &param in params {
        let moments = first_moments(trials, base_seed, workers, |seed| sample(param, seed))?;
        if best.is_none_or(|(_, b)| moments.mean < b.mean) {
            best = Some((param, moments));
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moments_of_known_samples() {
        let m = Moments::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(m.mean, 5.0);
        assert_eq!(m.std_dev, 2.0);
        assert_eq!(m.samples, 8);
    }

    #[test]
    fn moments_of_empty_slice() {
        let m = Moments::from_samples(&[]);
        assert_eq!(m.mean, 0.0);
        assert_eq!(m.samples, 0);
    }

    #[test]
    fn parallel_trials_keep_seed_order() {
        let serial = run_trials(17, 100, 1, |seed| Ok(seed)).expect("no errors");
        let parallel = run_trials(17, 100, 4, |seed| Ok(seed)).expect("no errors");
        assert_eq!(serial, parallel);
        assert_eq!(serial.first(), Some(&100));
        assert_eq!(serial.last(), Some(&116));
    }

    #[test]
    fn more_workers_than_trials() {
        let out = run_trials(2, 0, 8, |seed| Ok(seed as f64)).expect("no errors");
        assert_eq!(out, vec![0.0, 1.0]);
        let none: Vec<f64> = run_trials(0, 0, 3, |_| Ok(1.0)).expect("no errors");
        assert!(none.is_empty());
    }

    #[test]
    fn first_failing_trial_wins() {
        let result: Result<Vec<f64>, _> = run_trials(10, 0, 3, |seed| {
            if seed >= 4 {
                Err(ScheduleError::NotScheduled(seed as usize))
            } else {
                Ok(0.0)
            }
        });
        assert_eq!(result, Err(ScheduleError::NotScheduled(4)));
    }

    #[test]
    fn best_over_picks_lowest_mean() {
        let best = best_over(&[3.0, 1.0, 2.0, 1.0], 5, 0, 2, |p, _| Ok((p - 1.0).abs() + 1.0))
            .expect("no errors");
        let (param, moments) = best.expect("non-empty params");
        assert_eq!(param, 1.0);
        assert_eq!(moments.mean, 1.0);
        assert_eq!(moments.std_dev, 0.0);
    }
}
