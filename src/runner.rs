//! Policy comparison studies, parameter sweeps, and sample runs.

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::config::{ConfigError, StudyConfig};
use crate::policies::{AlohaLike, Policy, SchedulingPolicy, TimeSlackness};
use crate::sim::load_profile::LoadProfile;
use crate::sim::types::{RunConfig, ScheduleError};
use crate::trials::{self, Moments};

/// Outcome statistics of one policy in a study.
#[derive(Debug, Clone)]
pub struct PolicyReport {
    /// Display label.
    pub label: &'static str,
    /// Evaluated policy.
    pub policy: Policy,
    /// Global cost over all trials.
    pub gc: Moments,
    /// Peak-to-average ratio over the same trials; `None` when no trial
    /// carried any load.
    pub par: Option<Moments>,
}

/// Result of comparing every policy of a study on one run configuration.
#[derive(Debug, Clone)]
pub struct StudyReport {
    /// Number of tasks in the run.
    pub task_count: usize,
    /// Constant part of the global cost; no schedule can do better.
    pub min_cost: f64,
    /// One row per evaluated policy, in study order.
    pub rows: Vec<PolicyReport>,
}

impl fmt::Display for StudyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Policy Comparison ({} tasks) ---", self.task_count)?;
        writeln!(f, "GC floor (min cost):   {:.4}", self.min_cost)?;
        writeln!(
            f,
            "{:<16} {:>7} {:>14} {:>12} {:>8} {:>8}",
            "policy", "trials", "GC mean", "GC std", "PAR", "PAR std"
        )?;
        for (i, row) in self.rows.iter().enumerate() {
            write!(
                f,
                "{:<16} {:>7} {:>14.4} {:>12.4}",
                row.label, row.gc.samples, row.gc.mean, row.gc.std_dev
            )?;
            match &row.par {
                Some(par) => write!(f, " {:>8.3} {:>8.3}", par.mean, par.std_dev)?,
                None => write!(f, " {:>8} {:>8}", "n/a", "n/a")?,
            }
            if i + 1 < self.rows.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Runs every policy of `study` on `run` and collects GC and PAR statistics.
///
/// GC and PAR of a trial come from the same schedule. A trial whose profile
/// carries no load still counts towards GC but has no PAR sample.
///
/// # Errors
///
/// Returns a `RunError` if the study has out-of-range parameters or a trial
/// fails.
pub fn run_study(study: &StudyConfig, run: &RunConfig) -> Result<StudyReport, RunError> {
    let seed = study.study.seed;
    let workers = study.study.workers;
    let mut rows = Vec::new();

    for entry in study.policies()? {
        info!(policy = entry.label, trials = entry.trials, "running policy");
        let policy = entry.policy;
        let outcomes = trials::run_trials(entry.trials, seed, workers, |s| {
            let sched = policy.run(run, s)?;
            let par = match sched.peak_to_average() {
                Ok(par) => Some(par),
                Err(ScheduleError::ZeroLoad) => None,
                Err(e) => return Err(e),
            };
            Ok((sched.global_cost()?, par))
        })?;
        let gc: Vec<f64> = outcomes.iter().map(|o| o.0).collect();
        let par: Vec<f64> = outcomes.iter().filter_map(|o| o.1).collect();
        if par.len() < outcomes.len() {
            warn!(
                policy = entry.label,
                trials_without_load = outcomes.len() - par.len(),
                "peak-to-average ratio undefined for zero-load trials"
            );
        }
        rows.push(PolicyReport {
            label: entry.label,
            policy,
            gc: Moments::from_samples(&gc),
            par: (!par.is_empty()).then(|| Moments::from_samples(&par)),
        });
    }

    Ok(StudyReport {
        task_count: run.tasks().len(),
        min_cost: run.min_cost(),
        rows,
    })
}

/// Policy family whose single parameter is swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    /// ALOHA-like I: the parameter is `prob_safe`, `prob_overage = 0`.
    AlohaI,
    /// ALOHA-like II: the parameter is `prob_safe`, `prob_overage = 0.1 * prob_safe`.
    AlohaII,
    /// Time/Slackness: the parameter is `alpha`.
    TimeSlackness,
}

impl SweepKind {
    /// Available sweep names.
    pub const NAMES: &[&str] = &["aloha", "aloha-ii", "time-slackness"];

    /// Builds the policy for parameter value `param`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `param` is outside the family's domain.
    pub fn policy_at(&self, param: f64) -> Result<Policy, ConfigError> {
        self.check(param)?;
        Ok(self.build(param))
    }

    /// Trials per parameter value: the study's count for the same family.
    pub fn trials_in(&self, study: &StudyConfig) -> usize {
        match self {
            SweepKind::AlohaI => study.aloha.trials,
            SweepKind::AlohaII => study.aloha_ii.trials,
            SweepKind::TimeSlackness => study.time_slackness.trials,
        }
    }

    fn check(&self, param: f64) -> Result<(), ConfigError> {
        match self {
            SweepKind::AlohaI | SweepKind::AlohaII if !(0.0..=1.0).contains(&param) => {
                Err(ConfigError::new(
                    "sweep.param",
                    format!("probability {param} outside [0.0, 1.0]"),
                ))
            }
            SweepKind::TimeSlackness if !(param.is_finite() && param >= 0.0) => Err(
                ConfigError::new("sweep.param", format!("alpha {param} must be >= 0")),
            ),
            _ => Ok(()),
        }
    }

    /// Caller has checked `param`.
    fn build(&self, param: f64) -> Policy {
        match self {
            SweepKind::AlohaI => Policy::Aloha(AlohaLike::new(param, 0.0)),
            SweepKind::AlohaII => Policy::Aloha(AlohaLike::new(param, 0.1 * param)),
            SweepKind::TimeSlackness => Policy::TimeSlackness(TimeSlackness::new(param)),
        }
    }
}

impl FromStr for SweepKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aloha" => Ok(SweepKind::AlohaI),
            "aloha-ii" => Ok(SweepKind::AlohaII),
            "time-slackness" => Ok(SweepKind::TimeSlackness),
            _ => Err(ConfigError::new(
                "sweep",
                format!(
                    "unknown policy \"{s}\", available: {}",
                    SweepKind::NAMES.join(", ")
                ),
            )),
        }
    }
}

/// Default sweep grid: `0.0..=1.0` in steps of `0.025`.
pub fn default_grid() -> Vec<f64> {
    (0..=40).map(|i| f64::from(i) * 0.025).collect()
}

/// GC statistics at one parameter value of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    /// Parameter value.
    pub param: f64,
    /// Global cost statistics.
    pub gc: Moments,
}

/// Errors from studies and sweeps, which can fail on parameters or on trials.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Evaluates the global cost of `kind` at every parameter of `params`.
///
/// # Errors
///
/// Returns a `RunError` if a parameter is out of domain or a trial fails.
pub fn sweep(
    run: &RunConfig,
    kind: SweepKind,
    params: &[f64],
    trials: usize,
    seed: u64,
    workers: usize,
) -> Result<Vec<SweepPoint>, RunError> {
    let mut points = Vec::with_capacity(params.len());
    for &param in params {
        let policy = kind.policy_at(param)?;
        let gc = trials::first_moments(trials, seed, workers, |s| policy.sample_gc(run, s))?;
        info!(param, gc_mean = gc.mean, "sweep point");
        points.push(SweepPoint { param, gc });
    }
    Ok(points)
}

/// Finds the parameter of `kind` with the lowest mean global cost.
///
/// Returns `Ok(None)` when `params` is empty.
///
/// # Errors
///
/// Returns a `RunError` if a parameter is out of domain or a trial fails.
pub fn tune(
    run: &RunConfig,
    kind: SweepKind,
    params: &[f64],
    trials: usize,
    seed: u64,
    workers: usize,
) -> Result<Option<(f64, Moments)>, RunError> {
    for &param in params {
        kind.check(param)?;
    }
    let best = trials::best_over(params, trials, seed, workers, |param, s| {
        kind.build(param).sample_gc(run, s)
    })?;
    if let Some((param, gc)) = &best {
        info!(param, gc_mean = gc.mean, "best parameter");
    }
    Ok(best)
}

/// Schedules `run` once with `policy` and returns the resulting load profile.
///
/// # Errors
///
/// Propagates the trial error.
pub fn sample_profile(
    run: &RunConfig,
    policy: &Policy,
    seed: u64,
) -> Result<LoadProfile, ScheduleError> {
    Ok(policy.run(run, seed)?.profile().clone())
}
