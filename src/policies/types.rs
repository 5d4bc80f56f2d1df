//! Common types and traits for scheduling policies.

use rand::{SeedableRng, rngs::StdRng};

use crate::sim::scheduler::Scheduler;
use crate::sim::types::{RunConfig, ScheduleError};

use super::aloha::AlohaLike;
use super::game::Game;
use super::time_slackness::TimeSlackness;
use super::uniform::Uniform;

/// Trait defining a demand-response scheduling policy.
///
/// A policy only decides start slots; the [`Scheduler`] it is handed owns
/// the ledger, the load profile and the cost model.
pub trait SchedulingPolicy {
    /// Schedules every task of the scheduler's run exactly once.
    ///
    /// # Arguments
    ///
    /// * `scheduler` - Fresh scheduler for the run; no task is scheduled yet
    /// * `rng` - Random source for this trial
    ///
    /// # Errors
    ///
    /// Propagates engine errors, which indicate a policy bug.
    fn schedule_tasks(
        &self,
        scheduler: &mut Scheduler<'_>,
        rng: &mut StdRng,
    ) -> Result<(), ScheduleError>;

    /// Returns a human-readable name for the policy.
    fn name(&self) -> &'static str;

    /// Runs one trial seeded with `seed` and returns the finished scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NotScheduled`] if the policy left a task
    /// unscheduled, or any engine error raised while scheduling.
    fn run<'a>(
        &self,
        config: &'a RunConfig,
        seed: u64,
    ) -> Result<Scheduler<'a>, ScheduleError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scheduler = Scheduler::new(config);
        self.schedule_tasks(&mut scheduler, &mut rng)?;
        scheduler.ensure_complete()?;
        Ok(scheduler)
    }

    /// Global cost of one trial.
    fn sample_gc(&self, config: &RunConfig, seed: u64) -> Result<f64, ScheduleError> {
        self.run(config, seed)?.global_cost()
    }

    /// Peak-to-average ratio of one trial.
    fn sample_par(&self, config: &RunConfig, seed: u64) -> Result<f64, ScheduleError> {
        self.run(config, seed)?.peak_to_average()
    }
}

/// Policy variant selected at construction time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policy {
    Uniform(Uniform),
    Aloha(AlohaLike),
    TimeSlackness(TimeSlackness),
    Game(Game),
}

impl SchedulingPolicy for Policy {
    fn schedule_tasks(
        &self,
        scheduler: &mut Scheduler<'_>,
        rng: &mut StdRng,
    ) -> Result<(), ScheduleError> {
        match self {
            Policy::Uniform(p) => p.schedule_tasks(scheduler, rng),
            Policy::Aloha(p) => p.schedule_tasks(scheduler, rng),
            Policy::TimeSlackness(p) => p.schedule_tasks(scheduler, rng),
            Policy::Game(p) => p.schedule_tasks(scheduler, rng),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Policy::Uniform(p) => p.name(),
            Policy::Aloha(p) => p.name(),
            Policy::TimeSlackness(p) => p.name(),
            Policy::Game(p) => p.name(),
        }
    }
}
