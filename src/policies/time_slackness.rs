use rand::{Rng, rngs::StdRng};
use tracing::debug;

use super::types::SchedulingPolicy;
use crate::sim::scheduler::Scheduler;
use crate::sim::task::Task;
use crate::sim::types::ScheduleError;

/// Exponent of the deadline term; keeps it negligible until late in the window.
const DEADLINE_EXPONENT: i32 = 42;

/// Adaptive acceptance driven by elapsed time and slackness.
///
/// Like [`AlohaLike`](super::aloha::AlohaLike), slots are visited in order and
/// pending tasks may start at each one, but the acceptance probability is the
/// decision density [`TimeSlackness::density`] of the task's reduced time and
/// slackness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSlackness {
    /// Weight of the slack-driven term.
    pub alpha: f64,
}

impl TimeSlackness {
    /// Creates a Time/Slackness policy.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is negative or not finite.
    pub fn new(alpha: f64) -> Self {
        assert!(alpha.is_finite() && alpha >= 0.0, "alpha must be >= 0");
        Self { alpha }
    }

    /// Decision density `r^42 + (1 - r^42) * alpha * (0.1 + 2 * [0 < s < 1])`.
    ///
    /// # Arguments
    ///
    /// * `reduced_time` - Fraction of the task's feasible window elapsed
    /// * `slackness` - Task energy over the remaining capacity area
    pub fn density(&self, reduced_time: f64, slackness: f64) -> f64 {
        let deadline = reduced_time.powi(DEADLINE_EXPONENT);
        let slack_bonus = if slackness > 0.0 && slackness < 1.0 {
            2.0
        } else {
            0.0
        };
        deadline + (1.0 - deadline) * self.alpha * (0.1 + slack_bonus)
    }
}

/// Fraction of the feasible window `[0, last_start]` elapsed at slot `t`.
///
/// A task spanning the whole horizon has a single feasible slot, so its
/// window is over from the start and the reduced time is `1.0`.
pub fn reduced_time(t: usize, last_start: usize) -> f64 {
    if last_start == 0 {
        1.0
    } else {
        t as f64 / last_start as f64
    }
}

/// Task energy over the capacity area left before its last start.
///
/// The area is `(capacity_kw - prev_kw) * (last_start - t)`; when it is not
/// positive the slackness is `0.0`.
pub fn slackness(
    task: &Task,
    capacity_kw: f64,
    prev_kw: f64,
    t: usize,
    last_start: usize,
) -> f64 {
    let remaining_area = (capacity_kw - prev_kw) * (last_start as f64 - t as f64);
    if remaining_area > 0.0 {
        task.energy_demand() / remaining_area
    } else {
        0.0
    }
}

impl SchedulingPolicy for TimeSlackness {
    fn schedule_tasks(
        &self,
        scheduler: &mut Scheduler<'_>,
        rng: &mut StdRng,
    ) -> Result<(), ScheduleError> {
        let config = scheduler.config();
        let total_slots = config.total_slots();
        let capacity_kw = config.capacity_kw();
        let mut pending: Vec<_> = config.tasks().iter().collect();

        for t in 0..total_slots {
            if pending.is_empty() {
                break;
            }
            let prev_kw = scheduler.profile().load_before(t);
            let mut still_pending = Vec::with_capacity(pending.len());

            for task in pending {
                let Some(last_start) = task.last_start(total_slots) else {
                    return Err(ScheduleError::OutOfRange {
                        start: 0,
                        end: task.slots,
                        total_slots,
                    });
                };

                let start = if t >= last_start {
                    debug!(task = task.id, slot = t, "forced start at deadline");
                    true
                } else {
                    let r = reduced_time(t, last_start);
                    let s = slackness(task, capacity_kw, prev_kw, t, last_start);
                    rng.random::<f64>() < self.density(r, s)
                };

                if start {
                    scheduler.assign(task, t)?;
                } else {
                    still_pending.push(task);
                }
            }
            pending = still_pending;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Time/Slackness"
    }
}
