use rand::{Rng, rngs::StdRng};
use tracing::debug;

use super::types::SchedulingPolicy;
use crate::sim::scheduler::Scheduler;
use crate::sim::types::ScheduleError;

/// ALOHA-like random access over time slots.
///
/// Slots are visited in order. At each slot every pending task starts with
/// probability `prob_safe` if adding its draw to the previous slot's load
/// stays under the capacity threshold, and with `prob_overage` otherwise.
/// A task still pending at its last feasible slot is started there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlohaLike {
    /// Acceptance probability while under the threshold.
    pub prob_safe: f64,
    /// Acceptance probability at or over the threshold.
    pub prob_overage: f64,
}

impl AlohaLike {
    /// Creates an ALOHA-like policy.
    ///
    /// # Panics
    ///
    /// Panics if either probability is outside `[0.0, 1.0]`.
    pub fn new(prob_safe: f64, prob_overage: f64) -> Self {
        assert!((0.0..=1.0).contains(&prob_safe), "prob_safe must be in [0, 1]");
        assert!(
            (0.0..=1.0).contains(&prob_overage),
            "prob_overage must be in [0, 1]"
        );
        Self {
            prob_safe,
            prob_overage,
        }
    }
}

impl SchedulingPolicy for AlohaLike {
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
                let start = if task.last_start(total_slots) == Some(t) {
                    debug!(task = task.id, slot = t, "forced start at deadline");
                    true
                } else {
                    let p = if prev_kw + task.power_kw < capacity_kw {
                        self.prob_safe
                    } else {
                        self.prob_overage
                    };
                    rng.random::<f64>() < p
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
        "ALOHA-like"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::{RunConfig, TaskGroup};

    #[test]
    fn never_safe_task_is_forced_at_last_slot() {
        // 3 kW task against a 1 kW threshold: the safe branch never applies.
        let cfg = RunConfig::new(10, 1.0, 1.0, 1.0, &[TaskGroup::new(1, 4, 3.0)])
            .expect("config should build");
        let policy = AlohaLike::new(1.0, 0.0);
        for seed in 0..20 {
            let sched = policy.run(&cfg, seed).expect("trial should succeed");
            assert_eq!(sched.slot_of(&cfg.tasks()[0]), Ok(6));
        }
    }

    #[test]
    fn always_safe_task_starts_immediately() {
        let cfg = RunConfig::new(10, 5.0, 1.0, 1.0, &[TaskGroup::new(1, 4, 1.0)])
            .expect("config should build");
        let sched = AlohaLike::new(1.0, 0.0)
            .run(&cfg, 0)
            .expect("trial should succeed");
        assert_eq!(sched.slot_of(&cfg.tasks()[0]), Ok(0));
    }

    #[test]
    fn previous_slot_load_is_read_once_per_slot() {
        // Starts at slot 0 only affect load from slot 0 on, so every task
        // sees the same empty previous slot and all start together.
        let cfg = RunConfig::new(6, 2.0, 1.0, 1.0, &[TaskGroup::new(3, 2, 1.5)])
            .expect("config should build");
        let sched = AlohaLike::new(1.0, 0.0)
            .run(&cfg, 9)
            .expect("trial should succeed");
        assert_eq!(sched.slot_of(&cfg.tasks()[0]), Ok(0));
        assert_eq!(sched.slot_of(&cfg.tasks()[1]), Ok(0));
        assert_eq!(sched.slot_of(&cfg.tasks()[2]), Ok(0));
    }

    #[test]
    fn zero_probabilities_still_complete() {
        let cfg = RunConfig::new(12, 2.0, 1.0, 1.0, &[TaskGroup::new(5, 3, 1.0)])
            .expect("config should build");
        let sched = AlohaLike::new(0.0, 0.0)
            .run(&cfg, 4)
            .expect("trial should succeed");
        for task in cfg.tasks() {
            assert_eq!(sched.slot_of(task), Ok(9));
        }
    }
}
