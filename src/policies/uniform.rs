use rand::{Rng, rngs::StdRng};

use super::types::SchedulingPolicy;
use crate::sim::scheduler::Scheduler;
use crate::sim::types::ScheduleError;

/// Starts every task at a slot drawn uniformly from its feasible window.
///
/// Tasks are independent of each other and of the load already placed.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Uniform;

impl SchedulingPolicy for Uniform {
    fn schedule_tasks(
        &self,
        scheduler: &mut Scheduler<'_>,
        rng: &mut StdRng,
    ) -> Result<(), ScheduleError> {
        let config = scheduler.config();
        for task in config.tasks() {
            let last = task
                .last_start(config.total_slots())
                .ok_or(ScheduleError::OutOfRange {
                    start: 0,
                    end: task.slots,
                    total_slots: config.total_slots(),
                })?;
            scheduler.assign(task, rng.random_range(0..=last))?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Uniform"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::{RunConfig, TaskGroup};
    use rand::SeedableRng;

    #[test]
    fn starts_stay_inside_feasible_window() {
        let cfg = RunConfig::new(8, 1.0, 1.0, 1.0, &[TaskGroup::new(20, 3, 1.0)])
            .expect("config should build");
        let sched = Uniform.run(&cfg, 1).expect("trial should succeed");
        for task in cfg.tasks() {
            let slot = sched.slot_of(task).expect("scheduled");
            assert!(slot <= 5);
        }
    }

    #[test]
    fn full_horizon_task_starts_at_zero() {
        let cfg = RunConfig::new(5, 1.0, 1.0, 1.0, &[TaskGroup::new(1, 5, 2.0)])
            .expect("config should build");
        let mut rng = StdRng::seed_from_u64(0);
        let mut sched = Scheduler::new(&cfg);
        Uniform
            .schedule_tasks(&mut sched, &mut rng)
            .expect("schedule should succeed");
        assert_eq!(sched.slot_of(&cfg.tasks()[0]), Ok(0));
    }
}
