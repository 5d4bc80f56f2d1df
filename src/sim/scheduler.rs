//! Shared scheduling engine: task-to-slot ledger, load profile, and cost model.

use super::load_profile::LoadProfile;
use super::task::Task;
use super::types::{RunConfig, ScheduleError};

/// Scheduling state for one trial.
///
/// Owns the load profile and the task-to-start-slot ledger. Every ledger
/// entry has its task's load applied to the profile over
/// `[slot, slot + task.slots)`, and removing the entry removes exactly that
/// contribution. A scheduler belongs to a single trial and is discarded once
/// its costs have been read.
#[derive(Debug, Clone)]
pub struct Scheduler<'a> {
    config: &'a RunConfig,
    slots: Vec<Option<usize>>,
    profile: LoadProfile,
}

impl<'a> Scheduler<'a> {
    /// Creates an empty scheduler for `config`.
    pub fn new(config: &'a RunConfig) -> Self {
        Self {
            config,
            slots: vec![None; config.tasks().len()],
            profile: LoadProfile::new(config.total_slots()),
        }
    }

    /// The run configuration this scheduler was built for.
    pub fn config(&self) -> &'a RunConfig {
        self.config
    }

    /// Current aggregate load profile.
    pub fn profile(&self) -> &LoadProfile {
        &self.profile
    }

    /// Whether `task` has a ledger entry.
    pub fn is_scheduled(&self, task: &Task) -> bool {
        matches!(self.slots.get(task.id), Some(Some(_)))
    }

    /// Number of tasks currently scheduled.
    pub fn scheduled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns the first task of the run without a ledger entry, if any.
    pub fn first_unscheduled(&self) -> Option<&'a Task> {
        let config = self.config;
        config.tasks().iter().find(|t| !self.is_scheduled(t))
    }

    /// Start slot of `task`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NotScheduled`] if the task has no entry.
    pub fn slot_of(&self, task: &Task) -> Result<usize, ScheduleError> {
        match self.slots.get(task.id) {
            Some(Some(slot)) => Ok(*slot),
            Some(None) => Err(ScheduleError::NotScheduled(task.id)),
            None => Err(ScheduleError::UnknownTask(task.id)),
        }
    }

    /// Schedules `task` to start at `slot` and applies its load.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::AlreadyScheduled`] if the task has an entry,
    /// or [`ScheduleError::OutOfRange`] if it would run past the horizon.
    pub fn assign(&mut self, task: &Task, slot: usize) -> Result<(), ScheduleError> {
        let entry = self
            .slots
            .get(task.id)
            .ok_or(ScheduleError::UnknownTask(task.id))?;
        if entry.is_some() {
            return Err(ScheduleError::AlreadyScheduled(task.id));
        }
        self.profile.add_load(slot, task.slots, task.power_kw)?;
        self.slots[task.id] = Some(slot);
        Ok(())
    }

    /// Moves `task` to `slot`, retracting its previous contribution first.
    ///
    /// Unscheduled tasks are simply assigned. The new range is checked before
    /// anything is retracted, so on error the scheduler is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::OutOfRange`] if the new range runs past the
    /// horizon, or [`ScheduleError::UnknownTask`] for a foreign task.
    pub fn reassign(&mut self, task: &Task, slot: usize) -> Result<(), ScheduleError> {
        let previous = *self
            .slots
            .get(task.id)
            .ok_or(ScheduleError::UnknownTask(task.id))?;
        self.profile.checked_range(slot, task.slots)?;

        if let Some(old) = previous {
            self.profile.remove_load(old, task.slots, task.power_kw)?;
            self.slots[task.id] = None;
        }
        self.assign(task, slot)
    }

    /// Ramp utility for an instantaneous load.
    ///
    /// `C0` up to the capacity threshold `L`, then `C0 + C1 * (load - L)`.
    pub fn utility_cost(&self, load_kw: f64) -> f64 {
        let cfg = self.config;
        if load_kw <= cfg.capacity_kw() {
            cfg.base_cost()
        } else {
            cfg.base_cost() + cfg.ramp_cost() * (load_kw - cfg.capacity_kw())
        }
    }

    /// Integrates the utility cost over slots `start..=stop`, weighting each
    /// slot by its duration in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidBounds`] unless
    /// `start <= stop < total_slots`.
    pub fn integrate_cost(&self, start: usize, stop: usize) -> Result<f64, ScheduleError> {
        let total_slots = self.config.total_slots();
        if start > stop || stop >= total_slots {
            return Err(ScheduleError::InvalidBounds {
                start,
                stop,
                total_slots,
            });
        }
        let dt = self.config.dt_secs();
        Ok((start..=stop)
            .map(|t| self.utility_cost(self.profile.load_at(t)) * dt)
            .sum())
    }

    /// Cost borne by `task` over its scheduled window.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NotScheduled`] if the task has no entry.
    pub fn task_cost(&self, task: &Task) -> Result<f64, ScheduleError> {
        let slot = self.slot_of(task)?;
        Ok(task.power_kw * self.integrate_cost(slot, slot + task.slots - 1)?)
    }

    /// Global cost: sum of [`Scheduler::task_cost`] over every task of the run.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NotScheduled`] for the first task without an
    /// entry.
    pub fn global_cost(&self) -> Result<f64, ScheduleError> {
        self.config
            .tasks()
            .iter()
            .map(|task| self.task_cost(task))
            .sum()
    }

    /// Peak-to-average ratio of the current load profile.
    pub fn peak_to_average(&self) -> Result<f64, ScheduleError> {
        self.profile.peak_to_average()
    }

    /// Fails with [`ScheduleError::NotScheduled`] unless every task is scheduled.
    pub fn ensure_complete(&self) -> Result<(), ScheduleError> {
        match self.first_unscheduled() {
            Some(task) => Err(ScheduleError::NotScheduled(task.id)),
            None => Ok(()),
        }
    }
}
