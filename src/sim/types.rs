//! Core scheduling types: run configuration and engine errors.

use thiserror::Error;
use tracing::warn;

use crate::config::ConfigError;

use super::task::Task;

/// Default simulated day length: six hours, in seconds.
pub const DEFAULT_DAY_LENGTH_SECS: f64 = 6.0 * 3600.0;

/// Upper bound on the number of tasks a run may expand to.
pub const MAX_TASKS: usize = 1 << 20;

/// Errors raised by the load profile and the scheduling engine.
///
/// All of these indicate a broken contract between a policy and the engine,
/// except [`ScheduleError::NotScheduled`], which a caller may see when it
/// queries costs before a policy has completed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("slot range [{start}, {end}) is outside the {total_slots}-slot horizon")]
    OutOfRange {
        start: usize,
        end: usize,
        total_slots: usize,
    },
    #[error("invalid integration bounds [{start}, {stop}] for a {total_slots}-slot horizon")]
    InvalidBounds {
        start: usize,
        stop: usize,
        total_slots: usize,
    },
    #[error("task {0} is already scheduled")]
    AlreadyScheduled(usize),
    #[error("task {0} is not scheduled")]
    NotScheduled(usize),
    #[error("task {0} is not part of this run")]
    UnknownTask(usize),
    #[error("load profile carries no load; peak-to-average ratio is undefined")]
    ZeroLoad,
}

/// A batch of identical tasks, as listed in a settings file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskGroup {
    /// Number of tasks in the group.
    pub count: usize,
    /// Duration of each task in slots.
    pub slots: usize,
    /// Power draw of each task (kW).
    pub power_kw: f64,
}

impl TaskGroup {
    /// Creates a task group.
    pub fn new(count: usize, slots: usize, power_kw: f64) -> Self {
        Self {
            count,
            slots,
            power_kw,
        }
    }
}

/// Immutable parameters of one simulated day.
///
/// Built once per run and shared by reference with every scheduler and
/// policy. Trials running in parallel may share one instance.
///
/// # Examples
///
/// ```
/// use load_shift_sim::sim::types::{RunConfig, TaskGroup};
///
/// let cfg = RunConfig::new(10, 2.0, 1.0, 0.5, &[TaskGroup::new(3, 2, 1.0)]).unwrap();
/// assert_eq!(cfg.tasks().len(), 3);
/// assert_eq!(cfg.tasks()[2].id, 2);
/// ```
#[derive(Debug, Clone)]
pub struct RunConfig {
    total_slots: usize,
    day_length_secs: f64,
    capacity_kw: f64,
    base_cost: f64,
    ramp_cost: f64,
    tasks: Vec<Task>,
}

impl RunConfig {
    /// Creates a run configuration, expanding `groups` into tasks with
    /// sequential ids.
    ///
    /// # Arguments
    ///
    /// * `total_slots` - Number of slots in the horizon (must be > 0)
    /// * `capacity_kw` - Capacity threshold `L` above which the ramp applies
    /// * `base_cost` - Flat cost coefficient `C0` (>= 0)
    /// * `ramp_cost` - Ramp slope `C1` above the threshold (>= 0)
    /// * `groups` - Task groups, expanded in order
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the horizon is empty, a coefficient is
    /// negative, a task is longer than the horizon, or the groups expand to
    /// more than [`MAX_TASKS`] tasks.
    pub fn new(
        total_slots: usize,
        capacity_kw: f64,
        base_cost: f64,
        ramp_cost: f64,
        groups: &[TaskGroup],
    ) -> Result<Self, ConfigError> {
        if total_slots == 0 {
            return Err(ConfigError::new("total_slots", "must be > 0"));
        }
        if !capacity_kw.is_finite() {
            return Err(ConfigError::new("capacity_kw", "must be finite"));
        }
        if !(base_cost.is_finite() && base_cost >= 0.0) {
            return Err(ConfigError::new("base_cost", "must be finite and >= 0"));
        }
        if !(ramp_cost.is_finite() && ramp_cost >= 0.0) {
            return Err(ConfigError::new("ramp_cost", "must be finite and >= 0"));
        }

        let task_count = groups
            .iter()
            .try_fold(0usize, |acc, g| acc.checked_add(g.count))
            .filter(|&n| n <= MAX_TASKS)
            .ok_or_else(|| {
                ConfigError::new("groups", format!("task count exceeds {MAX_TASKS}"))
            })?;

        let mut tasks = Vec::with_capacity(task_count);
        for (i, group) in groups.iter().enumerate() {
            if group.slots == 0 || group.slots > total_slots {
                return Err(ConfigError::new(
                    format!("groups[{i}].slots"),
                    format!("must be in [1, {total_slots}], got {}", group.slots),
                ));
            }
            if !(group.power_kw.is_finite() && group.power_kw >= 0.0) {
                return Err(ConfigError::new(
                    format!("groups[{i}].power_kw"),
                    "must be finite and >= 0",
                ));
            }
            for _ in 0..group.count {
                tasks.push(Task::new(tasks.len(), group.power_kw, group.slots));
            }
        }

        let cfg = Self {
            total_slots,
            day_length_secs: DEFAULT_DAY_LENGTH_SECS,
            capacity_kw,
            base_cost,
            ramp_cost,
            tasks,
        };
        if !cfg.is_non_trivial() {
            warn!(
                energy = cfg.total_energy_demand(),
                capacity_area = cfg.capacity_kw * cfg.total_slots as f64,
                "non-triviality criterion not met: demand fits under the capacity threshold"
            );
        }
        Ok(cfg)
    }

    /// Returns a copy with a different simulated day length.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `secs` is not strictly positive.
    pub fn with_day_length_secs(mut self, secs: f64) -> Result<Self, ConfigError> {
        if !(secs.is_finite() && secs > 0.0) {
            return Err(ConfigError::new("day_length_secs", "must be > 0"));
        }
        self.day_length_secs = secs;
        Ok(self)
    }

    /// Number of slots in the horizon.
    pub fn total_slots(&self) -> usize {
        self.total_slots
    }

    /// Simulated day length in seconds.
    pub fn day_length_secs(&self) -> f64 {
        self.day_length_secs
    }

    /// Duration of one slot in seconds.
    pub fn dt_secs(&self) -> f64 {
        self.day_length_secs / self.total_slots as f64
    }

    /// Capacity threshold `L` (kW).
    pub fn capacity_kw(&self) -> f64 {
        self.capacity_kw
    }

    /// Flat cost coefficient `C0`.
    pub fn base_cost(&self) -> f64 {
        self.base_cost
    }

    /// Ramp slope `C1`.
    pub fn ramp_cost(&self) -> f64 {
        self.ramp_cost
    }

    /// All tasks of the run, ordered by id.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a task by id.
    pub fn task(&self, id: usize) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Sum of all task energy demands (kW·slots).
    pub fn total_energy_demand(&self) -> f64 {
        self.tasks.iter().map(Task::energy_demand).sum()
    }

    /// Whether total demand reaches the capacity area `L * total_slots`.
    pub fn is_non_trivial(&self) -> bool {
        self.total_energy_demand() >= self.capacity_kw * self.total_slots as f64
    }

    /// Constant part of the global cost: `C0 * Σ duration_secs * power_kw`.
    pub fn min_cost(&self) -> f64 {
        self.base_cost
            * self
                .tasks
                .iter()
                .map(|t| t.duration_secs(self.total_slots, self.day_length_secs) * t.power_kw)
                .sum::<f64>()
    }
}
