//! Deferrable load description.

/// One deferrable load: a fixed power draw held for a fixed number of slots.
///
/// Tasks are created by [`RunConfig`](super::types::RunConfig), which assigns
/// sequential ids starting at zero. They are never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Task {
    /// Unique identifier, equal to the task's index in the run.
    pub id: usize,
    /// Instantaneous power draw while running (kW, >= 0).
    pub power_kw: f64,
    /// Duration in slots (>= 1).
    pub slots: usize,
}

impl Task {
    /// Creates a task.
    ///
    /// # Panics
    ///
    /// Panics if `slots == 0` or `power_kw` is negative or not finite.
    pub fn new(id: usize, power_kw: f64, slots: usize) -> Self {
        assert!(slots > 0, "task duration must be at least one slot");
        assert!(
            power_kw.is_finite() && power_kw >= 0.0,
            "task power must be finite and >= 0"
        );
        Self {
            id,
            power_kw,
            slots,
        }
    }

    /// Energy demand in kW·slots (`power_kw * slots`).
    pub fn energy_demand(&self) -> f64 {
        self.power_kw * self.slots as f64
    }

    /// Last start slot that keeps the task inside a horizon of `total_slots`.
    ///
    /// Returns `None` when the task does not fit at all.
    pub fn last_start(&self, total_slots: usize) -> Option<usize> {
        total_slots.checked_sub(self.slots)
    }

    /// Duration in seconds for a horizon of `total_slots` spanning `day_length_secs`.
    pub fn duration_secs(&self, total_slots: usize, day_length_secs: f64) -> f64 {
        self.slots as f64 / total_slots as f64 * day_length_secs
    }
}

#[cfg(test)]
mod tests {
    use super::Task;

    #[test]
    fn last_start_leaves_room_for_duration() {
        let task = Task::new(0, 2.0, 3);
        assert_eq!(task.last_start(10), Some(7));
        assert_eq!(task.last_start(3), Some(0));
        assert_eq!(task.last_start(2), None);
    }

    #[test]
    fn duration_scales_with_day_length() {
        let task = Task::new(0, 1.0, 6);
        assert_eq!(task.duration_secs(36, 21_600.0), 3_600.0);
    }

    #[test]
    fn energy_is_power_times_slots() {
        assert_eq!(Task::new(4, 1.5, 4).energy_demand(), 6.0);
    }

    #[test]
    #[should_panic]
    fn zero_duration_panics() {
        Task::new(0, 1.0, 0);
    }
}
