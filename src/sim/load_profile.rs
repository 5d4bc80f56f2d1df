//! Per-slot aggregate load accumulator.

use super::types::ScheduleError;

/// Aggregate power load per slot over a fixed horizon.
///
/// Load is added and retracted over contiguous slot ranges. Values can go
/// negative transiently while a caller retracts and re-adds a task, but a
/// committed schedule only ever holds non-negative load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProfile {
    load_kw: Vec<f64>,
}

impl LoadProfile {
    /// Creates an all-zero profile spanning `total_slots` slots.
    pub fn new(total_slots: usize) -> Self {
        Self {
            load_kw: vec![0.0; total_slots],
        }
    }

    /// Number of slots in the horizon.
    pub fn total_slots(&self) -> usize {
        self.load_kw.len()
    }

    /// Adds `amount_kw` to every slot in `[start, start + len)`.
    ///
    /// `amount_kw` may be negative to retract an earlier addition.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::OutOfRange`] if the range ends past the horizon.
    /// The profile is left untouched in that case.
    pub fn add_load(
        &mut self,
        start: usize,
        len: usize,
        amount_kw: f64,
    ) -> Result<(), ScheduleError> {
        let end = self.checked_range(start, len)?;
        for slot in &mut self.load_kw[start..end] {
            *slot += amount_kw;
        }
        Ok(())
    }

    /// Retracts `amount_kw` from every slot in `[start, start + len)`.
    ///
    /// Equivalent to `add_load(start, len, -amount_kw)`.
    pub fn remove_load(
        &mut self,
        start: usize,
        len: usize,
        amount_kw: f64,
    ) -> Result<(), ScheduleError> {
        self.add_load(start, len, -amount_kw)
    }

    /// Returns the end of `[start, start + len)` if it fits in the horizon.
    pub fn checked_range(&self, start: usize, len: usize) -> Result<usize, ScheduleError> {
        match start.checked_add(len) {
            Some(end) if end <= self.load_kw.len() => Ok(end),
            _ => Err(ScheduleError::OutOfRange {
                start,
                end: start.saturating_add(len),
                total_slots: self.load_kw.len(),
            }),
        }
    }

    /// Load at `slot`, or `0.0` for any slot outside the horizon.
    pub fn load_at(&self, slot: usize) -> f64 {
        self.load_kw.get(slot).copied().unwrap_or(0.0)
    }

    /// Load in the slot before `slot`, or `0.0` at the start of the horizon.
    pub fn load_before(&self, slot: usize) -> f64 {
        slot.checked_sub(1).map_or(0.0, |prev| self.load_at(prev))
    }

    /// Per-slot loads in slot order.
    pub fn as_slice(&self) -> &[f64] {
        &self.load_kw
    }

    /// Sum of load over all slots.
    pub fn total_kw(&self) -> f64 {
        self.load_kw.iter().sum()
    }

    /// Highest single-slot load, `0.0` for an empty horizon.
    pub fn peak_kw(&self) -> f64 {
        self.load_kw.iter().copied().fold(0.0_f64, f64::max)
    }

    /// Peak-to-average ratio: `peak / (total / total_slots)`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::ZeroLoad`] when the profile carries no load,
    /// since the average would be zero.
    pub fn peak_to_average(&self) -> Result<f64, ScheduleError> {
        let total = self.total_kw();
        if self.load_kw.is_empty() || total <= 0.0 {
            return Err(ScheduleError::ZeroLoad);
        }
        let average = total / self.load_kw.len() as f64;
        Ok(self.peak_kw() / average)
    }
}
