//! Best-response dynamics between tasks acting as self-interested players.
//!
//! Each task minimises the power-weighted overlap between its own window and
//! everyone else's. A move is evaluated against a private copy of the start
//! slots and only then committed to the scheduler with
//! [`Scheduler::reassign`].

use rand::{Rng, rngs::StdRng};
use tracing::debug;

use super::types::SchedulingPolicy;
use crate::sim::scheduler::Scheduler;
use crate::sim::task::Task;
use crate::sim::types::ScheduleError;

/// Window costs within this relative distance of the minimum count as ties.
const TIE_TOLERANCE: f64 = 1e-9;

/// Iterated best response.
///
/// Every task plays once in id order, then `rounds_ratio * task_count` plays
/// go to tasks picked uniformly at random.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Game {
    /// Extra random plays per task after the first full round.
    pub rounds_ratio: usize,
}

impl Game {
    /// Creates a game with `rounds_ratio` extra plays per task.
    pub fn new(rounds_ratio: usize) -> Self {
        Self { rounds_ratio }
    }

    /// Moves `player` to a best response against the current `slots`.
    fn play(
        &self,
        player: &Task,
        slots: &mut [usize],
        scheduler: &mut Scheduler<'_>,
        rng: &mut StdRng,
    ) -> Result<(), ScheduleError> {
        let config = scheduler.config();
        let total_slots = config.total_slots();
        let last_start = feasible_last_start(player, total_slots)?;

        let potential = interaction_potential(config.tasks(), slots, player, total_slots);
        let costs = window_costs(&potential, last_start);

        let best = costs.iter().copied().fold(f64::INFINITY, f64::min);
        let cutoff = best + TIE_TOLERANCE * (1.0 + best.abs());
        let ties: Vec<usize> = (0..costs.len()).filter(|&t| costs[t] <= cutoff).collect();
        let choice = ties[rng.random_range(0..ties.len())];

        debug!(
            task = player.id,
            from = slots[player.id],
            to = choice,
            cost = best,
            "best response"
        );
        slots[player.id] = choice;
        scheduler.reassign(player, choice)
    }
}

impl SchedulingPolicy for Game {
    fn schedule_tasks(
        &self,
        scheduler: &mut Scheduler<'_>,
        rng: &mut StdRng,
    ) -> Result<(), ScheduleError> {
        let config = scheduler.config();
        let total_slots = config.total_slots();
        let tasks = config.tasks();
        if tasks.is_empty() {
            return Ok(());
        }

        let mut slots = Vec::with_capacity(tasks.len());
        for task in tasks {
            slots.push(rng.random_range(0..=feasible_last_start(task, total_slots)?));
        }

        for task in tasks {
            self.play(task, &mut slots, scheduler, rng)?;
        }
        for _ in 0..tasks.len() * self.rounds_ratio {
            let task = &tasks[rng.random_range(0..tasks.len())];
            self.play(task, &mut slots, scheduler, rng)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Game"
    }
}

fn feasible_last_start(task: &Task, total_slots: usize) -> Result<usize, ScheduleError> {
    task.last_start(total_slots)
        .ok_or(ScheduleError::OutOfRange {
            start: 0,
            end: task.slots,
            total_slots,
        })
}

/// Interaction potential `H(t)` felt by `player` from every other task.
///
/// Task `j` at `t_j` contributes `-d_j * (w(t) - w(t - tau_j))` where `w` is
/// the indicator of `[t_j - tau_i, t_j)`. Summing `H` from `t` to the end of
/// the horizon gives the power-weighted overlap of `[t, t + tau_i)` with the
/// other windows.
fn interaction_potential(
    tasks: &[Task],
    slots: &[usize],
    player: &Task,
    total_slots: usize,
) -> Vec<f64> {
    let tau_i = player.slots as i64;
    let mut potential = vec![0.0; total_slots];

    for other in tasks.iter().filter(|o| o.id != player.id) {
        let t_j = slots[other.id] as i64;
        let tau_j = other.slots as i64;
        let window = |t: i64| i8::from(t_j - tau_i <= t && t < t_j);

        for (t, h) in potential.iter_mut().enumerate() {
            let t = t as i64;
            *h -= other.power_kw * f64::from(window(t) - window(t - tau_j));
        }
    }
    potential
}

/// Cost of each candidate start `0..=last_start`: the tail sum of `potential`.
fn window_costs(potential: &[f64], last_start: usize) -> Vec<f64> {
    let mut tail = vec![0.0; potential.len() + 1];
    for t in (0..potential.len()).rev() {
        tail[t] = tail[t + 1] + potential[t];
    }
    tail.truncate(last_start + 1);
    tail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::{RunConfig, TaskGroup};

    fn overlap(a: usize, len_a: usize, b: usize, len_b: usize) -> usize {
        (a + len_a).min(b + len_b).saturating_sub(a.max(b))
    }

    #[test]
    fn window_cost_is_weighted_overlap() {
        let cfg = RunConfig::new(
            12,
            1.0,
            1.0,
            1.0,
            &[
                TaskGroup::new(1, 3, 2.0),
                TaskGroup::new(1, 4, 0.5),
                TaskGroup::new(1, 2, 1.5),
            ],
        )
        .expect("config should build");
        let tasks = cfg.tasks();
        let slots = [0, 5, 9];

        for player in tasks {
            let last = player.last_start(12).expect("fits");
            let costs = window_costs(&interaction_potential(tasks, &slots, player, 12), last);
            assert_eq!(costs.len(), last + 1);
            for (t, cost) in costs.iter().enumerate() {
                let expected: f64 = tasks
                    .iter()
                    .filter(|o| o.id != player.id)
                    .map(|o| o.power_kw * overlap(t, player.slots, slots[o.id], o.slots) as f64)
                    .sum();
                assert!(
                    (cost - expected).abs() < 1e-9,
                    "player {} at {t}: got {cost}, expected {expected}",
                    player.id
                );
            }
        }
    }

    #[test]
    fn same_seed_gives_same_assignment() {
        let cfg = RunConfig::new(36, 10.0, 0.1, 0.05, &[TaskGroup::new(12, 6, 3.0)])
            .expect("config should build");
        let game = Game::new(2);
        let a = game.run(&cfg, 123).expect("trial should succeed");
        let b = game.run(&cfg, 123).expect("trial should succeed");
        for task in cfg.tasks() {
            assert_eq!(a.slot_of(task), b.slot_of(task));
        }
        assert_eq!(a.profile(), b.profile());
    }

    #[test]
    fn two_players_end_up_disjoint() {
        let cfg = RunConfig::new(4, 1.0, 1.0, 1.0, &[TaskGroup::new(2, 2, 1.0)])
            .expect("config should build");
        for seed in 0..25 {
            let sched = Game::new(0).run(&cfg, seed).expect("trial should succeed");
            let a = sched.slot_of(&cfg.tasks()[0]).expect("scheduled");
            let b = sched.slot_of(&cfg.tasks()[1]).expect("scheduled");
            assert_eq!(overlap(a, 2, b, 2), 0, "seed {seed}: starts {a} and {b}");
            assert_eq!(sched.profile().peak_kw(), 1.0);
        }
    }

    #[test]
    fn ledger_matches_profile_after_extra_rounds() {
        let cfg = RunConfig::new(
            20,
            4.0,
            1.0,
            1.0,
            &[TaskGroup::new(4, 5, 1.0), TaskGroup::new(3, 2, 2.5)],
        )
        .expect("config should build");
        let sched = Game::new(3).run(&cfg, 8).expect("trial should succeed");

        let mut expected = vec![0.0; 20];
        for task in cfg.tasks() {
            let start = sched.slot_of(task).expect("scheduled");
            for load in &mut expected[start..start + task.slots] {
                *load += task.power_kw;
            }
        }
        for (t, load) in expected.iter().enumerate() {
            assert!((sched.profile().load_at(t) - load).abs() < 1e-9);
        }
    }
}
