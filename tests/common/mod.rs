//! Shared test fixtures for integration tests.

use load_shift_sim::policies::{AlohaLike, Game, Policy, TimeSlackness, Uniform};
use load_shift_sim::sim::types::{RunConfig, TaskGroup};

/// Single group run: `count` tasks of `slots` slots at `power_kw` each.
pub fn single_group_config(
    total_slots: usize,
    capacity_kw: f64,
    count: usize,
    slots: usize,
    power_kw: f64,
) -> RunConfig {
    RunConfig::new(
        total_slots,
        capacity_kw,
        0.1,
        0.05,
        &[TaskGroup::new(count, slots, power_kw)],
    )
    .expect("fixture config should build")
}

/// Mixed durations and powers over 24 slots (L = 4 kW).
pub fn mixed_config() -> RunConfig {
    RunConfig::new(
        24,
        4.0,
        0.1,
        0.05,
        &[
            TaskGroup::new(4, 6, 2.0),
            TaskGroup::new(3, 10, 1.0),
            TaskGroup::new(5, 2, 3.0),
        ],
    )
    .expect("fixture config should build")
}

/// One instance of every policy with the tuned parameters.
pub fn all_policies() -> Vec<Policy> {
    vec![
        Policy::Uniform(Uniform),
        Policy::Aloha(AlohaLike::new(0.2, 0.0)),
        Policy::Aloha(AlohaLike::new(0.145, 0.0175)),
        Policy::TimeSlackness(TimeSlackness::new(0.06)),
        Policy::Game(Game::new(2)),
    ]
}

/// Global cost computed from the final profile alone: `dt * Σ_t C(L_t) * L_t`.
pub fn profile_cost(cfg: &RunConfig, loads: &[f64]) -> f64 {
    let c = |load: f64| {
        if load <= cfg.capacity_kw() {
            cfg.base_cost()
        } else {
            cfg.base_cost() + cfg.ramp_cost() * (load - cfg.capacity_kw())
        }
    };
    cfg.dt_secs() * loads.iter().map(|&l| c(l) * l).sum::<f64>()
}
