//! Offline demand-response scheduling: shared scheduling engine, policies,
//! and the trial harness used to compare them.

pub mod config;
pub mod io;
/// Scheduling policies and the common policy trait.
pub mod policies;
pub mod runner;
pub mod settings;
/// Tasks, load profile, and the shared scheduling engine.
pub mod sim;
pub mod trials;
