//! Demand-response scheduling policies.

/// ALOHA-like random access with a safe/overage acceptance split.
pub mod aloha;
pub mod game;
/// Time/Slackness decision density policy.
pub mod time_slackness;
pub mod types;
/// Uniformly random start slots.
pub mod uniform;

pub use aloha::AlohaLike;
pub use game::Game;
pub use time_slackness::TimeSlackness;
pub use types::{Policy, SchedulingPolicy};
pub use uniform::Uniform;
