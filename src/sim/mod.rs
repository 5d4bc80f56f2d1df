/// Per-slot aggregate load accumulator.
pub mod load_profile;
pub mod scheduler;
/// Deferrable load description.
pub mod task;
pub mod types;

pub use load_profile::LoadProfile;
pub use scheduler::Scheduler;
pub use task::Task;
pub use types::{RunConfig, ScheduleError, TaskGroup};
