/// CSV writers for profiles, reports and sweeps.
pub mod export;
