pub mod metrics;
pub mod timer;
