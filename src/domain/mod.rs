//! Values exchanged between front ends and the probe engine.
mod batch;
mod health;
mod ids;
mod probe;


pub use batch::{BatchResult, ProbeBatch};
pub use health::HealthReport;
pub use ids::generate_id;
pub use probe::{ProbeOutcome, ProbeRequest, is_success_status};
