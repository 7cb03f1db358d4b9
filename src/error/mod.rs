mod app;
mod config;
mod probe;
mod wire;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use probe::ProbeError;
pub use wire::WireError;
