//! Engine configuration: defaults, config files, and environment overrides.
mod defaults;
mod env;
mod loader;
mod parse;
pub mod types;


pub use defaults::{
    DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_MAX_RETRY_DELAY, DEFAULT_RATE_LIMIT_PER_SECOND,
    DEFAULT_RETRY_DELAY, DEFAULT_USER_AGENT, HARD_RETRY_CAP,
};
pub use env::apply_env_overrides;
pub use loader::{load_config, load_config_file};
pub use parse::parse_duration_value;
pub use types::{ConfigFile, DurationValue, EngineConfig};
