use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("apiprobe/", env!("CARGO_PKG_VERSION"));

/// Upper bound on retries for a single probe, whatever the request asks for.
pub const HARD_RETRY_CAP: u32 = 2;

pub const DEFAULT_RATE_LIMIT_PER_SECOND: u32 = 100;
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

pub(super) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub(super) const DEFAULT_MAX_CONCURRENCY: usize = 100;
pub(super) const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(2);
pub(super) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub(super) const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;
pub(super) const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Config filenames checked in the working directory when no path is given.
pub(super) const DEFAULT_CONFIG_FILES: [&str; 2] = ["apiprobe.toml", "apiprobe.json"];
