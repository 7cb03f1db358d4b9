use reqwest::{Client, redirect};

use crate::config::EngineConfig;
use crate::error::AppResult;

/// Maximum redirect hops when a probe follows redirects.
pub const REDIRECT_LIMIT: usize = 10;

/// Pooled HTTP clients shared by every probe, one per redirect policy.
#[derive(Debug, Clone)]
pub struct HttpClients {
    following: Client,
    direct: Client,
}

impl HttpClients {
    /// Builds both clients from the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend cannot be initialised.
    pub fn new(config: &EngineConfig) -> AppResult<Self> {
        Ok(Self {
            following: build_client(config, redirect::Policy::limited(REDIRECT_LIMIT))?,
            direct: build_client(config, redirect::Policy::none())?,
        })
    }

    #[must_use]
    pub const fn for_request(&self, follow_redirects: bool) -> &Client {
        if follow_redirects {
            &self.following
        } else {
            &self.direct
        }
    }
}

fn build_client(config: &EngineConfig, policy: redirect::Policy) -> AppResult<Client> {
    // Per-attempt deadlines are enforced by the executor, not the client.
    let client = Client::builder()
        .connect_timeout(config.connect_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .pool_idle_timeout(Some(config.pool_idle_timeout))
        .user_agent(config.user_agent.as_str())
        .redirect(policy)
        .build()?;
    Ok(client)
}
