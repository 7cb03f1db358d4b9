//! HTTP side of the engine: the shared rate limiter, pooled clients and the
//! single-attempt executor.
mod body;
mod client;
mod executor;
mod rate;


pub use client::{HttpClients, REDIRECT_LIMIT};
pub use executor::PreparedProbe;
pub use rate::{Acquire, RateLimiter};

#[cfg(test)]
pub(crate) use executor::{parse_method, parse_url, transport_failure};
