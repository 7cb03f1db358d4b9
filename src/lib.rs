//! Core library for the `apiprobe` CLI.
//!
//! The crate is a rate-limited, retrying HTTP probe engine. A
//! [`engine::ProbeEngine`] runs single probes or ordered batches under a
//! shared token bucket, bounds concurrency and response size, and keeps
//! running statistics over every outcome. The [`wire`] module carries the
//! JSON and RPC shapes front ends exchange with the engine.
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod wire;
