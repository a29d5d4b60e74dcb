//! Core library for the `loadmix` CLI.
//!
//! `loadmix` keeps a steady, mixed stream of HTTP traffic flowing at one or
//! more targets: each worker process paces ticks with jitter, bounds its
//! in-flight requests, mixes cheap reads, writes and periodic expensive
//! requests, and logs rolling statistics until it is told to drain.
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod fanout;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod shutdown;
pub mod shutdown_handlers;
pub mod worker;

#[cfg(test)]
mod test_support;
