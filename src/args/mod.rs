//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;

#[cfg(test)]
mod tests;

pub use cli::{Command, LoadArgs, WorkerArgs};

pub(crate) use defaults::DEFAULT_USER_AGENT;
