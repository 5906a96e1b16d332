//! CLI subcommand implementations.

pub mod classify;
pub mod config;
pub mod extract;
