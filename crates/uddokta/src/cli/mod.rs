//! Subcommand implementations.

pub mod config;
pub mod generate;
pub mod image;
pub mod serve;
