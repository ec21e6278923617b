//! Video metadata CLI library.
//!
//! This crate provides the CLI interface for the timeline alignment engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, MergeArgs, SourceArgs, SourceSpec};
pub use config::Config;
