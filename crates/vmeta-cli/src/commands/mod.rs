//! CLI subcommand implementations.

pub mod inspect;
pub mod merge;
pub mod trace;
pub mod util;
