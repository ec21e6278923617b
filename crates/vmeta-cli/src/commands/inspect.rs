//! Inspect command: seeks every source to one instant and prints what it displays.

use std::io::Write;

use anyhow::Result;
use vmeta_core::Timeline;
use vmeta_core::time::format_timestamp;

use super::util::{load_sources, slot_lines};
use crate::Config;
use crate::cli::SourceArgs;

pub fn run<W: Write>(writer: &mut W, args: &SourceArgs, at: f64, config: &Config) -> Result<()> {
    let (sources, _mapper) = load_sources(args, config)?;
    let mut timeline = Timeline::new(sources);
    timeline.seek(at);

    if let Some(title) = timeline.sources().iter().find_map(|s| s.title.as_deref()) {
        writeln!(writer, "{title}")?;
    }
    writeln!(writer, "{}", format_timestamp(at))?;
    for line in slot_lines(&timeline) {
        writeln!(writer, "  {line}")?;
    }
    Ok(())
}
