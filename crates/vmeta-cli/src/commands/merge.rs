//! Merge command: writes all sources as one document of common time segments.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use vmeta_core::{MergeOptions, MergedDocument, merge};

use super::util::{is_yaml, load_sources};
use crate::Config;
use crate::cli::MergeArgs;

pub fn run<W: Write>(writer: &mut W, args: &MergeArgs, config: &Config) -> Result<()> {
    let (sources, mapper) = load_sources(&args.sources, config)?;
    let options = MergeOptions {
        dedup: args.dedup || config.dedup,
    };

    let timeline = merge(&sources, &options, &config.align()).context("merge failed")?;
    let segments = timeline.segments.len();
    let document = MergedDocument::build(&sources, timeline, mapper.as_ref());
    write_document(&args.output, &document)?;

    let merged_sources = sources.iter().filter(|s| !s.is_empty()).count();
    tracing::info!(
        sources = merged_sources,
        segments,
        dedup = options.dedup,
        "merged metadata"
    );
    writeln!(
        writer,
        "Merged {merged_sources} of {} sources into {segments} segments",
        sources.len()
    )?;
    writeln!(writer, "Output: {}", args.output.display())?;
    Ok(())
}

fn write_document(path: &Path, document: &MergedDocument) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    if is_yaml(path) {
        serde_yaml::to_writer(&mut out, document).context("failed to write YAML")?;
    } else {
        serde_json::to_writer_pretty(&mut out, document).context("failed to write JSON")?;
        writeln!(out)?;
    }
    out.flush()
        .with_context(|| format!("failed to write {}", path.display()))
}
