//! Trace command: replays playback one frame at a time and prints each display change.

use std::io::Write;

use anyhow::{Result, bail};
use vmeta_core::time::format_timestamp;
use vmeta_core::{Source, Timeline};

use super::util::{load_sources, slot_lines};
use crate::Config;
use crate::cli::SourceArgs;

pub fn run<W: Write>(
    writer: &mut W,
    args: &SourceArgs,
    fps: f64,
    until: Option<f64>,
    config: &Config,
) -> Result<()> {
    if fps.is_nan() || fps <= 0.0 {
        bail!("frame rate must be positive, got {fps}");
    }
    let frame_ms = 1000.0 / fps;

    let (sources, _mapper) = load_sources(args, config)?;
    // one frame past the last end, so exhaustion shows up
    let Some(stop) = until.or_else(|| {
        sources
            .iter()
            .filter_map(Source::last_end)
            .reduce(f64::max)
            .map(|end| end + frame_ms)
    }) else {
        writeln!(writer, "No metadata to trace.")?;
        return Ok(());
    };
    if !stop.is_finite() {
        bail!("trace end must be a finite time, got {stop}");
    }

    let mut timeline = Timeline::new(sources);
    let mut changes = 0_usize;
    for frame in 0_u64.. {
        let t = frame_time(frame, frame_ms);
        if t > stop {
            break;
        }
        if timeline.advance(t) || frame == 0 {
            changes += 1;
            writeln!(writer, "{} (frame {frame})", format_timestamp(t))?;
            for line in slot_lines(&timeline) {
                writeln!(writer, "  {line}")?;
            }
        }
    }

    tracing::debug!(changes, stop, "trace finished");
    Ok(())
}

/// Playback time of `frame`, in milliseconds.
#[allow(clippy::cast_precision_loss)]
fn frame_time(frame: u64, frame_ms: f64) -> f64 {
    frame as f64 * frame_ms
}
