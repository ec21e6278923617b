//! Command-line argument definitions.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use vmeta_core::{SourceKind, UnknownSourceKind};

/// Video metadata timeline tool.
///
/// Aligns independently timed metadata streams (scene descriptions, action inferences, text
/// annotations) against a common clock, either at one instant or merged into a single document.
#[derive(Debug, Parser)]
#[command(name = "vmeta", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge all sources into one document of common time segments.
    Merge(MergeArgs),

    /// Show what every source displays at a point in time.
    Inspect {
        #[command(flatten)]
        sources: SourceArgs,

        /// Playback time in milliseconds.
        #[arg(long)]
        at: f64,
    },

    /// Replay playback frame by frame and print every display change.
    Trace {
        #[command(flatten)]
        sources: SourceArgs,

        /// Playback frame rate.
        #[arg(long, default_value_t = 25.0)]
        fps: f64,

        /// Stop at this time in milliseconds (default: end of the latest source).
        #[arg(long)]
        until: Option<f64>,
    },
}

/// Metadata documents to load, JSON or YAML by extension.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Video description document.
    #[arg(long = "video-description", visible_alias = "vd")]
    pub video_description: Option<PathBuf>,

    /// Video inference document (repeatable).
    #[arg(long = "video-inference", visible_alias = "vi")]
    pub video_inference: Vec<PathBuf>,

    /// Text annotation document.
    #[arg(long = "text-annotation", visible_alias = "ta")]
    pub text_annotation: Option<PathBuf>,

    /// Text inference document (repeatable).
    #[arg(long = "text-inference", visible_alias = "ti")]
    pub text_inference: Vec<PathBuf>,

    /// Document of any kind, as `KIND=PATH` (kind name or short code, repeatable).
    #[arg(long = "source", value_name = "KIND=PATH")]
    pub sources: Vec<SourceSpec>,

    /// Label mapping table applied to inferred classes and token types.
    #[arg(long)]
    pub mapping: Option<PathBuf>,
}

/// A document path tagged with its source kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub kind: SourceKind,
    pub path: PathBuf,
}

impl FromStr for SourceSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected KIND=PATH, got `{s}`"))?;
        let kind: SourceKind = kind
            .trim()
            .parse()
            .map_err(|e: UnknownSourceKind| e.to_string())?;
        if path.is_empty() {
            return Err(format!("missing document path for {kind}"));
        }
        Ok(Self {
            kind,
            path: PathBuf::from(path),
        })
    }
}

#[derive(Debug, Clone, Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Output file; `.yaml`/`.yml` writes YAML, anything else JSON.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Store each entry once in a reference table and link to it from segments.
    #[arg(long)]
    pub dedup: bool,
}
