//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use vmeta_core::AlignConfig;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Decimal digits kept on millisecond values.
    pub precision: u32,

    /// Frame rate for frame-indexed documents that do not declare their own.
    pub frame_rate: Option<f64>,

    /// Deduplicate merged output by default.
    pub dedup: bool,

    /// Label mapping table used when `--mapping` is not given.
    pub mapping_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let align = AlignConfig::default();
        Self {
            precision: align.precision,
            frame_rate: align.frame_rate,
            dedup: false,
            mapping_path: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (VMETA_*)
        figment = figment.merge(Env::prefixed("VMETA_"));

        figment.extract()
    }

    /// Engine settings derived from this configuration.
    pub fn align(&self) -> AlignConfig {
        AlignConfig {
            precision: self.precision,
            frame_rate: self.frame_rate,
        }
    }
}

/// Returns the platform-specific config directory for vmeta.
///
/// On Linux: `~/.config/vmeta`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("vmeta"))
}
