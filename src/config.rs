use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::message_log::DEFAULT_TRANSIENT_TTL;

/// Pause between attempts when reading the output name fails.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Optional overrides read from the file passed with `--config`.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Ghostscript executable (defaults to `gs` on `PATH`).
    pub ghostscript: Option<PathBuf>,
    /// Value for `-dCompatibilityLevel`.
    pub compatibility_level: Option<String>,
    /// Value for `-dPDFSETTINGS`.
    pub pdf_settings: Option<String>,
    /// Lifetime of transient status lines, in milliseconds.
    pub transient_ms: Option<u64>,
    /// Delay before re-prompting after an input error, in milliseconds.
    pub retry_delay_ms: Option<u64>,
    /// Serialize compressions that write the same output file.
    pub serialize_outputs: Option<bool>,
}

impl FileConfig {
    /// Load and parse a TOML config file. Unlike a discovered file, an
    /// explicitly requested one must exist and parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str::<Self>(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// How the external compressor is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressorSettings {
    pub program: PathBuf,
    pub compatibility_level: String,
    pub pdf_settings: String,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gs"),
            compatibility_level: "1.4".to_string(),
            pdf_settings: "/prepress".to_string(),
        }
    }
}

/// Everything known before the output name is chosen.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Absolute, canonical directory to watch.
    pub watched_directory: PathBuf,
    /// Raw output name given on the command line; skips the prompt when set.
    pub preset_output: Option<String>,
    pub compressor: CompressorSettings,
    pub transient_ttl: Duration,
    pub retry_delay: Duration,
    pub serialize_outputs: bool,
}

impl Settings {
    /// Merge command-line flags over the optional config file over defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let directory = match &cli.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|source| ConfigError::Directory {
                path: PathBuf::from("."),
                source,
            })?,
        };

        Self::merge(directory, cli, file)
    }

    fn merge(directory: PathBuf, cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let watched_directory =
            std::fs::canonicalize(&directory).map_err(|source| ConfigError::Directory {
                path: directory.clone(),
                source,
            })?;

        let defaults = CompressorSettings::default();
        let compressor = CompressorSettings {
            program: cli
                .gs
                .clone()
                .or(file.ghostscript)
                .unwrap_or(defaults.program),
            compatibility_level: file
                .compatibility_level
                .unwrap_or(defaults.compatibility_level),
            pdf_settings: file.pdf_settings.unwrap_or(defaults.pdf_settings),
        };

        Ok(Self {
            watched_directory,
            preset_output: cli.output.clone(),
            compressor,
            transient_ttl: file
                .transient_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TRANSIENT_TTL),
            retry_delay: file
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RETRY_DELAY),
            serialize_outputs: !cli.no_serialize && file.serialize_outputs.unwrap_or(true),
        })
    }
}

/// Fixed for the lifetime of the watch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub watched_directory: PathBuf,
    /// `None` means in-place mode.
    pub fixed_output_base_name: Option<String>,
}
