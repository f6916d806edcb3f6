use std::path::PathBuf;

use thiserror::Error;

/// Failures of the directory watcher. These are fatal to the watch loop.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to watch {path}: {source}")]
    Start {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("watch backend error: {0}")]
    Backend(#[from] notify::Error),
}

/// Argument errors raised before the external compressor is launched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompressError {
    #[error("No input specified")]
    EmptyInput,

    #[error("No output specified")]
    EmptyOutput,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot watch {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("failed to read answer: {0}")]
    Io(#[from] std::io::Error),

    #[error("input closed before an answer was given")]
    Closed,
}
