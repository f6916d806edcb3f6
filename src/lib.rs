//! Watch a directory and compress every new PDF with Ghostscript.
//!
//! Events flow from [`watcher`] through [`resolve`](mod@resolve) into a [`compress::Compressor`]
//! driven by [`pipeline::Orchestrator`], with progress shown on a
//! [`message_log::MessageLog`].

pub mod cleanup;
pub mod cli;
pub mod compress;
pub mod config;
pub mod error;
pub mod message_log;
pub mod messages;
pub mod pipeline;
pub mod prompt;
pub mod resolve;
pub mod surface;
pub mod watcher;
