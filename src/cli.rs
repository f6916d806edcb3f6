use std::path::PathBuf;

use clap::Parser;

/// Watch a directory and compress every new PDF with Ghostscript.
///
/// Without `--output` the tool asks for an output name at startup. An empty
/// answer compresses each file in place; a name sends every new PDF to
/// `<name>.pdf` and deletes the original afterwards.
#[derive(Parser, Debug)]
#[command(name = "pdf-watch", version, about, long_about = None)]
pub struct Cli {
    /// Directory to watch (defaults to the current directory).
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Output base name; skips the prompt. Pass an empty string for in-place mode.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Ghostscript executable to run.
    #[arg(long)]
    pub gs: Option<PathBuf>,

    /// TOML file with compressor and timing overrides.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Let compressions that target the same output file overlap (last writer wins).
    #[arg(long)]
    pub no_serialize: bool,
}
