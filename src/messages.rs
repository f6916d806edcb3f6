//! Text of every line the watcher shows on screen.

use std::fmt::Display;
use std::path::Path;

use owo_colors::OwoColorize;

pub const SEPARATOR: &str = "============================\n";

pub fn output_prompt() -> String {
    "Enter output pdf name: ".bright_blue().to_string()
}

pub fn fixed_output_warning(output_name: &str) -> String {
    format!(
        "{}{}{}{}",
        "Compressing ".bright_yellow(),
        "ALL".red(),
        " pdfs to ".bright_yellow(),
        format!("{output_name}.pdf").bright_green()
    )
}

pub fn compressing(filename: &str) -> String {
    format!("Compressing {filename}").yellow().to_string()
}

pub fn progress(completed: u64) -> String {
    format!("({completed}) Compressed!").green().to_string()
}

pub fn watching(directory: &Path) -> String {
    format!("Watching for new pdfs {} ...", directory.display())
        .bright_blue()
        .to_string()
}

pub fn unlink_warning(filename: &str) -> String {
    format!("Could not unlink {filename}")
        .bright_yellow()
        .to_string()
}

pub fn error(error: impl Display) -> String {
    error.to_string().bright_red().to_string()
}
