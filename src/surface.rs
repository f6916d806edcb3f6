use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};

/// Where the message log draws itself. Every render replaces the whole frame.
pub trait Surface: Send + Sync + 'static {
    fn render(&self, lines: &[String]);
}

/// Clears the terminal and prints the log to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSurface;

impl Surface for TerminalSurface {
    fn render(&self, lines: &[String]) {
        let mut stdout = std::io::stdout().lock();
        let result = crossterm::execute!(
            stdout,
            Clear(ClearType::All),
            Clear(ClearType::Purge),
            MoveTo(0, 0)
        )
        .and_then(|_| {
            for line in lines {
                writeln!(stdout, "{line}")?;
            }
            stdout.flush()
        });

        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to redraw message log");
        }
    }
}

/// Records every frame instead of drawing it.
#[derive(Debug, Default)]
pub struct MemorySurface {
    frames: Mutex<Vec<Vec<String>>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// All frames rendered so far, oldest first.
    pub fn frames(&self) -> Vec<Vec<String>> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent frame, or an empty one if nothing was rendered.
    pub fn last_frame(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn render_count(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Surface for MemorySurface {
    fn render(&self, lines: &[String]) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(lines.to_vec());
    }
}
