//! Terminal status output

use colored::Colorize;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

/// Sentinel meaning nothing has been drawn yet
const NOT_DRAWN: u32 = u32::MAX;

/// Single self-overwriting progress line on stderr
pub struct ProgressLine {
    label: String,
    last_percent: AtomicU32,
    term: console::Term,
}

impl ProgressLine {
    pub fn new(label: String) -> Self {
        let term = console::Term::stderr();
        let _ = term.hide_cursor();
        Self {
            label,
            last_percent: AtomicU32::new(NOT_DRAWN),
            term,
        }
    }

    /// Redraw when the whole percent changed
    pub fn update(&self, percent: u32) {
        if self.last_percent.swap(percent, Ordering::Relaxed) == percent {
            return;
        }
        let mut term = &self.term;
        let _ = write!(term, "\r{} {}", self.label.cyan(), format!("{}%", percent).dimmed());
        let _ = term.flush();
    }

    pub fn finish(self, success: bool) {
        let status = if success {
            "done".green()
        } else {
            "failed".red()
        };
        let _ = self.term.clear_line();
        let _ = self.term.write_line(&format!("{} {}", self.label.cyan(), status));
        let _ = self.term.show_cursor();
    }
}

pub fn status_ok(file: &Path, changed: bool) {
    let state = if changed {
        "Formatted".green()
    } else {
        "Unchanged".dimmed()
    };
    eprintln!("  {} {}", state, file.display());
}

pub fn status_failed(file: &Path, error: &anyhow::Error) {
    eprintln!(
        "  {} {}: {}",
        "Formatting failed".red(),
        file.display(),
        error
    );
}
