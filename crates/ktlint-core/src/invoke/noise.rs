//! Removal of log lines the formatter interleaves into stdout
//!
//! ktlint logs through logback and cannot be fully silenced with flags, so lines
//! like `15:02:40.431 [main] INFO ...` or the `Enable default patterns` banner can
//! show up in the middle of formatted output.

use crate::error::{Error, Result};
use crate::events::FormatEvents;
use regex::Regex;

const ANSI_PATTERN: &str = r"\x1B\[[0-9;]*[a-zA-Z]";
const TIMESTAMP_PATTERN: &str = r"^\d{2}:\d{2}:\d{2}\.\d{3}\s+\[";
const LEVEL_MARKERS: &[&str] = &["[main] INFO", "[main] WARN", "[main] ERROR"];

/// Classifies stdout lines as log noise
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    ansi: Regex,
    timestamp: Regex,
    markers: Vec<String>,
}

impl NoiseFilter {
    /// Build a filter recognizing the level markers plus `banners`
    pub fn new(banners: &[&str]) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::InvalidConfig(format!("noise pattern: {}", e)))
        };

        let markers = LEVEL_MARKERS
            .iter()
            .chain(banners)
            .map(|m| m.to_string())
            .collect();

        Ok(Self {
            ansi: compile(ANSI_PATTERN)?,
            timestamp: compile(TIMESTAMP_PATTERN)?,
            markers,
        })
    }

    /// Remove ANSI escape sequences
    pub fn strip_ansi<'a>(&self, line: &'a str) -> std::borrow::Cow<'a, str> {
        self.ansi.replace_all(line, "")
    }

    /// Whether a single line (already free of ANSI codes) is noise
    pub fn is_noise(&self, plain_line: &str) -> bool {
        self.markers.iter().any(|m| plain_line.contains(m.as_str()))
            || self.timestamp.is_match(plain_line)
    }

    /// Drop noise lines from `stdout`, keeping all other lines untouched and in order
    pub fn clean(&self, stdout: &str, events: &dyn FormatEvents) -> String {
        stdout
            .split('\n')
            .filter(|line| {
                let plain = self.strip_ansi(line);
                if self.is_noise(&plain) {
                    events.on_line_filtered(&plain);
                    false
                } else {
                    true
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopEvents;
    use std::sync::Mutex;

    fn filter() -> NoiseFilter {
        NoiseFilter::new(&["Enable default patterns"]).unwrap()
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl FormatEvents for Recorder {
        fn on_line_filtered(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
    }

    #[test]
    fn test_level_markers_are_noise() {
        let f = filter();
        assert!(f.is_noise("[main] INFO com.pinterest.ktlint.cli - starting"));
        assert!(f.is_noise("something [main] WARN deprecated flag"));
        assert!(f.is_noise("[main] ERROR oops"));
        assert!(!f.is_noise("val info = \"[main]\""));
    }

    #[test]
    fn test_timestamp_prefix_is_noise() {
        let f = filter();
        assert!(f.is_noise("15:02:40.431 [main] DEBUG whatever"));
        assert!(f.is_noise("09:00:00.000   [pool-1] TRACE"));
        assert!(!f.is_noise("  15:02:40.431 [main]"));
        assert!(!f.is_noise("val t = \"15:02:40\""));
    }

    #[test]
    fn test_banner_is_noise() {
        assert!(filter().is_noise("Enable default patterns [**/*.kt, **/*.kts]"));
    }

    #[test]
    fn test_ansi_codes_are_ignored_for_matching() {
        let f = filter();
        let colored = "\x1B[32m15:02:40.431\x1B[0m [pool-2] DEBUG ready";
        assert!(!f.is_noise(colored));
        assert!(f.is_noise(&f.strip_ansi(colored)));
    }

    #[test]
    fn test_clean_keeps_code_lines_in_order() {
        let f = filter();
        let stdout = "15:02:40.431 [main] INFO start\n\
                      package demo\n\
                      \x1B[33m[main] WARN\x1B[0m slow\n\
                      \n\
                      Enable default patterns [**/*.kt]\n\
                      val x = 1\n";
        let recorder = Recorder::default();

        let cleaned = f.clean(stdout, &recorder);

        assert_eq!(cleaned, "package demo\n\nval x = 1\n");
        let filtered = recorder.0.lock().unwrap();
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[1], "[main] WARN slow");
    }

    #[test]
    fn test_clean_of_pure_noise_is_empty() {
        let cleaned = filter().clean("12:00:00.000 [main] INFO only noise", &NoopEvents);
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_clean_preserves_ansi_in_kept_lines() {
        let cleaned = filter().clean("val s = \"\x1B[1mbold\"", &NoopEvents);
        assert_eq!(cleaned, "val s = \"\x1B[1mbold\"");
    }
}
