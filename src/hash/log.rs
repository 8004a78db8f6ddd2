// Activity log module
// Keeps a textual record of every event of a run for display and export

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use super::error::IntegrityError;
use super::progress::{Classification, FileEvent, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Event(Classification),
    Summary,
    Note,
}

#[derive(Debug, Clone)]
struct LogLine {
    text: String,
    kind: LineKind,
}

/// Ordered activity log of a run
///
/// Works as a `ProgressSink`, so it can be fed by the engine directly or
/// from drained `EngineMessage`s.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    lines: Vec<LogLine>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&mut self, event: &FileEvent) {
        self.lines.push(LogLine {
            text: event.to_line(),
            kind: LineKind::Event(event.classification),
        });
    }

    /// Summary lines survive the errors-only filter
    pub fn push_summary<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(|line| LogLine {
            text: line.into(),
            kind: LineKind::Summary,
        }));
    }

    /// Free-form status text, hidden by the errors-only filter
    pub fn push_note(&mut self, note: impl Into<String>) {
        self.lines.push(LogLine {
            text: note.into(),
            kind: LineKind::Note,
        });
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Render the log, optionally keeping only problems and summary lines
    pub fn render(&self, errors_only: bool) -> String {
        self.lines
            .iter()
            .filter(|line| match line.kind {
                LineKind::Event(classification) => !errors_only || classification.is_problem(),
                LineKind::Summary => true,
                LineKind::Note => !errors_only,
            })
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the rendered log to `<dir>/<root_name>_log_<timestamp>.txt`
    pub fn export(&self, dir: &Path, root_name: &str, errors_only: bool) -> Result<PathBuf, IntegrityError> {
        if self.is_empty() {
            return Err(IntegrityError::EmptyLog);
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{}_log_{}.txt", root_name, timestamp));

        fs::create_dir_all(dir)
            .and_then(|_| fs::write(&path, self.render(errors_only)))
            .map_err(|e| IntegrityError::from_io_error(e, "exporting log", path.clone()))?;

        Ok(path)
    }
}

impl ProgressSink for EventLog {
    fn on_progress(&mut self, _percent: u8) {}

    fn on_event(&mut self, event: &FileEvent) {
        self.push_event(event);
    }
}
