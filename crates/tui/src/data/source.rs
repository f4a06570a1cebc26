// CircInspect - Quantum Circuit Debugger
// Copyright (C) 2025 UBC Quantum Software and Algorithms Research Lab
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Watched source file with change filtering and debounce
//!
//! The user edits the circuit script in their own editor; the client polls
//! the file on its render tick. Comment-only edits are filtered out by
//! [`should_propagate`], and significant edits are debounced so a burst of
//! saves produces one backend evaluation.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use eyre::{Context, Result};
use tracing::{debug, trace};

use crate::data::filter::should_propagate;

/// Default debounce between a significant edit and its evaluation.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// The watched circuit source file.
#[derive(Debug)]
pub struct SourceBuffer {
    path: PathBuf,
    /// Current file contents, as shown in the code panel.
    text: String,
    /// Last contents that passed the significance filter; this is what
    /// gets sent to the backend and what later edits are compared against.
    accepted: String,
    /// Deadline of a pending evaluation, armed by a significant edit and
    /// re-armed by every further one.
    due: Option<Instant>,
    /// During a debug run edits are ignored rather than evaluated.
    read_only: bool,
    debounce: Duration,
}

impl SourceBuffer {
    /// Load the watched file.
    pub fn load(path: impl Into<PathBuf>, debounce: Duration) -> Result<Self> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read source file {}", path.display()))?;
        Ok(Self {
            path,
            accepted: text.clone(),
            text,
            due: None,
            read_only: false,
            debounce,
        })
    }

    /// Watched file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file contents.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Last contents accepted for evaluation.
    pub fn accepted(&self) -> &str {
        &self.accepted
    }

    /// Toggle read-only. While set, file changes still refresh the panel
    /// but never trigger evaluations.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        if read_only {
            self.due = None;
        }
    }

    /// Whether edits are currently locked out.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Re-read the file and run the change filter. Called on every tick.
    pub fn poll(&mut self) -> Result<()> {
        let current = std::fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("failed to read source file {}", self.path.display()))?;
        if current == self.text {
            return Ok(());
        }
        self.text = current;
        if self.read_only {
            trace!("source changed during debug run, ignoring");
            return Ok(());
        }
        if should_propagate(&self.accepted, &self.text) {
            self.accepted = self.text.clone();
            self.due = Some(Instant::now() + self.debounce);
            debug!(path = %self.path.display(), "significant edit, evaluation armed");
        } else {
            trace!("comment-only edit suppressed");
        }
        Ok(())
    }

    /// Take the debounced evaluation when its deadline has passed.
    pub fn take_ready(&mut self) -> Option<String> {
        if self.due.is_some_and(|due| Instant::now() >= due) {
            self.due = None;
            Some(self.accepted.clone())
        } else {
            None
        }
    }

    /// Whether an evaluation is armed but not yet due.
    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn buffer_with(initial: &str, debounce: Duration) -> (tempfile::NamedTempFile, SourceBuffer) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(initial.as_bytes()).unwrap();
        file.flush().unwrap();
        let buf = SourceBuffer::load(file.path(), debounce).unwrap();
        (file, buf)
    }

    fn rewrite(file: &tempfile::NamedTempFile, text: &str) {
        std::fs::write(file.path(), text).unwrap();
    }

    #[test]
    fn test_significant_edit_arms_evaluation() {
        let (file, mut buf) = buffer_with("x = 1", Duration::ZERO);
        rewrite(&file, "x = 2");
        buf.poll().unwrap();
        assert_eq!(buf.take_ready().as_deref(), Some("x = 2"));
        // One edit, one evaluation.
        assert_eq!(buf.take_ready(), None);
    }

    #[test]
    fn test_comment_edit_is_suppressed() {
        let (file, mut buf) = buffer_with("x = 1  # old", Duration::ZERO);
        rewrite(&file, "x = 1  # new");
        buf.poll().unwrap();
        assert!(!buf.is_pending());
        assert_eq!(buf.take_ready(), None);
        // The panel still shows the new text.
        assert_eq!(buf.text(), "x = 1  # new");
    }

    #[test]
    fn test_burst_of_edits_keeps_latest_text() {
        let (file, mut buf) = buffer_with("x = 1", Duration::ZERO);
        rewrite(&file, "x = 2");
        buf.poll().unwrap();
        rewrite(&file, "x = 3");
        buf.poll().unwrap();
        assert_eq!(buf.take_ready().as_deref(), Some("x = 3"));
    }

    #[test]
    fn test_debounce_holds_until_deadline() {
        let (file, mut buf) = buffer_with("x = 1", Duration::from_secs(60));
        rewrite(&file, "x = 2");
        buf.poll().unwrap();
        assert!(buf.is_pending());
        assert_eq!(buf.take_ready(), None, "deadline is a minute away");
    }

    #[test]
    fn test_read_only_ignores_edits() {
        let (file, mut buf) = buffer_with("x = 1", Duration::ZERO);
        buf.set_read_only(true);
        rewrite(&file, "x = 2");
        buf.poll().unwrap();
        assert_eq!(buf.take_ready(), None);
        assert_eq!(buf.text(), "x = 2");
        // Leaving read-only does not resurrect the ignored edit.
        buf.set_read_only(false);
        assert_eq!(buf.take_ready(), None);
    }
}
