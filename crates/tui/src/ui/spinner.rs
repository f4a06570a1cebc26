//! Animated spinner for in-flight backend requests

use std::time::{Duration, Instant};

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_DURATION: Duration = Duration::from_millis(100);

/// Braille-pattern spinner animation.
#[derive(Debug)]
pub struct Spinner {
    current_frame: usize,
    last_update: Instant,
    active: bool,
}

impl Spinner {
    /// Create an inactive spinner.
    pub fn new() -> Self {
        Self { current_frame: 0, last_update: Instant::now(), active: false }
    }

    /// Start animating.
    pub fn start(&mut self) {
        self.active = true;
        self.last_update = Instant::now();
    }

    /// Stop and rewind.
    pub fn stop(&mut self) {
        self.active = false;
        self.current_frame = 0;
    }

    /// Advance the animation; called from the render loop.
    pub fn tick(&mut self) {
        if !self.active {
            return;
        }
        let now = Instant::now();
        if now.duration_since(self.last_update) >= FRAME_DURATION {
            self.current_frame = (self.current_frame + 1) % FRAMES.len();
            self.last_update = now;
        }
    }

    /// Current frame glyph, empty while inactive.
    pub fn frame(&self) -> &'static str {
        if self.active {
            FRAMES[self.current_frame]
        } else {
            ""
        }
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

/// Loading state for backend requests, shared between the client and the
/// status bar.
#[derive(Debug, Default)]
pub struct RpcSpinner {
    spinner: Spinner,
    operation: Option<String>,
}

impl RpcSpinner {
    /// Create an idle spinner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an operation as in flight.
    pub fn start_loading(&mut self, operation: &str) {
        self.operation = Some(operation.to_string());
        self.spinner.start();
    }

    /// Mark the operation finished.
    pub fn finish_loading(&mut self) {
        self.operation = None;
        self.spinner.stop();
    }

    /// Advance the animation.
    pub fn tick(&mut self) {
        self.spinner.tick();
    }

    /// Spinner glyph plus operation text, empty while idle.
    pub fn display_text(&self) -> String {
        match &self.operation {
            Some(op) => format!("{} {op}", self.spinner.frame()),
            None => String::new(),
        }
    }

    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.operation.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_lifecycle() {
        let mut spinner = RpcSpinner::new();
        assert!(!spinner.is_loading());
        assert_eq!(spinner.display_text(), "");

        spinner.start_loading("Evaluating circuit");
        assert!(spinner.is_loading());
        assert!(spinner.display_text().contains("Evaluating circuit"));

        spinner.finish_loading();
        assert!(!spinner.is_loading());
        assert_eq!(spinner.display_text(), "");
    }
}
