//! Breakpoint bookkeeping shared by the code panel and the step protocol

use std::collections::HashSet;

/// Source-line breakpoints for the current debug session.
///
/// The wire carries breakpoints as space-joined line numbers, so this set
/// also owns that encoding.
#[derive(Debug, Clone, Default)]
pub struct BreakpointSet {
    /// Breakpointed line numbers (1-based).
    lines: HashSet<i64>,
}

impl BreakpointSet {
    /// Create an empty breakpoint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a breakpoint at the given line; returns whether the line is
    /// breakpointed afterwards.
    pub fn toggle(&mut self, line: i64) -> bool {
        if self.lines.contains(&line) {
            self.lines.remove(&line);
            false
        } else {
            self.lines.insert(line);
            true
        }
    }

    /// Check whether a breakpoint exists at the given line.
    pub fn contains(&self, line: i64) -> bool {
        self.lines.contains(&line)
    }

    /// Remove all breakpoints.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Number of breakpoints set.
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    /// All breakpointed lines, sorted ascending.
    pub fn sorted(&self) -> Vec<i64> {
        let mut lines: Vec<i64> = self.lines.iter().copied().collect();
        lines.sort_unstable();
        lines
    }

    /// Space-joined encoding carried on `/debugNext`.
    pub fn wire_format(&self) -> String {
        self.sorted().iter().map(|l| l.to_string()).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trip() {
        let mut bps = BreakpointSet::new();
        assert!(bps.toggle(7));
        assert!(bps.contains(7));
        assert!(!bps.toggle(7));
        assert!(!bps.contains(7));
    }

    #[test]
    fn test_wire_format_is_sorted_and_space_joined() {
        let mut bps = BreakpointSet::new();
        bps.toggle(9);
        bps.toggle(3);
        bps.toggle(7);
        assert_eq!(bps.wire_format(), "3 7 9");
    }

    #[test]
    fn test_empty_wire_format() {
        assert_eq!(BreakpointSet::new().wire_format(), "");
    }
}
