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

//! Change-suppression filter for editor deltas
//!
//! Backend recomputes are expensive, so edits that only touch comments are
//! filtered out before they trigger a `/visualizeCircuit` call. The filter
//! is a heuristic and never authoritative: the backend always reflects the
//! true semantics of whatever text is eventually sent.

/// Decide whether an editor delta is semantically significant.
///
/// Returns `true` when the change should propagate to the backend.
pub fn should_propagate(old: &str, new: &str) -> bool {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();

    // Adding or removing lines is structural, always propagate.
    if old_lines.len() != new_lines.len() {
        return true;
    }

    old_lines
        .iter()
        .zip(new_lines.iter())
        .any(|(old_line, new_line)| line_change_is_significant(old_line, new_line))
}

/// Per-line significance check for lines at the same index.
fn line_change_is_significant(old_line: &str, new_line: &str) -> bool {
    if old_line == new_line {
        return false;
    }

    // Both sides are full-line comments: whitespace and text shuffles
    // inside them never matter.
    if starts_with_hash(old_line) && starts_with_hash(new_line) {
        return false;
    }

    // Trailing-comment analysis. Empty segments are dropped because some
    // people open comments with several '#' characters in a row.
    let old_parts: Vec<&str> = old_line.split('#').filter(|s| !s.is_empty()).collect();
    let new_parts: Vec<&str> = new_line.split('#').filter(|s| !s.is_empty()).collect();

    // No '#' at all, or several '#' with code in between: too complicated
    // to prove comment-only, treat as a real change.
    if old_parts.len() != 2 || new_parts.len() != 2 {
        return true;
    }

    // The code before the comment changed.
    if old_parts[0] != new_parts[0] {
        return true;
    }

    // An odd number of quote characters before the '#' means the '#' sits
    // inside a string literal, so the "comment" is code.
    let prefix = new_parts[0];
    if count_char(prefix, '"') % 2 == 1 || count_char(prefix, '\'') % 2 == 1 {
        return true;
    }

    // A single '#' outside any string with an unchanged prefix: the edit
    // happened in the trailing comment. A multi-line string wrapping the
    // whole line can still fool this, which is acceptable for a heuristic.
    false
}

fn starts_with_hash(line: &str) -> bool {
    line.chars().find(|c| !c.is_whitespace()) == Some('#')
}

fn count_char(s: &str, c: char) -> usize {
    s.chars().filter(|&ch| ch == c).count()
}
