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

//! Code panel showing the watched source file
//!
//! Renders the circuit script with line numbers, breakpoint markers, and
//! the debugger's execution highlight. The cursor line is where `b` places
//! breakpoints.

use circinspect_common::types::Mode;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use eyre::Result;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{EventResponse, Panel, PanelAction, PanelType};
use crate::data::DataManager;

/// Code panel implementation.
#[derive(Debug, Default)]
pub struct CodePanel {
    /// Cursor line, 1-based.
    cursor_line: usize,
    scroll_offset: usize,
    viewport_height: usize,
    focused: bool,
}

impl CodePanel {
    /// Create a new code panel with the cursor on line 1.
    pub fn new() -> Self {
        Self { cursor_line: 1, ..Default::default() }
    }

    fn move_cursor(&mut self, delta: i64, line_count: usize) {
        let target = self.cursor_line as i64 + delta;
        self.cursor_line = target.clamp(1, line_count.max(1) as i64) as usize;
        // Keep the cursor inside the viewport.
        if self.cursor_line <= self.scroll_offset {
            self.scroll_offset = self.cursor_line - 1;
        } else if self.cursor_line > self.scroll_offset + self.viewport_height {
            self.scroll_offset = self.cursor_line - self.viewport_height;
        }
    }
}

impl Panel for CodePanel {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &DataManager) {
        self.viewport_height = area.height.saturating_sub(2) as usize;
        let lines: Vec<&str> = dm.source.text().split('\n').collect();

        let rendered: Vec<Line<'_>> = lines
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.viewport_height)
            .map(|(idx, text)| {
                let line_no = (idx + 1) as i64;
                let marker = if dm.breakpoints.contains(line_no) { "●" } else { " " };
                let mut style = Style::default();
                if line_no == dm.highlight_line {
                    style = style.bg(Color::Red).fg(Color::White);
                } else if self.focused && idx + 1 == self.cursor_line {
                    style = style.bg(Color::DarkGray);
                }
                Line::from(vec![
                    Span::styled(marker.to_string(), Style::default().fg(Color::Red)),
                    Span::styled(
                        format!("{line_no:>4} "),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled((*text).to_string(), style),
                ])
            })
            .collect();

        let mut title = format!(" {} ", dm.source.path().display());
        if dm.source.is_read_only() {
            title.push_str("[locked] ");
        }
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)));
        frame.render_widget(Paragraph::new(rendered).block(block), area);
    }

    fn handle_key_event(
        &mut self,
        event: KeyEvent,
        dm: &mut DataManager,
    ) -> Result<EventResponse> {
        if event.kind != KeyEventKind::Press {
            return Ok(EventResponse::NotHandled);
        }
        let line_count = dm.source.text().split('\n').count();
        match event.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_cursor(1, line_count);
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_cursor(-1, line_count);
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('g') => {
                self.cursor_line = 1;
                self.scroll_offset = 0;
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('G') => {
                self.move_cursor(line_count as i64, line_count);
                Ok(EventResponse::Handled)
            }
            // Breakpoints only exist in debugger mode.
            KeyCode::Char('b') if dm.mode == Mode::Debugger => Ok(EventResponse::Action(
                PanelAction::ToggleBreakpoint(self.cursor_line as i64),
            )),
            _ => Ok(EventResponse::NotHandled),
        }
    }

    fn panel_type(&self) -> PanelType {
        PanelType::Code
    }

    fn on_focus(&mut self) {
        self.focused = true;
    }

    fn on_blur(&mut self) {
        self.focused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::SourceBuffer;
    use crossterm::event::KeyModifiers;
    use std::io::Write;
    use std::time::Duration;

    fn manager() -> (tempfile::NamedTempFile, DataManager) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"a\nb\nc\n").unwrap();
        file.flush().unwrap();
        let source = SourceBuffer::load(file.path(), Duration::ZERO).unwrap();
        (file, DataManager::new(source))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_breakpoint_action_targets_cursor_line() {
        let (_f, mut dm) = manager();
        dm.set_mode(Mode::Debugger);
        let mut panel = CodePanel::new();
        panel.viewport_height = 10;
        panel.handle_key_event(key(KeyCode::Char('j')), &mut dm).unwrap();

        let resp = panel.handle_key_event(key(KeyCode::Char('b')), &mut dm).unwrap();
        assert_eq!(resp, EventResponse::Action(PanelAction::ToggleBreakpoint(2)));
    }

    #[test]
    fn test_breakpoint_key_is_inert_in_real_time_mode() {
        let (_f, mut dm) = manager();
        let mut panel = CodePanel::new();
        panel.viewport_height = 10;

        let resp = panel.handle_key_event(key(KeyCode::Char('b')), &mut dm).unwrap();
        assert_eq!(resp, EventResponse::NotHandled);
    }

    #[test]
    fn test_cursor_clamps_to_file() {
        let (_f, mut dm) = manager();
        let mut panel = CodePanel::new();
        panel.viewport_height = 10;
        for _ in 0..20 {
            panel.handle_key_event(key(KeyCode::Char('j')), &mut dm).unwrap();
        }
        // "a\nb\nc\n" has four split positions.
        assert_eq!(panel.cursor_line, 4);
        for _ in 0..20 {
            panel.handle_key_event(key(KeyCode::Char('k')), &mut dm).unwrap();
        }
        assert_eq!(panel.cursor_line, 1);
    }
}
