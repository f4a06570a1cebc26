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

//! Tree panel showing the call forest of the last evaluation
//!
//! Rows come from [`TreeState::visible_rows`]; expansion state lives in the
//! data layer so it survives tree rebuilds. Expanding a node whose children
//! were discarded by a rebuild emits a fetch action.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use eyre::Result;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use super::{EventResponse, Panel, PanelAction, PanelType};
use crate::data::tree::TreeRow;
use crate::data::DataManager;

/// Tree panel implementation.
#[derive(Debug, Default)]
pub struct TreePanel {
    /// Cursor index into the visible rows.
    cursor: usize,
    list_state: ListState,
    focused: bool,
}

impl TreePanel {
    /// Create a new tree panel.
    pub fn new() -> Self {
        Self::default()
    }

    fn row_under_cursor(&self, dm: &DataManager) -> Option<TreeRow> {
        dm.tree.visible_rows().get(self.cursor).copied()
    }
}

impl Panel for TreePanel {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &DataManager) {
        let rows = dm.tree.visible_rows();
        self.cursor = self.cursor.min(rows.len().saturating_sub(1));

        let items: Vec<ListItem<'_>> = rows
            .iter()
            .map(|row| {
                let Some(node) = dm.tree.node(row.id) else {
                    return ListItem::new("?");
                };
                let indent = "  ".repeat(row.depth);
                let glyph = if node.is_transform {
                    "∘"
                } else if !node.has_children {
                    "·"
                } else if dm.tree.is_expanded(row.id) {
                    "▾"
                } else {
                    "▸"
                };
                let mut style = Style::default();
                if node.is_transform {
                    style = style.fg(Color::Magenta);
                }
                if dm.tree.is_selected(row.id) || dm.display.shown_id == Some(row.id) {
                    style = style.add_modifier(Modifier::BOLD).fg(Color::Cyan);
                }
                let line = if node.line_number >= 0 {
                    format!(":{}", node.line_number)
                } else {
                    String::new()
                };
                ListItem::new(Line::from(vec![Span::styled(
                    format!("{indent}{glyph} {}{line}", node.name),
                    style,
                )]))
            })
            .collect();

        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).border_style(border_style).title(" Trace "))
            .highlight_style(Style::default().bg(Color::DarkGray));
        self.list_state.select(if rows.is_empty() { None } else { Some(self.cursor) });
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn handle_key_event(
        &mut self,
        event: KeyEvent,
        dm: &mut DataManager,
    ) -> Result<EventResponse> {
        if event.kind != KeyEventKind::Press {
            return Ok(EventResponse::NotHandled);
        }
        let row_count = dm.tree.visible_rows().len();
        match event.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if row_count > 0 {
                    self.cursor = (self.cursor + 1).min(row_count - 1);
                }
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                Ok(EventResponse::Handled)
            }
            // Expand or collapse the node under the cursor.
            KeyCode::Char(' ') | KeyCode::Char('l') | KeyCode::Right => {
                let Some(row) = self.row_under_cursor(dm) else {
                    return Ok(EventResponse::Handled);
                };
                if dm.tree.is_expanded(row.id) {
                    dm.tree.collapse(row.id);
                    Ok(EventResponse::Handled)
                } else if dm.tree.expand(row.id) {
                    Ok(EventResponse::Action(PanelAction::FetchChildren(row.id)))
                } else {
                    Ok(EventResponse::Handled)
                }
            }
            KeyCode::Char('h') | KeyCode::Left => {
                if let Some(row) = self.row_under_cursor(dm) {
                    dm.tree.collapse(row.id);
                }
                Ok(EventResponse::Handled)
            }
            // Show the node's diagram.
            KeyCode::Enter => match self.row_under_cursor(dm) {
                Some(row) => Ok(EventResponse::Action(PanelAction::SelectNode(row.id))),
                None => Ok(EventResponse::Handled),
            },
            // Open the node's info card.
            KeyCode::Char('i') => match self.row_under_cursor(dm) {
                Some(row) => Ok(EventResponse::Action(PanelAction::ShowInfo(row.id))),
                None => Ok(EventResponse::Handled),
            },
            _ => Ok(EventResponse::NotHandled),
        }
    }

    fn panel_type(&self) -> PanelType {
        PanelType::Tree
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
    use circinspect_common::types::{CircuitNode, EndIndex, FunctionInfo};
    use crossterm::event::KeyModifiers;
    use std::io::Write;
    use std::time::Duration;

    fn manager_with_tree() -> (tempfile::NamedTempFile, DataManager) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"x = 1\n").unwrap();
        file.flush().unwrap();
        let source = SourceBuffer::load(file.path(), Duration::ZERO).unwrap();
        let mut dm = DataManager::new(source);
        dm.tree.rebuild(vec![CircuitNode {
            name: "main".into(),
            id: 0,
            line_number: 1,
            image: None,
            arguments: Vec::new(),
            is_transform: false,
            has_children: true,
            end_index: EndIndex(-1),
            info: FunctionInfo::default(),
        }]);
        (file, dm)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_first_expansion_requests_fetch() {
        let (_f, mut dm) = manager_with_tree();
        let mut panel = TreePanel::new();
        let resp = panel.handle_key_event(key(KeyCode::Char(' ')), &mut dm).unwrap();
        assert_eq!(resp, EventResponse::Action(PanelAction::FetchChildren(0)));
        assert!(dm.tree.is_expanded(0));
    }

    #[test]
    fn test_second_toggle_collapses_without_fetch() {
        let (_f, mut dm) = manager_with_tree();
        let mut panel = TreePanel::new();
        panel.handle_key_event(key(KeyCode::Char(' ')), &mut dm).unwrap();
        let resp = panel.handle_key_event(key(KeyCode::Char(' ')), &mut dm).unwrap();
        assert_eq!(resp, EventResponse::Handled);
        assert!(!dm.tree.is_expanded(0));
    }

    #[test]
    fn test_enter_selects_node_under_cursor() {
        let (_f, mut dm) = manager_with_tree();
        let mut panel = TreePanel::new();
        let resp = panel.handle_key_event(key(KeyCode::Enter), &mut dm).unwrap();
        assert_eq!(resp, EventResponse::Action(PanelAction::SelectNode(0)));
    }
}
