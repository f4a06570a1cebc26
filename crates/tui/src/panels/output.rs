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

//! Output panel with the shown node's info card
//!
//! The diagram itself is a backend-rendered PNG carried as base64; a
//! terminal cannot draw it, so the panel shows the card (name, arguments,
//! output) plus diagram metadata, and the evaluation error when there is
//! one.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use eyre::Result;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{EventResponse, Panel, PanelType};
use crate::data::DataManager;

/// Output panel implementation.
#[derive(Debug, Default)]
pub struct OutputPanel {
    scroll: u16,
    focused: bool,
}

impl OutputPanel {
    /// Create a new output panel.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Panel for OutputPanel {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &DataManager) {
        let mut lines: Vec<Line<'_>> = Vec::new();

        if let Some(err) = &dm.error {
            lines.push(Line::from(Span::styled(
                err.to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        } else if let Some(node) = dm.display.shown_id.and_then(|id| dm.tree.node(id)) {
            lines.push(Line::from(Span::styled(
                node.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            if let Some(args) = &node.info.arguments {
                lines.push(Line::from(Span::styled(
                    "Arguments",
                    Style::default().fg(Color::Cyan),
                )));
                if args.is_empty() {
                    lines.push(Line::from("  (none)"));
                }
                for (name, value) in args {
                    lines.push(Line::from(format!("  {name} = {value}")));
                }
            }
            if let Some(output) = &node.info.output {
                lines.push(Line::from(Span::styled("Output", Style::default().fg(Color::Cyan))));
                for part in output.split('\n') {
                    lines.push(Line::from(format!("  {part}")));
                }
            }
            lines.push(Line::from(""));
            match &dm.display.image {
                Some(payload) => lines.push(Line::from(Span::styled(
                    format!("diagram: {} base64 bytes (rendered backend-side)", payload.len()),
                    Style::default().fg(Color::DarkGray),
                ))),
                None => lines.push(Line::from(Span::styled(
                    "no diagram",
                    Style::default().fg(Color::DarkGray),
                ))),
            }
            let ctx = dm.exec_context();
            if !ctx.device_name.is_empty() {
                let shots = match ctx.num_shots {
                    Some(shots) => shots.to_string(),
                    None => "analytic".to_string(),
                };
                lines.push(Line::from(Span::styled(
                    format!(
                        "device {}  wires {}  shots {shots}",
                        ctx.device_name,
                        ctx.num_wires.map(|w| w.to_string()).unwrap_or_else(|| "?".into()),
                    ),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        } else {
            lines.push(Line::from(Span::styled(
                "no circuit evaluated yet",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default().borders(Borders::ALL).border_style(border_style).title(" Circuit "),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn handle_key_event(
        &mut self,
        event: KeyEvent,
        _dm: &mut DataManager,
    ) -> Result<EventResponse> {
        if event.kind != KeyEventKind::Press {
            return Ok(EventResponse::NotHandled);
        }
        match event.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1);
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                Ok(EventResponse::Handled)
            }
            _ => Ok(EventResponse::NotHandled),
        }
    }

    fn panel_type(&self) -> PanelType {
        PanelType::Output
    }

    fn on_focus(&mut self) {
        self.focused = true;
    }

    fn on_blur(&mut self) {
        self.focused = false;
    }
}
