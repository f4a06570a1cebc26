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

//! Bottom status bar

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::data::DataManager;

/// Build the one-line status bar: mode, run state, breakpoints, the most
/// pressing of notice, spinner, evaluation error, or the key hints, and
/// the backend's PennyLane version when the login verified one.
pub fn status_line<'a>(
    dm: &DataManager,
    spinner_text: String,
    notice: Option<&str>,
    pennylane: Option<&str>,
) -> Line<'a> {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", dm.mode),
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];

    if dm.session.is_running() {
        spans.push(Span::styled("● running", Style::default().fg(Color::Green)));
        spans.push(Span::raw("  "));
    }

    if dm.breakpoints.count() > 0 {
        spans.push(Span::styled(
            format!("{} bp", dm.breakpoints.count()),
            Style::default().fg(Color::Red),
        ));
        spans.push(Span::raw("  "));
    }

    if let Some(notice) = notice {
        spans.push(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    } else if !spinner_text.is_empty() {
        spans.push(Span::styled(spinner_text, Style::default().fg(Color::Yellow)));
    } else if let Some(err) = &dm.error {
        spans.push(Span::styled(err.to_string(), Style::default().fg(Color::Red)));
    } else {
        spans.push(Span::styled(
            "q quit · m mode · r run · b breakpoint · tab focus",
            Style::default().fg(Color::DarkGray),
        ));
    }

    if let Some(version) = pennylane {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("pennylane {version}"),
            Style::default().fg(Color::DarkGray),
        ));
    }

    Line::from(spans)
}
