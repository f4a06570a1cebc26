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

//! Main application state and event routing
//!
//! The app owns the panels and the request bookkeeping. Backend calls run
//! in spawned tasks and come back as [`BackendEvent`]s on an mpsc channel;
//! each event carries the sequence number of its request so replies
//! overtaken by newer requests on the same channel are discarded instead of
//! clobbering fresher state.

use std::sync::Arc;

use circinspect_common::error::ClientError;
use circinspect_common::types::{
    DebugAction, DebugStepResponse, ExpandResponse, Mode, NodeId, VisualizeResponse,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use eyre::Result;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config;
use crate::data::{DataManager, DebugStart};
use crate::panels::{
    CodePanel, EventResponse, OutputPanel, Panel, PanelAction, PanelType, TreePanel,
};
use crate::rpc::{ApiClient, Channel, RequestSequencer};
use crate::ui::status::status_line;

/// A completed backend call, tagged with its request sequence number.
#[derive(Debug)]
pub enum BackendEvent {
    /// `/visualizeCircuit` finished.
    Visualize {
        /// Sequence number on the visualize channel.
        seq: u64,
        /// Mode the request was sent under.
        requested_mode: Mode,
        /// Response or failure.
        result: Result<VisualizeResponse, ClientError>,
    },
    /// `/expandMethod` finished.
    Expand {
        /// Tree generation the request was spawned against.
        generation: u64,
        /// Node whose children were fetched.
        parent: NodeId,
        /// Response or failure.
        result: Result<ExpandResponse, ClientError>,
    },
    /// `/debugNext` finished.
    Step {
        /// Sequence number on the step channel.
        seq: u64,
        /// Response or failure.
        result: Result<DebugStepResponse, ClientError>,
    },
}

/// Main application state.
pub struct App {
    client: Arc<ApiClient>,
    events_tx: mpsc::UnboundedSender<BackendEvent>,
    sequencer: RequestSequencer,

    code_panel: CodePanel,
    tree_panel: TreePanel,
    output_panel: OutputPanel,
    focus: PanelType,

    /// At most one step request in flight; further step keys are ignored
    /// until it returns.
    step_in_flight: bool,
    /// One-line message shown in the status bar until the next key.
    notice: Option<String>,
    /// Backend PennyLane version, known when the login verified a token.
    pennylane_version: Option<String>,
    should_exit: bool,
}

impl App {
    /// Create the application over a connected client.
    pub fn new(
        client: Arc<ApiClient>,
        events_tx: mpsc::UnboundedSender<BackendEvent>,
        pennylane_version: Option<String>,
    ) -> Self {
        let mut app = Self {
            client,
            events_tx,
            sequencer: RequestSequencer::default(),
            code_panel: CodePanel::new(),
            tree_panel: TreePanel::new(),
            output_panel: OutputPanel::new(),
            focus: PanelType::Code,
            step_in_flight: false,
            notice: None,
            pennylane_version,
            should_exit: false,
        };
        app.code_panel.on_focus();
        app
    }

    /// Whether the user asked to quit.
    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    /// Render panels and status bar.
    pub fn render(&mut self, frame: &mut Frame<'_>, dm: &DataManager) {
        let [body, status] = split_vertical(frame.area(), Constraint::Min(3), Constraint::Length(1));
        let [left, right] = split_horizontal(body);
        let [top_right, bottom_right] =
            split_vertical(right, Constraint::Percentage(50), Constraint::Percentage(50));

        self.code_panel.render(frame, left, dm);
        self.tree_panel.render(frame, top_right, dm);
        self.output_panel.render(frame, bottom_right, dm);

        let spinner_text = {
            let spinner = self.client.spinner();
            let mut guard = spinner.write().unwrap_or_else(|e| e.into_inner());
            guard.tick();
            guard.display_text()
        };
        frame.render_widget(
            Paragraph::new(status_line(
                dm,
                spinner_text,
                self.notice.as_deref(),
                self.pennylane_version.as_deref(),
            )),
            status,
        );
    }

    /// Evaluate the current buffer immediately, bypassing the debounce.
    /// Used once at startup so the first render has a circuit.
    pub fn evaluate_now(&mut self, dm: &DataManager) {
        let text = dm.source.accepted().to_string();
        if dm.mode == Mode::RealTime && text.len() >= 5 {
            self.spawn_visualize(text, Mode::RealTime);
        }
    }

    /// Periodic work: poll the watched file and fire due evaluations.
    pub fn on_tick(&mut self, dm: &mut DataManager) {
        if let Err(err) = dm.source.poll() {
            warn!(%err, "failed to poll source file");
        }
        if let Some(text) = dm.source.take_ready() {
            if dm.mode == Mode::RealTime {
                // Too short to hold a circuit; blank the display instead
                // of bothering the backend.
                if text.len() < 5 {
                    dm.display.image = None;
                    dm.display.shown_id = None;
                } else {
                    self.spawn_visualize(text, Mode::RealTime);
                }
            }
        }
    }

    /// Handle one key event. Returns `true` when the app should exit.
    pub fn handle_key_event(&mut self, event: KeyEvent, dm: &mut DataManager) -> Result<bool> {
        if event.kind != KeyEventKind::Press {
            return Ok(false);
        }
        self.notice = None;

        // Global bindings first.
        match event.code {
            KeyCode::Char('q') => {
                self.should_exit = true;
                return Ok(true);
            }
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_exit = true;
                return Ok(true);
            }
            KeyCode::Tab => {
                self.change_focus(next_panel(self.focus));
                return Ok(false);
            }
            KeyCode::Char('m') => {
                self.toggle_mode(dm);
                return Ok(false);
            }
            KeyCode::Char('r') if dm.mode == Mode::Debugger => {
                self.start_or_stop(dm);
                return Ok(false);
            }
            _ => {}
        }

        // Step bindings while a run is active.
        if dm.session.is_running() {
            let action = match event.code {
                KeyCode::Char('c') => Some(DebugAction::NextBreakpoint),
                KeyCode::Char('C') => Some(DebugAction::PrevBreakpoint),
                KeyCode::Char('n') => Some(DebugAction::StepOver),
                KeyCode::Char('s') => Some(DebugAction::StepInto),
                KeyCode::Char('o') => Some(DebugAction::StepOut),
                KeyCode::Char('R') => Some(DebugAction::Restart),
                _ => None,
            };
            if let Some(action) = action {
                self.spawn_step(dm, action);
                return Ok(false);
            }
        }

        // Everything else goes to the focused panel.
        let response = match self.focus {
            PanelType::Code => self.code_panel.handle_key_event(event, dm)?,
            PanelType::Tree => self.tree_panel.handle_key_event(event, dm)?,
            PanelType::Output => self.output_panel.handle_key_event(event, dm)?,
        };
        match response {
            EventResponse::Action(action) => self.dispatch(action, dm),
            EventResponse::ChangeFocus(panel) => self.change_focus(panel),
            EventResponse::Exit => {
                self.should_exit = true;
                return Ok(true);
            }
            EventResponse::Handled => {}
            EventResponse::NotHandled => debug!(?event, "unhandled key event"),
        }
        Ok(false)
    }

    /// Fold a finished backend call into the state, discarding replies
    /// overtaken by newer requests on their channel.
    pub fn handle_backend_event(&mut self, event: BackendEvent, dm: &mut DataManager) {
        match event {
            BackendEvent::Visualize { seq, requested_mode, result } => {
                if !self.sequencer.is_current(Channel::Visualize, seq) {
                    debug!(seq, "discarding stale visualize response");
                    return;
                }
                match result {
                    Ok(resp) => {
                        // Evaluation errors keep the previous tree, so
                        // in-flight expansions for it stay valid.
                        if resp.error.is_none() {
                            self.bump_tree_generation();
                        }
                        dm.apply_visualize(&resp, requested_mode);
                        self.refetch_expansions(dm);
                    }
                    Err(err) => self.backend_failure(err),
                }
            }
            BackendEvent::Expand { generation, parent, result } => {
                if !self.sequencer.is_current(Channel::Expand, generation) {
                    debug!(parent, "discarding expansion for a rebuilt tree");
                    return;
                }
                match result {
                    Ok(resp) => dm.apply_expand(parent, &resp.children),
                    Err(err) => self.backend_failure(err),
                }
            }
            BackendEvent::Step { seq, result } => {
                self.step_in_flight = false;
                if !self.sequencer.is_current(Channel::DebugStep, seq) {
                    debug!(seq, "discarding stale step response");
                    return;
                }
                match result {
                    Ok(resp) => {
                        self.bump_tree_generation();
                        dm.apply_step(&resp);
                        self.refetch_expansions(dm);
                    }
                    Err(err) => self.backend_failure(err),
                }
            }
        }
    }

    /// Change panel focus.
    pub fn change_focus(&mut self, panel: PanelType) {
        if self.focus == panel {
            return;
        }
        match self.focus {
            PanelType::Code => self.code_panel.on_blur(),
            PanelType::Tree => self.tree_panel.on_blur(),
            PanelType::Output => self.output_panel.on_blur(),
        }
        self.focus = panel;
        match self.focus {
            PanelType::Code => self.code_panel.on_focus(),
            PanelType::Tree => self.tree_panel.on_focus(),
            PanelType::Output => self.output_panel.on_focus(),
        }
    }

    fn dispatch(&mut self, action: PanelAction, dm: &mut DataManager) {
        match action {
            PanelAction::FetchChildren(id) => self.spawn_expand(dm, id),
            PanelAction::SelectNode(id) => {
                if let Some(node) = dm.select_node(id) {
                    let client = self.client.clone();
                    tokio::spawn(async move { client.display_circuit(node).await });
                }
            }
            PanelAction::ShowInfo(id) => {
                if let Some(node) = dm.tree.node(id).cloned() {
                    let client = self.client.clone();
                    tokio::spawn(async move { client.display_func_info(node).await });
                }
            }
            PanelAction::ToggleBreakpoint(line) => {
                let set = dm.toggle_breakpoint(line);
                debug!(line, set, "breakpoint toggled");
            }
            PanelAction::Step(action) => self.spawn_step(dm, action),
        }
    }

    fn toggle_mode(&mut self, dm: &mut DataManager) {
        let new_mode = match dm.mode {
            Mode::RealTime => Mode::Debugger,
            Mode::Debugger => Mode::RealTime,
        };
        let wants_evaluation = dm.set_mode(new_mode);
        self.bump_tree_generation();
        info!(%new_mode, "mode switched");

        let client = self.client.clone();
        tokio::spawn(async move {
            match new_mode {
                Mode::Debugger => client.enter_debugger_mode().await,
                Mode::RealTime => client.enter_real_time_mode().await,
            }
        });

        if wants_evaluation {
            let text = dm.source.accepted().to_string();
            if text.len() >= 5 {
                self.spawn_visualize(text, Mode::RealTime);
            }
        }
    }

    fn start_or_stop(&mut self, dm: &mut DataManager) {
        self.bump_tree_generation();
        match dm.start_or_stop_debugger() {
            DebugStart::LocalReset => info!("debug run stopped"),
            DebugStart::Evaluate(text) => self.spawn_visualize(text, Mode::Debugger),
        }
    }

    fn spawn_visualize(&mut self, text: String, mode: Mode) {
        let seq = self.sequencer.next(Channel::Visualize);
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.visualize(text, mode).await;
            let _ = tx.send(BackendEvent::Visualize { seq, requested_mode: mode, result });
        });
    }

    fn spawn_expand(&mut self, dm: &DataManager, id: NodeId) {
        let Some(node) = dm.tree.node(id).cloned() else { return };
        let generation = self.sequencer.current(Channel::Expand);
        let real_time = dm.mode == Mode::RealTime;
        let ctx = dm.exec_context().clone();
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.expand(&node, real_time, &ctx).await;
            let _ = tx.send(BackendEvent::Expand { generation, parent: id, result });
        });
    }

    fn spawn_step(&mut self, dm: &DataManager, action: DebugAction) {
        if self.step_in_flight {
            debug!(?action, "step already in flight, ignoring");
            return;
        }
        self.step_in_flight = true;
        let seq = self.sequencer.next(Channel::DebugStep);
        let breakpoints = dm.breakpoints.wire_format();
        let ctx = dm.session.context().clone();
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.debug_next(breakpoints, &ctx, action).await;
            let _ = tx.send(BackendEvent::Step { seq, result });
        });
    }

    /// Restore subtrees that were open before a rebuild discarded them.
    fn refetch_expansions(&mut self, dm: &DataManager) {
        for id in dm.tree.pending_expansions() {
            self.spawn_expand(dm, id);
        }
    }

    /// Invalidate in-flight expansions; the tree they were fetched for is
    /// gone.
    fn bump_tree_generation(&mut self) {
        self.sequencer.next(Channel::Expand);
    }

    fn backend_failure(&mut self, err: ClientError) {
        match &err {
            ClientError::Auth(_) => {
                config::clear_token();
                self.notice =
                    Some("session expired, restart and log in again".to_string());
                error!(%err, "authentication failure");
            }
            _ => {
                self.notice = Some(err.to_string());
                error!(%err, "backend call failed");
            }
        }
    }
}

fn next_panel(panel: PanelType) -> PanelType {
    match panel {
        PanelType::Code => PanelType::Tree,
        PanelType::Tree => PanelType::Output,
        PanelType::Output => PanelType::Code,
    }
}

fn split_vertical(area: Rect, top: Constraint, bottom: Constraint) -> [Rect; 2] {
    let chunks =
        Layout::default().direction(Direction::Vertical).constraints([top, bottom]).split(area);
    [chunks[0], chunks[1]]
}

fn split_horizontal(area: Rect) -> [Rect; 2] {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    [chunks[0], chunks[1]]
}
