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

//! Unified data manager for the TUI
//!
//! The [`DataManager`] is the central hub for client state. It owns the
//! watched source buffer, the call tree, the breakpoint set, the debug
//! session, and the display state, and it is the single place where backend
//! responses are folded into that state. Panels read from it; the app loop
//! mutates it.

pub mod breakpoint;
pub mod debug;
pub mod filter;
pub mod source;
pub mod tree;

use circinspect_common::error::EvalError;
use circinspect_common::types::{
    ChildNode, CircuitNode, DebugStepResponse, EndIndex, Mode, NodeId, VisualizeResponse,
};
use circinspect_common::NO_LINE;
use tracing::debug;

use self::breakpoint::BreakpointSet;
use self::debug::{DebugContext, DebugSession};
use self::source::SourceBuffer;
use self::tree::TreeState;

/// What pressing the start/stop key does, decided by the run state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugStart {
    /// An active run was abandoned locally; nothing to send.
    LocalReset,
    /// A run must be started by evaluating this source text in debugger
    /// mode.
    Evaluate(String),
}

/// The circuit diagram currently shown in the output panel.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    /// Base64 diagram payload, rendered backend-side.
    pub image: Option<String>,
    /// Node whose diagram is shown, if any.
    pub shown_id: Option<NodeId>,
}

/// Central state hub, passed as a mutable reference to all app functions.
pub struct DataManager {
    /// Watched source file.
    pub source: SourceBuffer,
    /// Call tree of the last evaluation or debug step.
    pub tree: TreeState,
    /// Breakpoints for the debugger.
    pub breakpoints: BreakpointSet,
    /// Debug run state machine.
    pub session: DebugSession,
    /// Output panel state.
    pub display: DisplayState,
    /// Current operating mode.
    pub mode: Mode,
    /// Last evaluation error, if any.
    pub error: Option<EvalError>,
    /// Source line highlighted in the code panel, or [`NO_LINE`].
    pub highlight_line: i64,
    /// Execution context of the last successful evaluation, echoed on
    /// expansion requests.
    ctx: DebugContext,
}

impl DataManager {
    /// Create a manager over a loaded source buffer, starting in real-time
    /// mode.
    pub fn new(source: SourceBuffer) -> Self {
        Self {
            source,
            tree: TreeState::new(),
            breakpoints: BreakpointSet::new(),
            session: DebugSession::new(),
            display: DisplayState::default(),
            mode: Mode::RealTime,
            error: None,
            highlight_line: NO_LINE,
            ctx: DebugContext::default(),
        }
    }

    /// Execution context for expansion requests.
    pub fn exec_context(&self) -> &DebugContext {
        &self.ctx
    }

    /// Fold a `/visualizeCircuit` response into the state.
    ///
    /// `requested_mode` is the mode the request was sent under, which may
    /// differ from the current mode if the user switched while it was in
    /// flight; stale responses are discarded before this is called.
    pub fn apply_visualize(&mut self, resp: &VisualizeResponse, requested_mode: Mode) {
        self.error = None;
        if let Some(err) = &resp.error {
            self.highlight_line = err.line;
            self.error = Some(err.clone());
            debug!(%err, "evaluation failed");
            return;
        }
        self.highlight_line = NO_LINE;
        self.ctx = DebugContext {
            device_name: resp.device_name.clone(),
            commands: resp.commands.clone(),
            debug_index: resp.debug_index,
            num_wires: resp.num_wires,
            num_shots: resp.num_shots,
        };

        match requested_mode {
            Mode::RealTime => {
                let mut roots: Vec<CircuitNode> =
                    resp.transform_details.iter().map(CircuitNode::from_transform).collect();
                roots.push(CircuitNode {
                    name: resp.name.clone(),
                    id: resp.id,
                    line_number: resp.line_number,
                    image: resp.image.clone(),
                    arguments: resp.arguments.clone(),
                    is_transform: false,
                    has_children: resp.has_children,
                    end_index: EndIndex::default(),
                    info: resp.info.clone(),
                });
                self.tree.rebuild(roots);
                self.tree.select(resp.id);
                self.display.image = resp.image.clone();
                self.display.shown_id = Some(resp.id);
            }
            Mode::Debugger => {
                // The evaluation only primes the run; the tree is built
                // step by step from `/debugNext` responses.
                self.session.begin(resp);
                self.source.set_read_only(true);
            }
        }
    }

    /// Fold a `/debugNext` response into the state.
    pub fn apply_step(&mut self, resp: &DebugStepResponse) {
        let update = self.session.apply_step(resp, &self.breakpoints);
        self.ctx.debug_index = resp.debug_index;
        self.highlight_line = update.highlight_line;

        let user_selection = self.tree.selected();
        self.tree.rebuild(update.roots);
        match user_selection {
            // No explicit pick: the display follows the stepped node.
            None => {
                self.display.image = update.image;
                self.display.shown_id = Some(update.fresh_id);
            }
            // Refresh the picked node's diagram if it survived the step.
            Some(id) => {
                if let Some(node) = self.tree.node(id) {
                    self.display.image = node.image.clone();
                }
            }
        }

        if update.concluded {
            self.source.set_read_only(false);
        }
    }

    /// Fold an `/expandMethod` response into the tree.
    ///
    /// Children inherit the parent's scope end, which the backend expects
    /// echoed when they are expanded in turn.
    pub fn apply_expand(&mut self, parent: NodeId, children: &[ChildNode]) {
        let end_index =
            self.tree.node(parent).map(|n| n.end_index).unwrap_or_default();
        let children: Vec<CircuitNode> = children
            .iter()
            .map(|child| CircuitNode {
                name: child.name.clone(),
                id: child.id,
                line_number: child.line_number,
                image: child.image.clone(),
                arguments: Vec::new(),
                is_transform: false,
                has_children: child.has_children,
                end_index,
                info: child.info.clone(),
            })
            .collect();
        self.tree.set_children(parent, children);

        // Re-render the picked diagram in case the expansion refreshed it.
        if let Some(id) = self.tree.selected() {
            if let Some(node) = self.tree.node(id) {
                self.display.image = node.image.clone();
            }
        }
    }

    /// User picked a node: show its diagram and select it.
    pub fn select_node(&mut self, id: NodeId) -> Option<CircuitNode> {
        let node = self.tree.node(id).cloned()?;
        self.tree.select(id);
        self.display.image = node.image.clone();
        self.display.shown_id = Some(id);
        Some(node)
    }

    /// Start or stop a debug run.
    ///
    /// Stopping an active run is purely local; starting one requires an
    /// evaluation round-trip, for which the source text is returned.
    pub fn start_or_stop_debugger(&mut self) -> DebugStart {
        self.display = DisplayState::default();
        self.tree.clear();
        self.highlight_line = NO_LINE;
        if self.session.is_running() {
            self.session.reset();
            self.source.set_read_only(false);
            DebugStart::LocalReset
        } else {
            DebugStart::Evaluate(self.source.accepted().to_string())
        }
    }

    /// Switch operating mode, dropping all evaluation state. Returns
    /// `true` when the new mode wants an immediate evaluation.
    ///
    /// Breakpoints survive a switch into debugger mode but are cleared on
    /// the way back to real-time, where they have no meaning.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.tree.clear();
        self.display = DisplayState::default();
        self.error = None;
        self.highlight_line = NO_LINE;
        self.session.reset();
        self.source.set_read_only(false);
        if mode == Mode::RealTime {
            self.breakpoints.clear();
            return true;
        }
        false
    }

    /// Toggle a breakpoint at the highlighted source line.
    pub fn toggle_breakpoint(&mut self, line: i64) -> bool {
        self.breakpoints.toggle(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circinspect_common::types::{FunctionInfo, TransformDetail};
    use std::io::Write;
    use std::time::Duration;

    fn manager() -> (tempfile::NamedTempFile, DataManager) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"import pennylane as qml\n").unwrap();
        file.flush().unwrap();
        let source = SourceBuffer::load(file.path(), Duration::ZERO).unwrap();
        (file, DataManager::new(source))
    }

    fn visualize_resp() -> VisualizeResponse {
        VisualizeResponse {
            name: "my_circuit".into(),
            id: 0,
            image: Some("bWFpbg==".into()),
            line_number: 4,
            has_children: true,
            info: FunctionInfo {
                arguments: Some(vec![]),
                output: Some("tensor(1.0)".into()),
            },
            transform_details: vec![TransformDetail::new(
                "dHJm",
                Some("out".into()),
                "merge_rotations",
                9,
                2,
            )],
            device_name: "default.qubit".into(),
            commands: "c0ffee".into(),
            debug_index: -1,
            num_wires: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn test_real_time_visualize_builds_roots_and_selects_main() {
        let (_f, mut dm) = manager();
        dm.apply_visualize(&visualize_resp(), Mode::RealTime);

        // Transform pseudo-nodes precede the main node.
        let rows = dm.tree.visible_rows();
        assert_eq!(rows.len(), 2);
        assert!(dm.tree.node(rows[0].id).unwrap().is_transform);
        assert_eq!(rows[1].id, 0);
        assert!(dm.tree.is_selected(0));
        assert_eq!(dm.display.image.as_deref(), Some("bWFpbg=="));
        assert_eq!(dm.highlight_line, NO_LINE);
        assert_eq!(dm.exec_context().device_name, "default.qubit");
    }

    #[test]
    fn test_error_response_highlights_and_keeps_tree() {
        let (_f, mut dm) = manager();
        dm.apply_visualize(&visualize_resp(), Mode::RealTime);

        let mut failed = VisualizeResponse::default();
        failed.error = Some(EvalError::from_pair("SyntaxError".into(), " line 7".into()));
        dm.apply_visualize(&failed, Mode::RealTime);

        assert!(dm.error.is_some());
        assert_eq!(dm.highlight_line, 7);
        // Last good tree and diagram stay on screen.
        assert!(!dm.tree.is_empty());
        assert!(dm.display.image.is_some());
    }

    #[test]
    fn test_debugger_visualize_primes_run_without_tree() {
        let (_f, mut dm) = manager();
        dm.mode = Mode::Debugger;
        dm.apply_visualize(&visualize_resp(), Mode::Debugger);

        assert!(dm.session.is_running());
        assert!(dm.source.is_read_only());
        assert!(dm.tree.is_empty());
    }

    #[test]
    fn test_step_follows_fresh_node_without_user_selection() {
        let (_f, mut dm) = manager();
        dm.mode = Mode::Debugger;
        dm.apply_visualize(&visualize_resp(), Mode::Debugger);

        let resp = DebugStepResponse {
            debug_index: 2,
            id: 1,
            name: "sub".into(),
            line_number: 8,
            image: Some("c3RlcA==".into()),
            line_number_to_highlight: 8,
            ..Default::default()
        };
        dm.apply_step(&resp);
        assert_eq!(dm.display.image.as_deref(), Some("c3RlcA=="));
        assert_eq!(dm.display.shown_id, Some(1));
        assert_eq!(dm.highlight_line, 8);
        // Auto-follow continues because the user never picked a node.
        assert_eq!(dm.tree.selected(), None);
    }

    #[test]
    fn test_step_respects_user_selection() {
        let (_f, mut dm) = manager();
        dm.mode = Mode::Debugger;
        dm.apply_visualize(&visualize_resp(), Mode::Debugger);
        let resp = DebugStepResponse {
            id: 1,
            name: "sub".into(),
            image: Some("YQ==".into()),
            line_number_to_highlight: 8,
            ..Default::default()
        };
        dm.apply_step(&resp);
        dm.select_node(1).unwrap();

        // The picked node survives the next step with a fresh diagram.
        let resp = DebugStepResponse {
            id: 1,
            name: "sub".into(),
            image: Some("Yg==".into()),
            line_number_to_highlight: 9,
            ..Default::default()
        };
        dm.apply_step(&resp);
        assert_eq!(dm.display.image.as_deref(), Some("Yg=="));

        // A step that drops the picked node leaves the diagram alone.
        let resp = DebugStepResponse {
            id: 2,
            name: "other".into(),
            image: Some("Yw==".into()),
            line_number_to_highlight: 10,
            ..Default::default()
        };
        dm.apply_step(&resp);
        assert_eq!(dm.display.image.as_deref(), Some("Yg=="));
    }

    #[test]
    fn test_expand_inherits_parent_end_index() {
        let (_f, mut dm) = manager();
        dm.apply_visualize(&visualize_resp(), Mode::RealTime);
        if let Some(node) = dm.tree.node(0) {
            assert_eq!(node.end_index, EndIndex(-1));
        }
        dm.tree.expand(0);
        dm.apply_expand(
            0,
            &[ChildNode {
                name: "sub".into(),
                id: 5,
                line_number: 9,
                image: Some("c3Vi".into()),
                info: FunctionInfo::default(),
                has_children: true,
            }],
        );
        assert_eq!(dm.tree.node(5).unwrap().end_index, EndIndex(-1));
    }

    #[test]
    fn test_stop_active_run_is_local() {
        let (_f, mut dm) = manager();
        dm.mode = Mode::Debugger;
        dm.apply_visualize(&visualize_resp(), Mode::Debugger);
        assert!(dm.session.is_running());

        assert_eq!(dm.start_or_stop_debugger(), DebugStart::LocalReset);
        assert!(!dm.session.is_running());
        assert!(!dm.source.is_read_only());
        assert!(dm.tree.is_empty());
    }

    #[test]
    fn test_start_requests_evaluation_of_accepted_text() {
        let (_f, mut dm) = manager();
        dm.mode = Mode::Debugger;
        match dm.start_or_stop_debugger() {
            DebugStart::Evaluate(text) => assert_eq!(text, "import pennylane as qml\n"),
            other => panic!("expected evaluation, got {other:?}"),
        }
    }

    #[test]
    fn test_mode_switch_drops_evaluation_state() {
        let (_f, mut dm) = manager();
        dm.apply_visualize(&visualize_resp(), Mode::RealTime);

        assert!(!dm.set_mode(Mode::RealTime), "no-op switch");
        assert!(!dm.set_mode(Mode::Debugger), "debugger waits for start");
        assert!(dm.tree.is_empty());
        assert!(dm.display.image.is_none());

        assert!(dm.set_mode(Mode::RealTime), "real-time re-evaluates");
    }

    #[test]
    fn test_entering_real_time_clears_breakpoints() {
        let (_f, mut dm) = manager();
        dm.set_mode(Mode::Debugger);
        dm.toggle_breakpoint(3);
        dm.toggle_breakpoint(5);

        // Breakpoints only mean something to the debugger; leaving it
        // drops them.
        dm.set_mode(Mode::RealTime);
        assert_eq!(dm.breakpoints.count(), 0);

        // Coming back starts from a clean set.
        dm.set_mode(Mode::Debugger);
        assert!(!dm.breakpoints.contains(3));
    }
}
