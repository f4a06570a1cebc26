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

//! Debugger run state and the step reconciliation algorithm
//!
//! A debug run is bracketed by a `/visualizeCircuit` call that captures the
//! execution context (device, serialized commands, trace index, wire and
//! shot counts) and a transform replay queue. Every `/debugNext` response
//! is folded through [`DebugSession::apply_step`], which rebuilds the tree
//! roots and decides where the code highlight goes. The backend only walks
//! the function trace; transform steps are replayed client-side from the
//! queue captured at run start.

use std::collections::HashSet;

use circinspect_common::types::{
    CircuitNode, DebugStepResponse, FunctionInfo, NodeId, TransformDetail, VisualizeResponse,
};
use circinspect_common::NO_LINE;
use tracing::debug;

use crate::data::breakpoint::BreakpointSet;

/// Whether a debug run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugState {
    /// No active run; the source buffer is editable.
    #[default]
    NotStarted,
    /// A run is active; the source buffer is read-only.
    Running,
}

/// Execution context captured from the `/visualizeCircuit` response that
/// started the run, echoed on every `/debugNext` call.
#[derive(Debug, Clone, Default)]
pub struct DebugContext {
    /// Device the circuit ran on.
    pub device_name: String,
    /// Opaque serialized execution state.
    pub commands: String,
    /// Trace index the run is currently at.
    pub debug_index: i64,
    /// Number of wires.
    pub num_wires: Option<u64>,
    /// Number of shots.
    pub num_shots: Option<u64>,
}

/// What one reconciled step means for the rest of the client state.
#[derive(Debug, Clone)]
pub struct StepUpdate {
    /// New tree roots: replayed transform pseudo-nodes in queue order,
    /// then the node execution stopped in.
    pub roots: Vec<CircuitNode>,
    /// Source line to highlight, or [`NO_LINE`].
    pub highlight_line: i64,
    /// The run walked past the last transform and is over.
    pub concluded: bool,
    /// Id of the node execution stopped in.
    pub fresh_id: NodeId,
    /// Diagram reported for that node.
    pub image: Option<String>,
}

/// State machine for one debugger run.
#[derive(Debug, Clone, Default)]
pub struct DebugSession {
    state: DebugState,
    context: DebugContext,
    /// Info card of the main function, captured at run start. Step
    /// responses do not carry argument details, so this card fills in.
    main_info: FunctionInfo,
    /// Transform replay queue in trace order.
    transforms: Vec<TransformDetail>,
    /// Replay cursor, walking the queue back to front. `-1` once the
    /// queue is exhausted.
    cursor: i64,
    /// Breakpoint lines already paused at during this run's replay. A
    /// breakpointed transform pauses once, then replays through.
    seen: HashSet<i64>,
    /// Execution has left the function trace and only transforms remain.
    replaying: bool,
}

impl DebugSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a run is active.
    pub fn is_running(&self) -> bool {
        self.state == DebugState::Running
    }

    /// Execution context for the next `/debugNext` request.
    pub fn context(&self) -> &DebugContext {
        &self.context
    }

    /// Start a run from the visualize response that evaluated the code in
    /// debugger mode.
    pub fn begin(&mut self, resp: &VisualizeResponse) {
        self.context = DebugContext {
            device_name: resp.device_name.clone(),
            commands: resp.commands.clone(),
            debug_index: resp.debug_index,
            num_wires: resp.num_wires,
            num_shots: resp.num_shots,
        };
        self.main_info = resp.info.clone();
        self.transforms = resp.transform_details.clone();
        self.cursor = self.transforms.len() as i64 - 1;
        self.seen.clear();
        self.replaying = false;
        self.state = DebugState::Running;
        debug!(
            transforms = self.transforms.len(),
            debug_index = resp.debug_index,
            "debug run started"
        );
    }

    /// Abandon the run without contacting the backend. Used when the user
    /// stops an active run; the next start re-evaluates from scratch.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold a `/debugNext` response into the session.
    ///
    /// While execution is inside the function trace the response names a
    /// single node and a line to highlight. Once the backend reports
    /// `line_number_to_highlight == -1` the trace is exhausted and the
    /// remaining transform queue is replayed locally: entries stream past
    /// unless their line holds a breakpoint not yet paused at, in which
    /// case the replay pauses there. Walking past the front of the queue
    /// concludes the run.
    pub fn apply_step(
        &mut self,
        resp: &DebugStepResponse,
        breakpoints: &BreakpointSet,
    ) -> StepUpdate {
        self.context.debug_index = resp.debug_index;

        let in_replay_tail = resp.line_number_to_highlight == NO_LINE;
        let mut node = CircuitNode {
            name: resp.name.clone(),
            id: resp.id,
            line_number: resp.line_number,
            image: resp.image.clone(),
            arguments: resp.arguments.clone(),
            is_transform: false,
            has_children: resp.has_children,
            end_index: resp.end_idx,
            info: FunctionInfo {
                arguments: self.main_info.arguments.clone(),
                output: resp.circuit_output.clone(),
            },
        };

        let mut update = StepUpdate {
            roots: Vec::new(),
            highlight_line: resp.line_number_to_highlight,
            concluded: false,
            fresh_id: resp.id,
            image: resp.image.clone(),
        };

        if in_replay_tail {
            // The step endpoint reports no per-function details past the
            // trace end; show the main function's card instead.
            node.info = self.main_info.clone();
            self.replaying = true;
        }

        if self.replaying {
            if self.transforms.is_empty() {
                self.conclude(&mut update);
            } else {
                self.replay(breakpoints, &mut update);
            }
        }

        // Replayed pseudo-nodes precede the live node in trace order.
        update.roots.push(node);
        update
    }

    /// Walk the queue backwards from the cursor, prepending pseudo-nodes
    /// until a fresh breakpointed transform pauses the replay or the queue
    /// runs out.
    fn replay(&mut self, breakpoints: &BreakpointSet, update: &mut StepUpdate) {
        while self.cursor >= 0 {
            let detail = &self.transforms[self.cursor as usize];
            let line = detail.line();
            if breakpoints.contains(line) && !self.seen.contains(&line) {
                self.seen.insert(line);
                update.highlight_line = line;
                debug!(line, name = detail.name(), "replay paused at transform");
                return;
            }
            update.roots.insert(0, CircuitNode::from_transform(detail));
            self.cursor -= 1;
        }
        self.conclude(update);
    }

    fn conclude(&mut self, update: &mut StepUpdate) {
        update.concluded = true;
        self.state = DebugState::NotStarted;
        debug!("debug run concluded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circinspect_common::types::EndIndex;

    fn visualize_resp(transforms: Vec<TransformDetail>) -> VisualizeResponse {
        VisualizeResponse {
            name: "my_circuit".into(),
            id: 0,
            image: Some("aW1n".into()),
            line_number: 4,
            has_children: true,
            info: FunctionInfo {
                arguments: Some(vec![("theta".into(), serde_json::json!(0.5))]),
                output: Some("tensor(1.0)".into()),
            },
            device_name: "default.qubit".into(),
            commands: "c0ffee".into(),
            debug_index: -1,
            num_wires: Some(2),
            transform_details: transforms,
            ..Default::default()
        }
    }

    fn step_resp(line_to_highlight: i64) -> DebugStepResponse {
        DebugStepResponse {
            debug_index: 3,
            id: 1,
            name: "sub_circuit".into(),
            line_number: 9,
            image: Some("c3Vi".into()),
            has_children: false,
            circuit_output: Some("tensor(0.25)".into()),
            end_idx: EndIndex(5),
            line_number_to_highlight: line_to_highlight,
            ..Default::default()
        }
    }

    #[test]
    fn test_step_inside_trace_builds_single_root() {
        let mut session = DebugSession::new();
        session.begin(&visualize_resp(vec![]));

        let update = session.apply_step(&step_resp(9), &BreakpointSet::new());
        assert_eq!(update.roots.len(), 1);
        assert_eq!(update.highlight_line, 9);
        assert!(!update.concluded);
        assert!(session.is_running());

        let node = &update.roots[0];
        assert_eq!(node.id, 1);
        assert_eq!(node.end_index, EndIndex(5));
        // Output comes from the step, arguments from the run-start card.
        assert_eq!(node.info.output.as_deref(), Some("tensor(0.25)"));
        assert!(node.info.arguments.is_some());
    }

    #[test]
    fn test_step_updates_trace_index() {
        let mut session = DebugSession::new();
        session.begin(&visualize_resp(vec![]));
        session.apply_step(&step_resp(9), &BreakpointSet::new());
        assert_eq!(session.context().debug_index, 3);
    }

    #[test]
    fn test_trace_end_without_transforms_concludes() {
        let mut session = DebugSession::new();
        session.begin(&visualize_resp(vec![]));

        let update = session.apply_step(&step_resp(NO_LINE), &BreakpointSet::new());
        assert!(update.concluded);
        assert!(!session.is_running());
        assert_eq!(update.highlight_line, NO_LINE);
        // The card falls back to the main function's.
        assert_eq!(update.roots[0].info.output.as_deref(), Some("tensor(1.0)"));
    }

    #[test]
    fn test_replay_streams_unbreakpointed_transforms() {
        let transforms = vec![
            TransformDetail::new("dDE=", Some("o1".into()), "cancel_inverses", 10, 6),
            TransformDetail::new("dDI=", Some("o2".into()), "merge_rotations", 11, 7),
        ];
        let mut session = DebugSession::new();
        session.begin(&visualize_resp(transforms));

        let update = session.apply_step(&step_resp(NO_LINE), &BreakpointSet::new());
        assert!(update.concluded);
        // Queue order first, live node last.
        let names: Vec<&str> = update.roots.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["cancel_inverses", "merge_rotations", "sub_circuit"]);
        assert!(update.roots[0].is_transform);
        assert!(update.roots[1].is_transform);
    }

    #[test]
    fn test_replay_pauses_at_fresh_breakpoint() {
        let transforms = vec![
            TransformDetail::new("dDE=", None, "cancel_inverses", 10, 6),
            TransformDetail::new("dDI=", None, "merge_rotations", 11, 7),
        ];
        let mut session = DebugSession::new();
        session.begin(&visualize_resp(transforms));
        let mut bps = BreakpointSet::new();
        bps.toggle(7);

        // Walks from the back of the queue and stops on line 7 first.
        let update = session.apply_step(&step_resp(NO_LINE), &bps);
        assert!(!update.concluded);
        assert!(session.is_running());
        assert_eq!(update.highlight_line, 7);
        assert_eq!(update.roots.len(), 1);

        // A breakpoint pauses once per run; the next step replays the
        // rest of the queue and concludes.
        let update = session.apply_step(&step_resp(NO_LINE), &bps);
        assert!(update.concluded);
        let names: Vec<&str> = update.roots.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["cancel_inverses", "merge_rotations", "sub_circuit"]);
    }

    #[test]
    fn test_restart_clears_replay_bookkeeping() {
        let transforms = vec![TransformDetail::new("dA==", None, "merge_rotations", 11, 7)];
        let mut session = DebugSession::new();
        session.begin(&visualize_resp(transforms.clone()));
        let mut bps = BreakpointSet::new();
        bps.toggle(7);
        session.apply_step(&step_resp(NO_LINE), &bps);

        // A fresh run must pause at the same breakpoint again.
        session.begin(&visualize_resp(transforms));
        let update = session.apply_step(&step_resp(NO_LINE), &bps);
        assert!(!update.concluded);
        assert_eq!(update.highlight_line, 7);
    }

    #[test]
    fn test_reset_abandons_run_locally() {
        let mut session = DebugSession::new();
        session.begin(&visualize_resp(vec![]));
        assert!(session.is_running());
        session.reset();
        assert!(!session.is_running());
        assert_eq!(session.context().debug_index, 0);
    }
}
