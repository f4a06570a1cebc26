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

use serde::{Deserialize, Serialize};

use crate::{
    error::{EvalError, NO_LINE},
    session::SessionId,
    types::node::{lenient_arguments, Arguments, CircuitNode, EndIndex, FunctionInfo, NodeId, TransformDetail},
};

/// Client operating mode, carried verbatim on `/visualizeCircuit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Continuous recompute-on-edit mode.
    #[serde(rename = "Real-Time Development")]
    RealTime,
    /// Stepped debugger mode.
    #[serde(rename = "Debugger Mode")]
    Debugger,
}

impl Mode {
    /// Wire string for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RealTime => "Real-Time Development",
            Self::Debugger => "Debugger Mode",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Debugger step action carried on `/debugNext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugAction {
    /// Continue forward to the next breakpoint.
    NextBreakpoint,
    /// Continue backward to the previous breakpoint.
    PrevBreakpoint,
    /// Step over the current call.
    StepOver,
    /// Step into the current call.
    StepInto,
    /// Step out of the current call.
    StepOut,
    /// Restart the run server-side.
    Restart,
}

/// Telemetry envelope carried on every data-collection call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Authentication token (the `NOAUTH` placeholder when auth is off).
    pub token: String,
    /// Per-run session identifier.
    pub session_id: SessionId,
    /// User consent flag for telemetry collection.
    pub policy_accepted: bool,
    /// Wall-clock milliseconds at send time.
    pub timestamp: i64,
}

/// `/auth/verify` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthVerifyRequest {
    /// Token to verify.
    pub token: String,
}

/// `/auth/verify` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthVerifyResponse {
    /// Email the token belongs to.
    pub email: String,
    /// PennyLane version running on the backend.
    pub pennylane: String,
}

/// `/auth/send` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSendRequest {
    /// Email address to send the login link to.
    pub email: String,
    /// Whether the user accepted the data-collection policy.
    pub policy_accepted: bool,
}

/// Body for the bare telemetry endpoints (`/dc/sessionEnter`,
/// `/dc/sessionExit`, `/dc/enterDebuggerMode`, `/dc/enterRealTimeMode`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRequest {
    /// Common telemetry fields.
    #[serde(flatten)]
    pub envelope: Envelope,
}

/// Body for `/dc/displayCircuit` and `/dc/displayFuncInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayTelemetryRequest {
    /// Common telemetry fields.
    #[serde(flatten)]
    pub envelope: Envelope,
    /// The node the user interacted with.
    pub function: CircuitNode,
}

/// `/bugreport` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugReportRequest {
    /// Reporter email.
    pub user_email: String,
    /// Free-form description.
    pub description: String,
}

/// `/visualizeCircuit` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizeRequest {
    /// Common telemetry fields.
    #[serde(flatten)]
    pub envelope: Envelope,
    /// Full source text to evaluate.
    pub data: String,
    /// Current operating mode.
    pub mode: Mode,
}

/// `/visualizeCircuit` response.
///
/// On evaluation failure only `error` is present; every other field keeps
/// its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizeResponse {
    /// Evaluation error, when the code could not run.
    pub error: Option<EvalError>,
    /// Main function name.
    pub name: String,
    /// Main function node identity.
    pub id: NodeId,
    /// Rendered main circuit diagram (base64).
    pub image: Option<String>,
    /// Main function source line.
    pub line_number: i64,
    /// Whether the main node can be expanded.
    pub has_children: bool,
    /// Info card of the main function.
    #[serde(rename = "more_information")]
    pub info: FunctionInfo,
    /// Main function arguments.
    #[serde(deserialize_with = "lenient_arguments")]
    pub arguments: Arguments,
    /// Pending transform steps, ordered by trace position.
    pub transform_details: Vec<TransformDetail>,
    /// Device the circuit ran on.
    pub device_name: String,
    /// Opaque serialized execution state, echoed back on later calls.
    pub commands: String,
    /// Current trace index.
    pub debug_index: i64,
    /// Number of wires on the device.
    pub num_wires: Option<u64>,
    /// Number of shots, absent for analytic execution.
    pub num_shots: Option<u64>,
}

impl Default for VisualizeResponse {
    fn default() -> Self {
        Self {
            error: None,
            name: String::new(),
            id: 0,
            image: None,
            line_number: NO_LINE,
            has_children: false,
            info: FunctionInfo::default(),
            arguments: Arguments::new(),
            transform_details: Vec::new(),
            device_name: String::new(),
            commands: String::new(),
            debug_index: NO_LINE,
            num_wires: None,
            num_shots: None,
        }
    }
}

/// `/expandMethod` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandRequest {
    /// Common telemetry fields.
    #[serde(flatten)]
    pub envelope: Envelope,
    /// Name of the node being expanded.
    pub name: String,
    /// Identity of the node being expanded.
    pub id: NodeId,
    /// Scope end of the node, as previously reported by the backend.
    pub end_idx: EndIndex,
    /// Whether the client is in real-time mode.
    pub real_time: bool,
    /// Execution context echoed from the last visualize call.
    pub device_name: String,
    /// Opaque serialized execution state.
    pub commands: String,
    /// Number of wires.
    pub num_wires: Option<u64>,
    /// Number of shots.
    pub num_shots: Option<u64>,
}

/// `/expandMethod` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpandResponse {
    /// One level of child nodes.
    #[serde(default)]
    pub children: Vec<ChildNode>,
}

/// One child entry in an `/expandMethod` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildNode {
    /// Function name.
    pub name: String,
    /// Node identity.
    pub id: NodeId,
    /// Source line.
    #[serde(default = "no_line")]
    pub line_number: i64,
    /// Rendered subcircuit diagram (base64).
    #[serde(default)]
    pub image: Option<String>,
    /// Info card.
    #[serde(rename = "more_information", default)]
    pub info: FunctionInfo,
    /// Whether this child can be expanded further.
    #[serde(default)]
    pub has_children: bool,
}

/// `/debugNext` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugNextRequest {
    /// Common telemetry fields.
    #[serde(flatten)]
    pub envelope: Envelope,
    /// Breakpoint line numbers, space-joined.
    pub data: String,
    /// Device the circuit ran on.
    pub device_name: String,
    /// Opaque serialized execution state.
    pub commands: String,
    /// Trace index the debugger is currently at.
    pub debug_index: i64,
    /// Number of wires.
    pub num_wires: Option<u64>,
    /// Number of shots.
    pub num_shots: Option<u64>,
    /// Requested step action.
    pub debug_action: DebugAction,
}

/// `/debugNext` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugStepResponse {
    /// Updated trace index.
    pub debug_index: i64,
    /// Identity of the node execution stopped in.
    pub id: NodeId,
    /// Name of that node.
    pub name: String,
    /// Its source line.
    pub line_number: i64,
    /// Its rendered diagram (base64).
    pub image: Option<String>,
    /// Its arguments.
    #[serde(deserialize_with = "lenient_arguments")]
    pub arguments: Arguments,
    /// Whether it can be expanded.
    pub has_children: bool,
    /// Output of the circuit up to this point.
    pub circuit_output: Option<String>,
    /// Scope end of the node.
    pub end_idx: EndIndex,
    /// Source line to highlight, or -1 when execution is inside the
    /// function's transform replay.
    pub line_number_to_highlight: i64,
}

impl Default for DebugStepResponse {
    fn default() -> Self {
        Self {
            debug_index: NO_LINE,
            id: 0,
            name: String::new(),
            line_number: NO_LINE,
            image: None,
            arguments: Arguments::new(),
            has_children: false,
            circuit_output: None,
            end_idx: EndIndex::default(),
            line_number_to_highlight: NO_LINE,
        }
    }
}

fn no_line() -> i64 {
    NO_LINE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_wire_strings() {
        assert_eq!(serde_json::to_string(&Mode::RealTime).unwrap(), "\"Real-Time Development\"");
        assert_eq!(serde_json::to_string(&Mode::Debugger).unwrap(), "\"Debugger Mode\"");
    }

    #[test]
    fn test_debug_action_wire_strings() {
        for (action, wire) in [
            (DebugAction::NextBreakpoint, "\"next_breakpoint\""),
            (DebugAction::PrevBreakpoint, "\"prev_breakpoint\""),
            (DebugAction::StepOver, "\"step_over\""),
            (DebugAction::StepInto, "\"step_into\""),
            (DebugAction::StepOut, "\"step_out\""),
            (DebugAction::Restart, "\"restart\""),
        ] {
            assert_eq!(serde_json::to_string(&action).unwrap(), wire);
        }
    }

    #[test]
    fn test_envelope_flattens_into_request() {
        let req = VisualizeRequest {
            envelope: Envelope {
                token: "NOAUTH".into(),
                session_id: SessionId::generate(),
                policy_accepted: true,
                timestamp: 1_700_000_000_000,
            },
            data: "import pennylane as qml".into(),
            mode: Mode::RealTime,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("token").is_some());
        assert!(v.get("session_id").is_some());
        assert!(v.get("policy_accepted").is_some());
        assert!(v.get("timestamp").is_some());
        assert_eq!(v["mode"], "Real-Time Development");
    }

    #[test]
    fn test_visualize_error_response_leaves_defaults() {
        let resp: VisualizeResponse =
            serde_json::from_str(r#"{"error": ["SyntaxError", " line 7"]}"#).unwrap();
        let err = resp.error.expect("error present");
        assert_eq!(err.line, 7);
        assert!(resp.image.is_none());
        assert_eq!(resp.debug_index, NO_LINE);
        assert!(resp.transform_details.is_empty());
    }

    #[test]
    fn test_visualize_success_response() {
        let resp: VisualizeResponse = serde_json::from_str(
            r#"{
                "name": "my_circuit",
                "id": 0,
                "image": "aW1n",
                "line_number": 4,
                "children": [],
                "has_children": true,
                "more_information": {"Arguments": [], "Output": "tensor(1.0)"},
                "arguments": [],
                "transform_details": [["aW1n", "out", "merge_rotations", 3, 9]],
                "device_name": "default.qubit",
                "commands": "abcdef",
                "debug_index": -1,
                "num_wires": 2,
                "num_shots": null
            }"#,
        )
        .unwrap();
        assert_eq!(resp.name, "my_circuit");
        assert_eq!(resp.num_wires, Some(2));
        assert_eq!(resp.num_shots, None);
        assert_eq!(resp.transform_details.len(), 1);
        assert_eq!(resp.transform_details[0].line(), 9);
    }

    #[test]
    fn test_debug_step_response_stringly_fields() {
        // `end_idx` arrives as a string and `arguments` degrades to "".
        let resp: DebugStepResponse = serde_json::from_str(
            r#"{
                "debug_index": 4,
                "id": 2,
                "name": "sub",
                "line_number": 12,
                "image": "aW1n",
                "arguments": "",
                "has_children": false,
                "circuit_output": "tensor(0.5)",
                "end_idx": "4",
                "line_number_to_highlight": 12
            }"#,
        )
        .unwrap();
        assert_eq!(resp.end_idx, EndIndex(4));
        assert!(resp.arguments.is_empty());
        assert_eq!(resp.line_number_to_highlight, 12);
    }
}
