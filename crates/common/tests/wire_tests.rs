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

//! Wire-format tests against captured backend payloads
//!
//! Fixtures mirror what the Flask backend actually emits, including its
//! quirks: `end_idx` as a decimal string, `arguments` degrading to `""`,
//! and error arrays that sometimes carry a single element.

use circinspect_common::error::{EvalError, NO_LINE};
use circinspect_common::session::SessionId;
use circinspect_common::types::{
    DebugAction, DebugNextRequest, DebugStepResponse, Envelope, ExpandRequest, ExpandResponse,
    Mode, VisualizeResponse,
};

fn envelope() -> Envelope {
    Envelope {
        token: "NOAUTH".into(),
        session_id: SessionId::generate(),
        policy_accepted: true,
        timestamp: 1_755_900_000_000,
    }
}

#[test]
fn test_visualize_response_full_payload() {
    let resp: VisualizeResponse = serde_json::from_str(
        r#"{
            "name": "my_circuit",
            "id": 0,
            "image": "iVBORw0KGgo=",
            "line_number": 6,
            "has_children": true,
            "more_information": {
                "Arguments": [["theta", 0.5], ["wires", [0, 1]]],
                "Output": "tensor([0.5, 0.5], requires_grad=True)"
            },
            "arguments": [["theta", 0.5]],
            "transform_details": [
                ["aW1nMQ==", "out1", "cancel_inverses", 101, 3],
                ["aW1nMg==", null, "merge_rotations", 102, 4]
            ],
            "device_name": "default.qubit",
            "commands": "gASVqgr...",
            "debug_index": -1,
            "num_wires": 2,
            "num_shots": null
        }"#,
    )
    .unwrap();

    assert_eq!(resp.name, "my_circuit");
    assert!(resp.error.is_none());
    assert_eq!(resp.transform_details.len(), 2);
    assert_eq!(resp.transform_details[0].name(), "cancel_inverses");
    assert_eq!(resp.transform_details[1].output(), None);
    assert_eq!(resp.info.arguments.as_ref().unwrap().len(), 2);
    assert_eq!(resp.num_shots, None);
}

#[test]
fn test_visualize_error_variants() {
    // Two-element error from a traceback.
    let resp: VisualizeResponse =
        serde_json::from_str(r#"{"error": ["NameError: name 'qml' is not defined", " line 2"]}"#)
            .unwrap();
    assert_eq!(resp.error.unwrap().line, 2);

    // Single-element error without a line.
    let resp: VisualizeResponse =
        serde_json::from_str(r#"{"error": ["Please run exactly one quantum node."]}"#).unwrap();
    let err = resp.error.unwrap();
    assert_eq!(err.kind, "Please run exactly one quantum node.");
    assert_eq!(err.line, NO_LINE);

    // The backend's timeout error.
    let err: EvalError =
        serde_json::from_str(r#"["Time limit exceeded", "line unknown"]"#).unwrap();
    assert_eq!(err.line, NO_LINE);
}

#[test]
fn test_expand_request_sends_string_end_idx() {
    let req = ExpandRequest {
        envelope: envelope(),
        name: "sub_circuit".into(),
        id: 3,
        end_idx: circinspect_common::types::EndIndex(-1),
        real_time: true,
        device_name: "default.qubit".into(),
        commands: "gASV".into(),
        num_wires: Some(2),
        num_shots: None,
    };
    let v = serde_json::to_value(&req).unwrap();
    // The server string-compares against "-1", so this must not be a
    // number.
    assert_eq!(v["end_idx"], "-1");
    assert_eq!(v["token"], "NOAUTH");
    assert_eq!(v["real_time"], true);
}

#[test]
fn test_expand_response_defaults_missing_fields() {
    let resp: ExpandResponse = serde_json::from_str(
        r#"{"children": [
            {"name": "rx_layer", "id": 4, "line_number": 11, "image": "aW1n",
             "more_information": {"Arguments": [], "Output": "None"}, "has_children": false},
            {"name": "entangle", "id": 5}
        ]}"#,
    )
    .unwrap();
    assert_eq!(resp.children.len(), 2);
    assert_eq!(resp.children[1].line_number, NO_LINE);
    assert!(resp.children[1].image.is_none());
    assert!(!resp.children[1].has_children);
}

#[test]
fn test_debug_next_request_wire_shape() {
    let req = DebugNextRequest {
        envelope: envelope(),
        data: "3 7 9".into(),
        device_name: "default.qubit".into(),
        commands: "gASV".into(),
        debug_index: 4,
        num_wires: Some(2),
        num_shots: Some(100),
        debug_action: DebugAction::StepInto,
    };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v["data"], "3 7 9");
    assert_eq!(v["debug_action"], "step_into");
    assert_eq!(v["debug_index"], 4);
    // Envelope fields are flattened, not nested.
    assert!(v.get("envelope").is_none());
    assert!(v.get("session_id").is_some());
}

#[test]
fn test_debug_step_response_tolerates_degenerate_fields() {
    let resp: DebugStepResponse = serde_json::from_str(
        r#"{
            "debug_index": 6,
            "id": 2,
            "name": "sub_circuit",
            "line_number": 12,
            "image": "aW1n",
            "arguments": "",
            "has_children": true,
            "circuit_output": "tensor(0.25)",
            "end_idx": "9",
            "line_number_to_highlight": -1
        }"#,
    )
    .unwrap();
    assert!(resp.arguments.is_empty());
    assert_eq!(resp.end_idx.0, 9);
    assert_eq!(resp.line_number_to_highlight, NO_LINE);
}

#[test]
fn test_mode_round_trip_matches_backend_strings() {
    for (mode, wire) in
        [(Mode::RealTime, "Real-Time Development"), (Mode::Debugger, "Debugger Mode")]
    {
        let json = serde_json::to_string(&mode).unwrap();
        assert_eq!(json, format!("\"{wire}\""));
        let back: Mode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mode);
    }
}
