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

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::NO_LINE;

/// Backend-assigned node identity, unique within one trace snapshot.
pub type NodeId = i64;

/// Ordered (name, value) argument pairs; values stay as raw JSON.
pub type Arguments = Vec<(String, Value)>;

/// One function, subcircuit, or transform step in the execution trace.
///
/// Trees of these are fully discarded and rebuilt on every backend
/// round-trip; only `id` continuity lets the client re-select "the same"
/// node across rebuilds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitNode {
    /// Function or transform name.
    pub name: String,
    /// Backend-assigned identity.
    pub id: NodeId,
    /// Associated source line, or -1 when no single line applies.
    pub line_number: i64,
    /// Backend-rendered circuit diagram, base64-carried and opaque here.
    #[serde(rename = "image")]
    pub image: Option<String>,
    /// Call arguments, serialized as JSON text.
    #[serde(deserialize_with = "lenient_arguments", default)]
    pub arguments: Arguments,
    /// Whether this is a transform-step pseudo-node rather than a call.
    #[serde(rename = "transform", default)]
    pub is_transform: bool,
    /// Backend hint that expansion is possible.
    #[serde(default)]
    pub has_children: bool,
    /// Trace index marking where this node's scope ends; echoed back on
    /// expansion requests.
    #[serde(rename = "end_idx", default)]
    pub end_index: EndIndex,
    /// Output and argument details shown in the node's info card.
    #[serde(rename = "more_information", default)]
    pub info: FunctionInfo,
}

impl CircuitNode {
    /// Build a transform pseudo-node from one queued transform detail.
    pub fn from_transform(detail: &TransformDetail) -> Self {
        Self {
            name: detail.name().to_string(),
            id: detail.id(),
            line_number: detail.line(),
            image: Some(detail.image().to_string()),
            arguments: Vec::new(),
            is_transform: true,
            has_children: false,
            end_index: EndIndex::default(),
            info: FunctionInfo { arguments: None, output: detail.output().map(str::to_string) },
        }
    }
}

/// The `more_information` card of a node: its output and arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// Argument pairs, absent for transform pseudo-nodes.
    #[serde(rename = "Arguments", default)]
    pub arguments: Option<Arguments>,
    /// Textual function output.
    #[serde(rename = "Output", default)]
    pub output: Option<String>,
}

/// One pending transform step, wire-encoded as a 5-tuple:
/// `[image, output, name, id, line]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformDetail(String, Option<String>, String, NodeId, i64);

impl TransformDetail {
    /// Build a transform detail from its parts.
    pub fn new(
        image: impl Into<String>,
        output: Option<String>,
        name: impl Into<String>,
        id: NodeId,
        line: i64,
    ) -> Self {
        Self(image.into(), output, name.into(), id, line)
    }

    /// Rendered diagram payload (base64).
    pub fn image(&self) -> &str {
        &self.0
    }

    /// Transform output text.
    pub fn output(&self) -> Option<&str> {
        self.1.as_deref()
    }

    /// Transform name.
    pub fn name(&self) -> &str {
        &self.2
    }

    /// Node identity of the pseudo-node.
    pub fn id(&self) -> NodeId {
        self.3
    }

    /// Source line the transform is attached to; this is the breakpoint
    /// key used during transform replay.
    pub fn line(&self) -> i64 {
        self.4
    }
}

/// A trace end index.
///
/// The backend serializes this as a decimal string (`"-1"`, `"4"`) but
/// occasionally emits a bare number; requests must always send the string
/// form because the server compares against `"-1"` literally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndIndex(pub i64);

impl Default for EndIndex {
    fn default() -> Self {
        Self(NO_LINE)
    }
}

impl Serialize for EndIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for EndIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => {
                s.parse::<i64>().map(EndIndex).map_err(|_| {
                    de::Error::custom(format!("invalid end index string: {s:?}"))
                })
            }
            Value::Number(n) => n
                .as_i64()
                .map(EndIndex)
                .ok_or_else(|| de::Error::custom("end index out of range")),
            Value::Null => Ok(Self::default()),
            other => Err(de::Error::custom(format!("invalid end index: {other}"))),
        }
    }
}

/// Deserialize argument pairs, tolerating the backend's degenerate forms
/// (`""`, `null`) by mapping them to an empty list.
pub(crate) fn lenient_arguments<'de, D>(deserializer: D) -> Result<Arguments, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => {
            let mut args = Arguments::with_capacity(items.len());
            for item in items {
                let pair: (String, Value) =
                    serde_json::from_value(item).map_err(de::Error::custom)?;
                args.push(pair);
            }
            Ok(args)
        }
        _ => Ok(Arguments::new()),
    }
}
