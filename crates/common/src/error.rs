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

//! Structured error taxonomy for backend interactions
//!
//! The backend distinguishes three failure classes and the client reacts
//! differently to each: authentication failures clear the stored token and
//! surface to the user, evaluation errors highlight the offending source
//! line, and transport failures are logged without surfacing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel line number meaning "no source line".
pub const NO_LINE: i64 = -1;

/// Errors surfaced by backend interactions.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Expired or invalid authentication token. The stored token must be
    /// cleared and the user sent back through login.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The backend could not evaluate the submitted code.
    #[error("{0}")]
    Evaluation(EvalError),

    /// Network-level or HTTP-level failure. Logged, never retried.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ClientError {
    /// Wrap a transport-layer failure.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A code-evaluation error reported by the backend.
///
/// The wire form is a `[kind, message]` array (the backend occasionally
/// drops the message). The message is the ` line N` fragment the backend
/// cuts out of the Python traceback, so the line number is the third
/// space-delimited token, counting the empty token before the leading
/// space; when that token is absent or unparsable the line falls back to
/// [`NO_LINE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct EvalError {
    /// Error class, e.g. `SyntaxError`.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Source line the error points at, or [`NO_LINE`].
    pub line: i64,
}

impl EvalError {
    /// Build an evaluation error from the backend's `[kind, message]`
    /// pair, extracting the line number from the message.
    pub fn from_pair(kind: String, message: String) -> Self {
        let line = message
            .split(' ')
            .nth(2)
            .and_then(|tok| tok.parse::<i64>().ok())
            .unwrap_or(NO_LINE);
        Self { kind, message, line }
    }
}

impl From<Vec<String>> for EvalError {
    fn from(mut parts: Vec<String>) -> Self {
        let message = if parts.len() > 1 { parts.remove(1) } else { String::new() };
        let kind = parts.into_iter().next().unwrap_or_default();
        Self::from_pair(kind, message)
    }
}

impl From<EvalError> for Vec<String> {
    fn from(err: EvalError) -> Self {
        vec![err.kind, err.message]
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_error_line_extraction() {
        // The message keeps the traceback fragment's leading space.
        let err = EvalError::from_pair("SyntaxError: invalid token".into(), " line 7".into());
        assert_eq!(err.line, 7);
        assert_eq!(err.kind, "SyntaxError: invalid token");
    }

    #[test]
    fn test_eval_error_third_token_convention() {
        // The line is always the third space-delimited token, whatever
        // surrounds it.
        let err = EvalError::from_pair("NameError".into(), "error near 42 in circuit".into());
        assert_eq!(err.line, 42);
    }

    #[test]
    fn test_eval_error_without_line_falls_back() {
        let err = EvalError::from_pair("DeviceError".into(), "no device".into());
        assert_eq!(err.line, NO_LINE);

        let err = EvalError::from_pair("Time limit exceeded".into(), "line unknown".into());
        assert_eq!(err.line, NO_LINE);
    }

    #[test]
    fn test_eval_error_tolerates_single_element_array() {
        // "Please run exactly one quantum node." arrives without a message.
        let err: EvalError =
            serde_json::from_str(r#"["Please run exactly one quantum node."]"#).unwrap();
        assert_eq!(err.kind, "Please run exactly one quantum node.");
        assert_eq!(err.line, NO_LINE);
    }

    #[test]
    fn test_eval_error_deserializes_from_pair() {
        let err: EvalError = serde_json::from_str(r#"["SyntaxError", " line 7"]"#).unwrap();
        assert_eq!(err.line, 7);
        assert_eq!(err.to_string(), "SyntaxError -  line 7");
    }
}
