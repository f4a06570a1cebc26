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

//! Client-side session identifiers
//!
//! A session identifier exists for the lifetime of one client run and is
//! reported to the backend on enter and exit. It is generated locally from
//! the wall clock and a random value, so no backend round-trip is needed
//! before the first telemetry call.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Opaque per-run session identifier.
///
/// Format: hex milliseconds since epoch, an underscore, and a random
/// 63-bit value in hex, upper-cased (e.g. `19A3B2C4D5E_1F2E3D4C5B6A798`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh session identifier from the wall clock and a
    /// random value.
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(0);
        let nonce: u64 = rand::rng().random_range(0..(1u64 << 63));
        Self(format!("{millis:X}_{nonce:X}"))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current wall-clock time in milliseconds, the timestamp format carried
/// on every telemetry envelope.
pub fn timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let id = SessionId::generate();
        let s = id.as_str();

        let (time_part, rand_part) = s.split_once('_').expect("missing separator");
        assert!(!time_part.is_empty());
        assert!(!rand_part.is_empty());
        assert!(time_part.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(rand_part.chars().all(|c| c.is_ascii_hexdigit()));
        // Hex encoding is upper-cased
        assert_eq!(s, s.to_uppercase());
    }

    #[test]
    fn test_session_ids_are_unique_per_run() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let id = SessionId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_str()));
    }
}
