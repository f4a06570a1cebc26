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

//! CircInspect Common - Shared functionality for the CircInspect client
//!
//! This crate provides the wire types for every backend endpoint, the
//! structured error taxonomy, session-identifier generation, and logging
//! setup shared by the client binaries.

/// Wire types exchanged with the CircInspect backend, including circuit
/// nodes, transform details, and per-endpoint request/response bodies
pub mod types;

/// Structured error taxonomy for backend interactions
pub mod error;
/// Logging setup and utilities for consistent logging across components
pub mod logging;
/// Client-side session identifier generation
pub mod session;

pub use error::*;
pub use logging::*;
pub use session::*;
