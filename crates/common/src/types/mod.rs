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

//! Wire types for the CircInspect backend
//!
//! The backend is JSON-over-HTTP POST and the client depends on exact
//! field names; everything here mirrors the wire precisely, including the
//! backend's looser corners (stringly `end_idx`, tuple-encoded transform
//! details, fields that degrade to `""` or `[]`).

mod api;
mod node;

pub use api::*;
pub use node::*;
