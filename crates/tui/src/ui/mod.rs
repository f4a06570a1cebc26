//! Reusable UI components
//!
//! Visual pieces shared by the panels: the loading spinner and the status
//! bar line.

pub mod spinner;
pub mod status;
