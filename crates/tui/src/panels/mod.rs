//! Panel framework and implementations
//!
//! Each panel renders from the shared [`DataManager`] and handles its own
//! navigation keys. Anything that needs a backend round-trip is returned as
//! a [`PanelAction`] for the app loop to dispatch.

use std::fmt::Debug;

use circinspect_common::types::{DebugAction, NodeId};
use crossterm::event::KeyEvent;
use eyre::Result;
use ratatui::{layout::Rect, Frame};

use crate::data::DataManager;

/// Panel types for identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelType {
    /// Source code with breakpoints and the execution highlight.
    Code,
    /// Call tree of the last evaluation.
    Tree,
    /// Diagram payload and info card of the shown node.
    Output,
}

/// Work a panel wants the app loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    /// Fetch children for an expanded node.
    FetchChildren(NodeId),
    /// Show a node's diagram (reported to telemetry).
    SelectNode(NodeId),
    /// Open a node's info card (reported to telemetry).
    ShowInfo(NodeId),
    /// Toggle a breakpoint on a source line.
    ToggleBreakpoint(i64),
    /// Advance the debug run.
    Step(DebugAction),
}

/// Response from panel event handling.
#[derive(Debug, PartialEq, Eq)]
pub enum EventResponse {
    /// Event was handled, no further action needed.
    Handled,
    /// Event was not handled, pass to the next handler.
    NotHandled,
    /// Request focus change to another panel.
    ChangeFocus(PanelType),
    /// Request backend-side work.
    Action(PanelAction),
    /// Request application exit.
    Exit,
}

/// Trait for UI panels.
pub trait Panel: Debug {
    /// Render the panel content.
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &DataManager);

    /// Handle keyboard events.
    fn handle_key_event(&mut self, event: KeyEvent, dm: &mut DataManager)
        -> Result<EventResponse>;

    /// Get the panel type.
    fn panel_type(&self) -> PanelType;

    /// Called when this panel gains focus.
    fn on_focus(&mut self) {}

    /// Called when this panel loses focus.
    fn on_blur(&mut self) {}
}

pub mod code;
pub mod output;
pub mod tree;

pub use code::CodePanel;
pub use output::OutputPanel;
pub use tree::TreePanel;
