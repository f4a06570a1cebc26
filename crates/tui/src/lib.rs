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

//! Terminal client for the CircInspect quantum circuit debugger
//!
//! Watches a PennyLane script, evaluates it through the CircInspect
//! backend, and drives the stepped debugger from the keyboard.

mod app;
pub mod config;
pub mod data;
mod panels;
mod rpc;
mod ui;

pub use app::{App, BackendEvent};
pub use config::Config;
pub use data::DataManager;
pub use panels::EventResponse;
pub use rpc::{ApiClient, NO_AUTH_TOKEN};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use eyre::Result;
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::{select, sync::mpsc, time::interval};
use tracing::{info, warn};

use crate::data::source::SourceBuffer;

/// Configuration for one TUI session.
#[derive(Debug, Clone)]
pub struct TuiConfig {
    /// Backend URL.
    pub server_url: String,
    /// Watched source file.
    pub source_path: PathBuf,
    /// Verified login token.
    pub token: String,
    /// Backend PennyLane version reported by token verification.
    pub pennylane_version: Option<String>,
    /// Whether the user accepted the data-collection policy.
    pub policy_accepted: bool,
    /// Debounce between a significant edit and its evaluation.
    pub debounce: Duration,
    /// Terminal refresh interval.
    pub refresh_interval: Duration,
}

/// Main TUI runner that manages the terminal and the event loop.
pub struct Tui {
    app: App,
    data_manager: DataManager,
    client: Arc<ApiClient>,
    events_rx: mpsc::UnboundedReceiver<BackendEvent>,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    refresh_interval: Duration,
}

impl Tui {
    /// Set up the terminal and load the watched file.
    pub fn new(config: TuiConfig) -> Result<Self> {
        info!(?config.server_url, ?config.source_path, "initializing tui");

        let source = SourceBuffer::load(&config.source_path, config.debounce)?;
        let client = Arc::new(ApiClient::new(
            &config.server_url,
            config.token.clone(),
            config.policy_accepted,
        )?);

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let app = App::new(client.clone(), events_tx, config.pennylane_version.clone());
        let data_manager = DataManager::new(source);

        Ok(Self {
            app,
            data_manager,
            client,
            events_rx,
            terminal,
            refresh_interval: config.refresh_interval,
        })
    }

    /// Run the main event loop until the user quits.
    pub async fn run(mut self) -> Result<()> {
        info!("starting tui event loop");
        self.client.session_enter().await;

        // Evaluate the file as loaded so the first render has a circuit.
        self.app.evaluate_now(&self.data_manager);

        let mut event_stream = EventStream::new();
        let mut ticker = interval(self.refresh_interval);

        let result = loop {
            let render_result = self.terminal.draw(|frame| {
                self.app.render(frame, &self.data_manager);
            });
            if let Err(e) = render_result {
                break Err(e.into());
            }

            select! {
                event_result = event_stream.next() => {
                    if let Some(Ok(Event::Key(key_event))) = event_result {
                        match self.app.handle_key_event(key_event, &mut self.data_manager) {
                            Ok(true) => break Ok(()),
                            Ok(false) => {}
                            Err(e) => break Err(e),
                        }
                    }
                }
                Some(backend_event) = self.events_rx.recv() => {
                    self.app.handle_backend_event(backend_event, &mut self.data_manager);
                }
                _ = ticker.tick() => {
                    self.app.on_tick(&mut self.data_manager);
                }
            }

            if self.app.should_exit() {
                break Ok(());
            }
        };

        self.client.session_exit().await;
        info!("tui event loop ended");
        result
    }

}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
        if let Err(err) = std::io::Write::flush(&mut io::stdout()) {
            warn!(%err, "failed to flush stdout on exit");
        }
    }
}
