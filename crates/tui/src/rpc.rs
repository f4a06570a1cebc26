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

//! HTTP client for the CircInspect backend
//!
//! All endpoints are JSON-over-POST. Evaluation errors travel inside a 200
//! response body; HTTP 401 means the token expired and the user must log in
//! again. Telemetry endpoints are fire-and-forget: failures are logged and
//! never surfaced.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use circinspect_common::error::ClientError;
use circinspect_common::session::SessionId;
use circinspect_common::types::{
    AuthSendRequest, AuthVerifyRequest, AuthVerifyResponse, BugReportRequest, CircuitNode,
    DebugAction, DebugNextRequest, DebugStepResponse, DisplayTelemetryRequest, Envelope,
    ExpandRequest, ExpandResponse, Mode, TelemetryRequest, VisualizeRequest, VisualizeResponse,
};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::data::debug::DebugContext;
use crate::ui::spinner::RpcSpinner;

/// Token placeholder sent when the backend runs with auth disabled.
pub const NO_AUTH_TOKEN: &str = "NOAUTH";

/// Request channels with independent response ordering.
///
/// Responses on one channel may not overtake each other, but channels are
/// independent: an in-flight evaluation never blocks an expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// `/visualizeCircuit` evaluations.
    Visualize,
    /// `/expandMethod` tree expansions.
    Expand,
    /// `/debugNext` step requests.
    DebugStep,
}

/// Per-channel monotonic sequence numbers.
///
/// Every request takes the next number for its channel; a response is only
/// applied when its number still is the newest issued one, so a reply that
/// was overtaken by a newer request on the same channel is discarded.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: [u64; 3],
}

impl RequestSequencer {
    /// Issue the next sequence number for a channel.
    pub fn next(&mut self, channel: Channel) -> u64 {
        let slot = &mut self.issued[channel as usize];
        *slot += 1;
        *slot
    }

    /// Whether `seq` is the newest number issued on its channel.
    pub fn is_current(&self, channel: Channel, seq: u64) -> bool {
        self.issued[channel as usize] == seq
    }

    /// Newest number issued on a channel. The expand channel uses this as
    /// a tree generation: expansions spawned against an old tree carry an
    /// old number and their responses are dropped.
    pub fn current(&self, channel: Channel) -> u64 {
        self.issued[channel as usize]
    }
}

/// Client for backend communication.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    session_id: SessionId,
    policy_accepted: bool,
    /// Shared spinner state for loading indication.
    spinner: Arc<RwLock<RpcSpinner>>,
}

impl ApiClient {
    /// Create a client bound to one backend and one session.
    pub fn new(
        base_url: &str,
        token: String,
        policy_accepted: bool,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ClientError::transport)?;
        let session_id = SessionId::generate();
        debug!(base_url, %session_id, "created api client");
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            session_id,
            policy_accepted,
            spinner: Arc::new(RwLock::new(RpcSpinner::new())),
        })
    }

    /// Session id this client was created with.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Shared spinner handle for the status bar.
    pub fn spinner(&self) -> Arc<RwLock<RpcSpinner>> {
        self.spinner.clone()
    }

    /// Verify a token against a backend before building a client.
    pub async fn verify_token(
        base_url: &str,
        token: &str,
    ) -> Result<AuthVerifyResponse, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(ClientError::transport)?;
        let url = format!("{}/auth/verify", base_url.trim_end_matches('/'));
        let resp = http
            .post(&url)
            .json(&AuthVerifyRequest { token: token.to_string() })
            .send()
            .await
            .map_err(ClientError::transport)?;
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ClientError::Auth("token rejected by backend".into()))
            }
            status if !status.is_success() => {
                Err(ClientError::Transport(format!("/auth/verify returned {status}")))
            }
            _ => resp.json().await.map_err(ClientError::transport),
        }
    }

    /// Ask the backend to email a login link.
    pub async fn send_login_link(
        base_url: &str,
        email: &str,
        policy_accepted: bool,
    ) -> Result<(), ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(ClientError::transport)?;
        let url = format!("{}/auth/send", base_url.trim_end_matches('/'));
        let resp = http
            .post(&url)
            .json(&AuthSendRequest { email: email.to_string(), policy_accepted })
            .send()
            .await
            .map_err(ClientError::transport)?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::Transport(format!("/auth/send returned {}", resp.status())))
        }
    }

    /// Evaluate source text and build its trace.
    pub async fn visualize(
        &self,
        data: String,
        mode: Mode,
    ) -> Result<VisualizeResponse, ClientError> {
        let req = VisualizeRequest { envelope: self.envelope(), data, mode };
        self.post("/visualizeCircuit", &req, "Evaluating circuit").await
    }

    /// Fetch one level of children for a node.
    pub async fn expand(
        &self,
        node: &CircuitNode,
        real_time: bool,
        ctx: &DebugContext,
    ) -> Result<ExpandResponse, ClientError> {
        let req = ExpandRequest {
            envelope: self.envelope(),
            name: node.name.clone(),
            id: node.id,
            end_idx: node.end_index,
            real_time,
            device_name: ctx.device_name.clone(),
            commands: ctx.commands.clone(),
            num_wires: ctx.num_wires,
            num_shots: ctx.num_shots,
        };
        self.post("/expandMethod", &req, "Expanding method").await
    }

    /// Advance the debug run by one action.
    pub async fn debug_next(
        &self,
        breakpoints: String,
        ctx: &DebugContext,
        action: DebugAction,
    ) -> Result<DebugStepResponse, ClientError> {
        let req = DebugNextRequest {
            envelope: self.envelope(),
            data: breakpoints,
            device_name: ctx.device_name.clone(),
            commands: ctx.commands.clone(),
            debug_index: ctx.debug_index,
            num_wires: ctx.num_wires,
            num_shots: ctx.num_shots,
            debug_action: action,
        };
        self.post("/debugNext", &req, "Stepping").await
    }

    /// File a bug report.
    pub async fn bug_report(
        &self,
        user_email: String,
        description: String,
    ) -> Result<(), ClientError> {
        let req = BugReportRequest { user_email, description };
        self.post_no_body("/bugreport", &req).await
    }

    /// Record session start.
    pub async fn session_enter(&self) {
        self.telemetry("/dc/sessionEnter").await;
    }

    /// Record session end. Called on shutdown.
    pub async fn session_exit(&self) {
        self.telemetry("/dc/sessionExit").await;
    }

    /// Record a switch into debugger mode.
    pub async fn enter_debugger_mode(&self) {
        self.telemetry("/dc/enterDebuggerMode").await;
    }

    /// Record a switch into real-time mode.
    pub async fn enter_real_time_mode(&self) {
        self.telemetry("/dc/enterRealTimeMode").await;
    }

    /// Record that a node's diagram was displayed.
    pub async fn display_circuit(&self, function: CircuitNode) {
        let req = DisplayTelemetryRequest { envelope: self.envelope(), function };
        if let Err(err) = self.post_no_body("/dc/displayCircuit", &req).await {
            debug!(%err, "displayCircuit telemetry failed");
        }
    }

    /// Record that a node's info card was opened.
    pub async fn display_func_info(&self, function: CircuitNode) {
        let req = DisplayTelemetryRequest { envelope: self.envelope(), function };
        if let Err(err) = self.post_no_body("/dc/displayFuncInfo", &req).await {
            debug!(%err, "displayFuncInfo telemetry failed");
        }
    }

    async fn telemetry(&self, path: &'static str) {
        let req = TelemetryRequest { envelope: self.envelope() };
        if let Err(err) = self.post_no_body(path, &req).await {
            debug!(path, %err, "telemetry call failed");
        }
    }

    fn envelope(&self) -> Envelope {
        Envelope {
            token: self.token.clone(),
            session_id: self.session_id.clone(),
            policy_accepted: self.policy_accepted,
            timestamp: circinspect_common::session::timestamp_millis(),
        }
    }

    /// POST with spinner management and a JSON response body.
    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        operation: &str,
    ) -> Result<R, ClientError> {
        self.start_loading(operation);
        let result = self.send(path, body).await;
        self.finish_loading();
        match result {
            Ok(resp) => {
                let parsed = resp.json::<R>().await.map_err(ClientError::transport);
                if let Err(err) = &parsed {
                    error!(path, %err, "failed to decode response");
                }
                parsed
            }
            Err(err) => {
                error!(path, %err, "request failed");
                Err(err)
            }
        }
    }

    /// POST whose response body is ignored (telemetry returns 204).
    async fn post_no_body<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        self.send(path, body).await.map(drop)
    }

    async fn send<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let resp =
            self.http.post(&url).json(body).send().await.map_err(ClientError::transport)?;
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(path, "token rejected");
                Err(ClientError::Auth("token expired or invalid".into()))
            }
            status if !status.is_success() => {
                Err(ClientError::Transport(format!("{path} returned {status}")))
            }
            _ => Ok(resp),
        }
    }

    fn start_loading(&self, operation: &str) {
        if let Ok(mut spinner) = self.spinner.write() {
            spinner.start_loading(operation);
        }
    }

    fn finish_loading(&self) {
        if let Ok(mut spinner) = self.spinner.write() {
            spinner.finish_loading();
        }
    }
}
