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

//! CircInspect TUI - terminal client for the CircInspect backend
//!
//! Watches a PennyLane script and shows its circuit trace; `--login`
//! requests a login link, `--bug-report` files a report without starting
//! the interface.

use std::path::PathBuf;
use std::time::Duration;

use circinspect_common::logging;
use circinspect_tui::{config, ApiClient, Config, Tui, TuiConfig, NO_AUTH_TOKEN};
use clap::Parser;
use eyre::{bail, Result};

/// CircInspect terminal client
#[derive(Debug, Parser)]
#[command(name = "circinspect-tui")]
#[command(about = "Terminal client for the CircInspect quantum circuit debugger", version)]
struct Args {
    /// PennyLane script to watch
    source: Option<PathBuf>,

    /// Backend URL (overrides the config file)
    #[arg(long)]
    url: Option<String>,

    /// Login token (overrides the stored one)
    #[arg(long)]
    token: Option<String>,

    /// Request a login link for this email and exit
    #[arg(long, value_name = "EMAIL")]
    login: Option<String>,

    /// Accept the data-collection policy (persisted in the config)
    #[arg(long)]
    accept_policy: bool,

    /// File a bug report and exit
    #[arg(long, value_name = "DESCRIPTION")]
    bug_report: Option<String>,

    /// Terminal refresh interval in milliseconds
    #[arg(long, default_value = "50")]
    refresh_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // File-only logging so the terminal stays clean for the interface.
    let log_file_path = logging::init_file_only_logging("circinspect-tui")?;
    eprintln!("CircInspect TUI logs: {}", log_file_path.display());

    let mut config = Config::load().unwrap_or_default();
    if let Some(url) = &args.url {
        config.server_url = url.clone();
    }
    if args.accept_policy && !config.policy_accepted {
        config.policy_accepted = true;
        config.save()?;
    }

    if let Some(email) = &args.login {
        ApiClient::send_login_link(&config.server_url, email, config.policy_accepted).await?;
        config.user_email = Some(email.clone());
        config.save()?;
        println!("Login link sent to {email}. Save the token with --token on the next run.");
        return Ok(());
    }

    if let Some(description) = args.bug_report {
        let Some(email) = config.user_email.clone() else {
            bail!("no email on file; run with --login <email> first");
        };
        let client = ApiClient::new(&config.server_url, NO_AUTH_TOKEN.into(), false)?;
        client.bug_report(email, description).await?;
        println!("Bug report sent.");
        return Ok(());
    }

    let Some(source) = args.source else {
        bail!("no source file given; usage: circinspect-tui <script.py>");
    };

    // Resolve and verify the token. Without one the client runs with the
    // no-auth placeholder, which auth-enabled backends will reject.
    let token = args.token.clone().or_else(config::load_token).unwrap_or_else(|| {
        tracing::info!("no stored token, assuming backend runs without auth");
        NO_AUTH_TOKEN.to_string()
    });
    let mut pennylane_version = None;
    if token != NO_AUTH_TOKEN {
        match ApiClient::verify_token(&config.server_url, &token).await {
            Ok(user) => {
                tracing::info!(email = %user.email, pennylane = %user.pennylane, "token verified");
                config::store_token(&token)?;
                pennylane_version = Some(user.pennylane);
            }
            Err(err) => {
                config::clear_token();
                bail!("token verification failed: {err}");
            }
        }
    }

    let tui_config = TuiConfig {
        server_url: config.server_url.clone(),
        source_path: source,
        token,
        pennylane_version,
        policy_accepted: config.policy_accepted,
        debounce: Duration::from_millis(config.debounce_ms),
        refresh_interval: Duration::from_millis(args.refresh_interval),
    };

    tracing::info!("starting CircInspect TUI against {}", config.server_url);
    let tui = Tui::new(tui_config)?;
    match tui.run().await {
        Ok(()) => {
            tracing::info!("TUI exited normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("TUI error: {e}");
            Err(e)
        }
    }
}
