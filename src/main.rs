//! # QuoteGrabber — once-per-trading-day portfolio quote reconciliation
//!
//! ## Run Overview
//!
//! ```text
//!  ┌──────────────┐  symbols (A5.."Cash")   ┌──────────────────┐
//!  │  Workbook    │ ──────────────────────▶ │  SymbolRegistry  │
//!  │  (JSON)      │                         └────────┬─────────┘
//!  └──────▲───────┘                                  │ "MSFT,T,VFIAX"
//!         │                                          ▼
//!         │  ReconciliationPlan             ┌──────────────────┐
//!         └──────────────────────────────── │  Quote service   │
//!            (skipped if already            │  GET → payload   │
//!             stamped for this date)        └──────────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable            | Default                 | Description                      |
//! |---------------------|-------------------------|----------------------------------|
//! | `LEDGER_PATH`       | `portfolio.json`        | Workbook document                |
//! | `QUOTE_URL`         | YQL csv→json query      | Endpoint with `{symbols}`        |
//! | `HTTP_TIMEOUT_SECS` | `30`                    | Quote request timeout            |
//! | `PAUSE_ON_EXIT`     | `true`                  | Wait for Enter before exiting    |
//! | `MAX_SCAN_ROWS`     | `500`                   | Rows scanned per sheet           |
//! | `RUST_LOG`          | `quotegrabber=info`     | Tracing filter                   |

use std::io::BufRead;
use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

mod config;
mod engine;
mod error;
mod fetch;
mod ledger;
mod models;
mod pipeline;
mod registry;

use config::Config;
use pipeline::Outcome;

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    // ── 1. Load .env (optional — real env vars win) ──────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialise logging: {e:#}");
        return finish(ExitCode::FAILURE, startup_pause());
    }

    info!(
        r#"

  ╔═══════════════════════════════════════════╗
  ║   QUOTEGRABBER v{:<8}                  ║
  ║   Daily quote → workbook reconciliation   ║
  ╚═══════════════════════════════════════════╝"#,
        env!("CARGO_PKG_VERSION")
    );

    // ── 3. Configuration ─────────────────────────────────────────────────────
    let config = match Config::from_env().context("Failed to load config") {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{e:#}"), "❌ Startup failed");
            return finish(ExitCode::FAILURE, startup_pause());
        }
    };

    info!(
        ledger  = %config.ledger_path.display(),
        timeout = ?config.http_timeout,
        "QuoteGrabber started"
    );

    // ── 4. One batch run ─────────────────────────────────────────────────────
    let run_id = Uuid::new_v4();
    let client = reqwest::Client::new();
    let result = pipeline::run(&config, &client)
        .instrument(info_span!("run", %run_id))
        .await;

    let code = match result {
        Ok(Outcome::Updated { market_date, history_row }) => {
            info!(%market_date, history_row, "✅ Workbook updated");
            ExitCode::SUCCESS
        }
        Ok(Outcome::AlreadyCurrent { market_date }) => {
            info!(%market_date, "Workbook already current — not updating again today");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "❌ Run aborted — workbook left unchanged");
            ExitCode::FAILURE
        }
    };

    // ── 5. Operator acknowledgment ───────────────────────────────────────────
    finish(code, config.pause_on_exit)
}

/// Pause setting when startup failed before a [`Config`] existed.
fn startup_pause() -> bool {
    config::pause_on_exit_or_default(std::env::var("PAUSE_ON_EXIT").ok().as_deref())
}

fn finish(code: ExitCode, pause: bool) -> ExitCode {
    if pause {
        wait_for_enter();
    }
    code
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("quotegrabber=info".parse()?)
            .add_directive("reqwest=warn".parse()?))
        .try_init()?;
    Ok(())
}

fn wait_for_enter() {
    println!("Press Enter to terminate...");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok();
}
