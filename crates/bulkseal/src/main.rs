//! Entry point for the `bulkseal` batch encrypt/decrypt binary.
//!
//! Usage: `bulkseal <encrypt|decrypt> < items.txt > records.jsonl`
//!
//! Startup sequence:
//! 1. Parse the mode argument.
//! 2. Load and validate [`Config`] from `BULKSEAL_*` environment variables.
//! 3. Initialise structured JSON logging on stderr.
//! 4. Derive the key and build a [`BulkSealer`] tied to a Ctrl-C token.
//! 5. Read stdin, run the batch, write one JSON record per line to stdout.
//!
//! Ctrl-C while stdin is still being read aborts before any item runs.
//! Ctrl-C during the batch reports the remaining items as cancelled. Either
//! way the process exits non-zero.

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use bulkseal::batch::{self, Mode};
use bulkseal::config::Config;
use bulkseal::{telemetry, BulkSealer, SealerOptions};

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let result = runtime.block_on(run());
    // A pending stdin read sits on the blocking pool; don't wait for it.
    runtime.shutdown_background();
    result
}

async fn run() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Mode
    // -----------------------------------------------------------------------
    let mode: Mode = std::env::args()
        .nth(1)
        .context("usage: bulkseal <encrypt|decrypt>")?
        .parse()?;

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        ?mode,
        concurrency_limit = cfg.concurrency_limit,
        "bulkseal starting"
    );

    // -----------------------------------------------------------------------
    // 4. Sealer
    // -----------------------------------------------------------------------
    let cancel = CancellationToken::new();
    let sealer = BulkSealer::from_secret(
        &cfg.secret,
        SealerOptions {
            cancel: Some(cancel.clone()),
            ..cfg.sealer_options()
        },
    );

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received");
            on_interrupt.cancel();
        }
    });

    // -----------------------------------------------------------------------
    // 5. Batch
    // -----------------------------------------------------------------------
    let items =
        batch::read_items_until(BufReader::new(tokio::io::stdin()), cancel.cancelled()).await?;
    let mut stdout = tokio::io::stdout();
    let summary = batch::run_batch(&sealer, mode, items, &mut stdout).await?;
    batch::ensure_complete(&summary)
}
