// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::utils::format_ether;
use clap::Parser;
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use weth_cycler::app::config::GlobalSettings;
use weth_cycler::app::logging::setup_logging;
use weth_cycler::common::parsing::parse_loop_count;
use weth_cycler::domain::constants::EVENT_LOG_CAPACITY;
use weth_cycler::domain::error::AppError;
use weth_cycler::infrastructure::network::client::AlloyChainClient;
use weth_cycler::infrastructure::network::provider::ConnectionFactory;
use weth_cycler::services::events::EventLog;
use weth_cycler::services::sequencer::Sequencer;
use weth_cycler::services::swap::{SwapController, WalletContext};

#[derive(Parser, Debug)]
#[command(author, version, about = "ETH/WETH wrap-unwrap cycler")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Rounds per wallet; prompted on stdin when omitted
    #[arg(long)]
    rounds: Option<String>,

    /// Debug logging (overrides config/env)
    #[arg(long, default_value_t = false)]
    debug: bool,
}

async fn prompt_rounds() -> Result<String, AppError> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout
            .write_all(b"How many swap rounds per wallet? ")
            .await
            .map_err(|e| AppError::Initialization(format!("stdout: {e}")))?;
        stdout
            .flush()
            .await
            .map_err(|e| AppError::Initialization(format!("stdout: {e}")))?;

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| AppError::Initialization(format!("stdin: {e}")))?
        else {
            return Err(AppError::Validation {
                field: "rounds".into(),
                message: "no input".into(),
            });
        };
        match parse_loop_count(&line) {
            Ok(_) => return Ok(line),
            Err(e) => tracing::warn!(target: "config", error = %e, "Invalid round count"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    let debug = cli.debug || settings.debug;
    setup_logging(if debug { "debug" } else { "info" }, settings.log_json);

    let keys = settings.signing_keys();
    tracing::info!(
        target: "config",
        network = %settings.network_name,
        rpc = %settings.rpc_url,
        weth = %settings.weth_address,
        wallets = keys.len(),
        proxies = settings.proxies.len(),
        "Configuration loaded"
    );

    let clients = try_join_all(keys.iter().enumerate().map(|(idx, key)| {
        let settings = &settings;
        async move {
            let provider =
                ConnectionFactory::preferred(&settings.rpc_url, settings.proxy_for_wallet(idx))?;
            AlloyChainClient::connect(
                provider,
                key,
                settings.weth_address,
                settings.gas_limit,
                settings.receipt_poll_interval(),
            )
            .await
        }
    }))
    .await?;

    let events = Arc::new(EventLog::new(EVENT_LOG_CAPACITY));
    let sequencer = Arc::new(
        Sequencer::new(events.clone()).with_confirmation_timeout(settings.confirmation_timeout()),
    );
    let wallets = clients
        .into_iter()
        .map(|client| WalletContext::new(Arc::new(client)))
        .collect();
    let controller = Arc::new(SwapController::new(
        wallets,
        sequencer,
        events,
        settings.pacing(),
    ));

    let rounds = match cli.rounds {
        Some(rounds) => rounds,
        None => prompt_rounds().await?,
    };

    // First Ctrl-C stops the run after the current step, the second exits.
    let interrupt = controller.clone();
    tokio::spawn(async move {
        let mut requested = false;
        while tokio::signal::ctrl_c().await.is_ok() {
            if requested || !interrupt.request_cancel() {
                tracing::warn!(target: "swap", "Interrupted; exiting");
                std::process::exit(130);
            }
            requested = true;
        }
    });

    let report = controller.run_cycle(&rounds).await?;
    tracing::info!(
        target: "swap",
        rounds = report.rounds.len(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        approvals = report.approvals(),
        cancelled = report.cancelled,
        "Auto swap report"
    );
    for wallet in controller.wallets() {
        let balances = wallet.balances();
        tracing::info!(
            target: "swap",
            wallet = %wallet.address(),
            eth = %format_ether(balances.native),
            weth = %format_ether(balances.wrapped),
            refreshed_at = ?balances.refreshed_at,
            "Final balances"
        );
    }
    Ok(())
}
