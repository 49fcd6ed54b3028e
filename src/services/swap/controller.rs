// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::{parse_loop_count, short_hex};
use crate::domain::error::{AppError, SequencerError};
use crate::network::chain::{ChainClient, TxReceipt};
use crate::services::events::EventLog;
use crate::services::sequencer::Sequencer;
use crate::services::sequencer::queue::QueueEntry;
use crate::services::swap::cycle::{
    Phase, RoundOutcome, RoundRecord, RunProgress, RunReport, RunStatus, SwapCycleRun,
};
use crate::services::swap::pacing::{Pacing, SwapAmount, describe_delay, wait_with_cancel};
use crate::services::swap::wallet::WalletContext;
use alloy::primitives::U256;
use alloy::primitives::utils::format_ether;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Clears the running flag however the run ends.
struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Drives alternating wrap/unwrap rounds over every configured wallet.
///
/// All chain writes go through the shared [`Sequencer`], so the controller
/// never touches nonces. Only one run may be active at a time.
pub struct SwapController<C: ChainClient> {
    wallets: Vec<WalletContext<C>>,
    sequencer: Arc<Sequencer>,
    events: Arc<EventLog>,
    pacing: Pacing,
    rng: Mutex<StdRng>,
    running: Arc<AtomicBool>,
    cancel: Mutex<CancellationToken>,
    progress: Mutex<Option<RunProgress>>,
}

impl<C: ChainClient> SwapController<C> {
    pub fn new(
        wallets: Vec<WalletContext<C>>,
        sequencer: Arc<Sequencer>,
        events: Arc<EventLog>,
        pacing: Pacing,
    ) -> Self {
        Self {
            wallets,
            sequencer,
            events,
            pacing,
            rng: Mutex::new(StdRng::from_entropy()),
            running: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(CancellationToken::new()),
            progress: Mutex::new(None),
        }
    }

    /// Deterministic amounts and delays.
    pub fn with_rng_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn wallets(&self) -> &[WalletContext<C>] {
        &self.wallets
    }

    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }

    pub fn queue_snapshot(&self) -> Vec<QueueEntry> {
        self.sequencer.queue_snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> RunStatus {
        if !self.is_running() {
            RunStatus::Idle
        } else if self.current_token().is_cancelled() {
            RunStatus::Cancelling
        } else {
            RunStatus::Active
        }
    }

    pub fn progress(&self) -> Option<RunProgress> {
        *self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Phase of the round in progress, if a run is active.
    pub fn phase(&self) -> Option<Phase> {
        self.progress().map(|p| p.phase)
    }

    /// Ask the active run to stop. It halts before the next round or cuts
    /// the current wait short; a round already on chain is not rolled back.
    /// Returns false when nothing is running.
    pub fn request_cancel(&self) -> bool {
        let token = {
            let current = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
            if !self.is_running() {
                return false;
            }
            current.clone()
        };
        if !token.is_cancelled() {
            token.cancel();
            self.events
                .warning("Stop requested: finishing the current step");
        }
        true
    }

    /// Validate `input` and run the whole cycle to completion.
    pub async fn run_cycle(&self, input: &str) -> Result<RunReport, AppError> {
        let loop_count = self.validate(input)?;
        let (guard, cancel) = self.begin()?;
        let report = self.drive(loop_count, cancel).await;
        drop(guard);
        Ok(report)
    }

    /// Like [`Self::run_cycle`] but on a background task. Validation and the
    /// single-run check happen before this returns.
    pub fn start_run(self: &Arc<Self>, input: &str) -> Result<JoinHandle<RunReport>, AppError> {
        let loop_count = self.validate(input)?;
        let (guard, cancel) = self.begin()?;
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let _guard = guard;
            this.drive(loop_count, cancel).await
        }))
    }

    fn validate(&self, input: &str) -> Result<u32, AppError> {
        parse_loop_count(input).inspect_err(|e| {
            self.events.error(format!("Auto swap not started: {e}"));
        })
    }

    fn begin(&self) -> Result<(RunGuard, CancellationToken), AppError> {
        // Held across the flag flip so a cancel that observes `running`
        // always reaches this run's token.
        let mut current = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            drop(current);
            self.events
                .warning("Auto swap is already running; stop it first");
            return Err(AppError::RunActive);
        }
        let token = CancellationToken::new();
        *current = token.clone();
        drop(current);
        let guard = RunGuard {
            running: self.running.clone(),
        };
        Ok((guard, token))
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn drive(&self, loop_count: u32, cancel: CancellationToken) -> RunReport {
        let mut report = RunReport::new(loop_count);
        let total = self.wallets.len();
        self.events.info(format!(
            "Auto swap ETH & WETH: {loop_count} round(s) on {total} wallet(s)"
        ));
        tracing::info!(target: "swap", loop_count, wallets = total, "Run started");

        for (index, wallet) in self.wallets.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            self.events
                .info(format!("Wallet {}/{total}: {}", index + 1, wallet.label()));
            self.refresh_balances(wallet).await;
            report.wallets_started += 1;

            let mut cycle = SwapCycleRun::new(loop_count, cancel.clone());
            if !self.run_wallet(wallet, &mut cycle, &mut report).await {
                report.cancelled = true;
                break;
            }
        }

        *self.progress.lock().unwrap_or_else(|e| e.into_inner()) = None;
        if report.cancelled {
            self.events.warning("Auto swap stopped by request");
        }
        self.events.info(format!(
            "Auto swap finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        ));
        tracing::info!(
            target: "swap",
            succeeded = report.succeeded(),
            failed = report.failed(),
            cancelled = report.cancelled,
            "Run finished"
        );
        report
    }

    /// Returns false when the run was cancelled.
    async fn run_wallet(
        &self,
        wallet: &WalletContext<C>,
        cycle: &mut SwapCycleRun,
        report: &mut RunReport,
    ) -> bool {
        while cycle.has_next_round() {
            let round = cycle.current_round();
            if cycle.is_cancelled() {
                self.events
                    .warning(format!("Auto swap halted before round {round}"));
                return false;
            }

            let phase = cycle.phase();
            self.set_progress(RunProgress {
                wallet: wallet.address(),
                round,
                loop_count: cycle.loop_count(),
                phase,
            });
            let amount = self.draw_amount();
            self.events.info(format!(
                "Round {round}/{}: swap {amount} {phase}",
                cycle.loop_count()
            ));

            let record = match phase {
                Phase::Wrap => self.wrap_round(wallet, round, amount).await,
                Phase::Unwrap => self.unwrap_round(wallet, round, amount).await,
            };
            report.rounds.push(record);
            cycle.advance();

            if cycle.has_next_round() {
                let delay = self.draw_delay();
                self.events.info(format!(
                    "Round {round} done. Waiting {} before the next swap",
                    describe_delay(delay)
                ));
                report.waits += 1;
                if !wait_with_cancel(delay, cycle.cancel_token()).await {
                    self.events.warning("Auto swap halted during wait");
                    return false;
                }
            }
        }
        true
    }

    async fn wrap_round(
        &self,
        wallet: &WalletContext<C>,
        round: u32,
        amount: SwapAmount,
    ) -> RoundRecord {
        let chain = wallet.chain().clone();
        let events = self.events.clone();
        let wei = amount.wei();
        let result = self
            .sequencer
            .submit(
                wallet.chain(),
                format!("Swap {amount} ETH -> WETH ({})", wallet.label()),
                move |nonce| async move {
                    let hash = chain.submit_wrap(wei, nonce).await?;
                    events.info(format!(
                        "Transaction sent. Hash: {}",
                        short_hex(&format!("{hash:#x}"))
                    ));
                    chain.await_confirmation(hash).await
                },
            )
            .await;

        RoundRecord {
            wallet: wallet.address(),
            round,
            phase: Phase::Wrap,
            amount,
            approval_sent: false,
            outcome: self.report_swap(result),
        }
    }

    async fn unwrap_round(
        &self,
        wallet: &WalletContext<C>,
        round: u32,
        amount: SwapAmount,
    ) -> RoundRecord {
        let (approval_sent, outcome) = match self.ensure_allowance(wallet, round, amount.wei()).await {
            Ok(approved) => {
                let chain = wallet.chain().clone();
                let events = self.events.clone();
                let wei = amount.wei();
                let result = self
                    .sequencer
                    .submit(
                        wallet.chain(),
                        format!("Swap {amount} WETH -> ETH ({})", wallet.label()),
                        move |nonce| async move {
                            let hash = chain.submit_unwrap(wei, nonce).await?;
                            events.info(format!(
                                "Transaction sent. Hash: {}",
                                short_hex(&format!("{hash:#x}"))
                            ));
                            chain.await_confirmation(hash).await
                        },
                    )
                    .await;
                (approved, self.report_swap(result))
            }
            Err((sent, reason)) => (sent, RoundOutcome::Failed(reason)),
        };

        self.refresh_balances(wallet).await;

        RoundRecord {
            wallet: wallet.address(),
            round,
            phase: Phase::Unwrap,
            amount,
            approval_sent,
            outcome,
        }
    }

    /// Approve the wrapped-token contract for the maximum amount when the
    /// current allowance is below `needed`. Ok(true) when an approval was
    /// confirmed; the error carries whether one was sent.
    async fn ensure_allowance(
        &self,
        wallet: &WalletContext<C>,
        round: u32,
        needed: U256,
    ) -> Result<bool, (bool, String)> {
        let owner = wallet.address();
        let spender = wallet.chain().wrapped_token();
        let allowance = wallet.chain().allowance(owner, spender).await.map_err(|e| {
            self.events.error(format!("Allowance check failed: {e}"));
            (false, e.to_string())
        })?;
        if allowance >= needed {
            return Ok(false);
        }

        self.events.info("Transaction needs approval");
        let chain = wallet.chain().clone();
        let events = self.events.clone();
        let result = self
            .sequencer
            .submit(
                wallet.chain(),
                format!("Approve WETH for round {round} ({})", wallet.label()),
                move |nonce| async move {
                    let hash = chain.submit_approval(spender, U256::MAX, nonce).await?;
                    events.info(format!(
                        "Approval sent. Hash: {}",
                        short_hex(&format!("{hash:#x}"))
                    ));
                    chain.await_confirmation(hash).await
                },
            )
            .await;

        match result {
            Ok(_) => {
                self.events.success("Approval confirmed");
                Ok(true)
            }
            Err(e) => {
                self.events.error(format!("Approval failed: {e}"));
                Err((true, e.to_string()))
            }
        }
    }

    fn report_swap(&self, result: Result<TxReceipt, SequencerError>) -> RoundOutcome {
        match result {
            Ok(receipt) => {
                self.events.success(format!(
                    "Swap confirmed. Hash: {}",
                    short_hex(&format!("{:#x}", receipt.hash))
                ));
                RoundOutcome::Succeeded
            }
            Err(e) => {
                self.events.error(format!("Swap error: {e}"));
                RoundOutcome::Failed(e.to_string())
            }
        }
    }

    async fn refresh_balances(&self, wallet: &WalletContext<C>) {
        match wallet.refresh().await {
            Ok(balances) => self.events.info(format!(
                "{}: {} ETH / {} WETH",
                wallet.label(),
                format_ether(balances.native),
                format_ether(balances.wrapped)
            )),
            Err(e) => self
                .events
                .warning(format!("Balance refresh failed for {}: {e}", wallet.label())),
        }
    }

    fn set_progress(&self, progress: RunProgress) {
        *self.progress.lock().unwrap_or_else(|e| e.into_inner()) = Some(progress);
    }

    fn draw_amount(&self) -> SwapAmount {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        self.pacing.draw_amount(&mut *rng)
    }

    fn draw_delay(&self) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        self.pacing.draw_delay(&mut *rng)
    }
}
