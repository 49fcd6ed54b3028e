// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

mod common;

use alloy::primitives::U256;
use common::{Call, FakeChain, account, count_events, has_event, weth};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use weth_cycler::domain::error::{AppError, ChainError};
use weth_cycler::network::chain::ChainClient;
use weth_cycler::services::events::{EventLevel, EventLog};
use weth_cycler::services::sequencer::Sequencer;
use weth_cycler::services::swap::pacing::Pacing;
use weth_cycler::services::swap::{Phase, RoundOutcome, RunStatus, SwapController, WalletContext};

fn controller(chains: &[Arc<FakeChain>]) -> (Arc<SwapController<FakeChain>>, Arc<EventLog>) {
    let events = Arc::new(EventLog::default());
    let sequencer = Arc::new(Sequencer::new(events.clone()));
    let wallets = chains
        .iter()
        .map(|chain| WalletContext::new(chain.clone()))
        .collect();
    let controller = SwapController::new(wallets, sequencer, events.clone(), Pacing::default())
        .with_rng_seed(42);
    (Arc::new(controller), events)
}

#[tokio::test(start_paused = true)]
async fn three_rounds_alternate_with_waits_between() {
    let chain = Arc::new(FakeChain::new(account(1)));
    let (controller, events) = controller(&[chain.clone()]);

    let started = Instant::now();
    let report = controller.run_cycle("3").await.expect("run");

    assert_eq!(report.phases(), vec![Phase::Wrap, Phase::Unwrap, Phase::Wrap]);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.waits, 2);
    assert_eq!(report.approvals(), 0);
    assert!(!report.cancelled);
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(count_events(&events, "Waiting"), 2);

    let calls = chain.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0],
        Call::Wrap {
            amount: report.rounds[0].amount.wei(),
            nonce: 0
        }
    );
    assert_eq!(
        calls[1],
        Call::Unwrap {
            amount: report.rounds[1].amount.wei(),
            nonce: 1
        }
    );
    assert_eq!(
        calls[2],
        Call::Wrap {
            amount: report.rounds[2].amount.wei(),
            nonce: 2
        }
    );
    for round in &report.rounds {
        assert!((100..=1_000).contains(&round.amount.micros()));
    }

    // Wallet start plus the single unwrap round.
    assert_eq!(chain.balance_reads(), 2);
    assert!(!controller.is_running());
    assert_eq!(controller.status(), RunStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn invalid_round_counts_are_rejected() {
    let chain = Arc::new(FakeChain::new(account(2)));
    let (controller, events) = controller(&[chain.clone()]);

    for input in ["abc", "", "   ", "0", "-2"] {
        let err = controller.run_cycle(input).await.expect_err(input);
        assert!(matches!(err, AppError::Validation { .. }), "{input}: {err}");
    }
    assert!(controller.start_run("abc").is_err());

    assert!(chain.calls().is_empty());
    assert_eq!(chain.balance_reads(), 0);
    assert!(!controller.is_running());
    assert!(has_event(&events, EventLevel::Error, "Auto swap not started"));
}

#[tokio::test(start_paused = true)]
async fn approval_precedes_unwrap_when_allowance_is_short() {
    let chain = Arc::new(FakeChain::new(account(3)).with_allowance(U256::ZERO));
    let (controller, events) = controller(&[chain.clone()]);

    let report = controller.run_cycle("2").await.expect("run");

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.approvals(), 1);
    assert!(report.rounds[1].approval_sent);

    let calls = chain.calls();
    assert!(matches!(calls[0], Call::Wrap { nonce: 0, .. }));
    assert_eq!(
        calls[1],
        Call::Approve {
            spender: weth(),
            amount: U256::MAX,
            nonce: 1
        }
    );
    assert!(matches!(calls[2], Call::Unwrap { nonce: 2, .. }));
    assert!(has_event(&events, EventLevel::Info, "Transaction needs approval"));
    assert!(has_event(&events, EventLevel::Success, "Approval confirmed"));
}

#[tokio::test(start_paused = true)]
async fn failed_approval_fails_round_without_withdrawal() {
    let chain = Arc::new(FakeChain::new(account(4)).with_allowance(U256::ZERO));
    chain.fail_approvals(true);
    let (controller, events) = controller(&[chain.clone()]);

    let report = controller.run_cycle("2").await.expect("run");

    assert_eq!(report.rounds[0].outcome, RoundOutcome::Succeeded);
    assert!(matches!(report.rounds[1].outcome, RoundOutcome::Failed(_)));
    assert!(report.rounds[1].approval_sent);
    assert_eq!(chain.calls().len(), 1);
    assert!(has_event(&events, EventLevel::Error, "Approval failed"));
}

#[tokio::test(start_paused = true)]
async fn failed_round_still_flips_phase() {
    let chain = Arc::new(FakeChain::new(account(5)));
    chain.fail_next_submit(ChainError::Rpc("gas required exceeds allowance".into()));
    let (controller, events) = controller(&[chain.clone()]);

    let report = controller.run_cycle("3").await.expect("run");

    assert_eq!(report.phases(), vec![Phase::Wrap, Phase::Unwrap, Phase::Wrap]);
    assert!(matches!(report.rounds[0].outcome, RoundOutcome::Failed(_)));
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    // The failed broadcast did not consume nonce 0.
    assert!(matches!(chain.calls()[0], Call::Unwrap { nonce: 0, .. }));
    assert!(matches!(chain.calls()[1], Call::Wrap { nonce: 1, .. }));
    assert!(has_event(&events, EventLevel::Error, "Swap error"));
}

#[tokio::test(start_paused = true)]
async fn failed_unwrap_round_still_refreshes_balances() {
    let chain = Arc::new(FakeChain::new(account(6)));
    chain.fail_allowance(true);
    let (controller, events) = controller(&[chain.clone()]);

    let report = controller.run_cycle("2").await.expect("run");

    assert!(matches!(report.rounds[1].outcome, RoundOutcome::Failed(_)));
    assert_eq!(chain.calls().len(), 1);
    assert_eq!(chain.balance_reads(), 2);
    assert!(has_event(&events, EventLevel::Error, "Allowance check failed"));
}

#[tokio::test(start_paused = true)]
async fn balance_refresh_failure_is_only_a_warning() {
    let chain = Arc::new(FakeChain::new(account(7)));
    chain.fail_balances(true);
    let (controller, events) = controller(&[chain.clone()]);

    let report = controller.run_cycle("2").await.expect("run");

    assert_eq!(report.succeeded(), 2);
    assert!(has_event(&events, EventLevel::Warning, "Balance refresh failed"));
}

#[tokio::test(start_paused = true)]
async fn cancel_during_wait_stops_promptly() {
    let chain = Arc::new(FakeChain::new(account(8)));
    let (controller, events) = controller(&[chain.clone()]);

    let handle = controller.start_run("5").expect("start");
    while chain.calls().is_empty() {
        sleep(Duration::from_millis(50)).await;
    }
    // First round confirmed; the run now sits in its 30-60s wait.
    sleep(Duration::from_secs(1)).await;
    assert!(controller.is_running());
    assert_eq!(controller.status(), RunStatus::Active);
    assert_eq!(controller.progress().map(|p| p.round), Some(1));
    assert_eq!(controller.phase(), Some(Phase::Wrap));

    let cancelled_at = Instant::now();
    assert!(controller.request_cancel());
    let report = handle.await.expect("join");

    assert!(cancelled_at.elapsed() < Duration::from_secs(1));
    assert!(report.cancelled);
    assert_eq!(report.rounds.len(), 1);
    assert_eq!(chain.calls().len(), 1);
    assert!(!controller.is_running());
    assert_eq!(controller.progress(), None);
    assert!(has_event(&events, EventLevel::Warning, "Stop requested"));
    assert!(has_event(&events, EventLevel::Warning, "stopped by request"));
}

#[tokio::test(start_paused = true)]
async fn cancel_during_last_round_ends_the_whole_run() {
    let a = Arc::new(FakeChain::new(account(13)).with_latency(Duration::from_secs(5)));
    let b = Arc::new(FakeChain::new(account(14)));
    let (controller, events) = controller(&[a.clone(), b.clone()]);

    let handle = controller.start_run("1").expect("start");
    while a.calls().is_empty() {
        sleep(Duration::from_millis(50)).await;
    }
    // Wallet A's only round is broadcast and waiting for its receipt.
    assert!(controller.request_cancel());
    let report = handle.await.expect("join");

    assert!(report.cancelled);
    assert_eq!(report.wallets_started, 1);
    assert_eq!(report.rounds.len(), 1);
    assert_eq!(report.rounds[0].wallet, a.address());
    assert_eq!(report.rounds[0].outcome, RoundOutcome::Succeeded);
    assert_eq!(report.waits, 0);
    assert!(b.calls().is_empty());
    assert_eq!(b.balance_reads(), 0);
    assert_eq!(count_events(&events, "Wallet 2/2"), 0);
    assert!(has_event(&events, EventLevel::Warning, "stopped by request"));
}

#[tokio::test(start_paused = true)]
async fn cancel_before_first_round_sends_nothing() {
    let chain = Arc::new(
        FakeChain::new(account(15)).with_balance_latency(Duration::from_secs(2)),
    );
    let (controller, events) = controller(&[chain.clone()]);

    let handle = controller.start_run("3").expect("start");
    while chain.balance_reads() == 0 {
        sleep(Duration::from_millis(10)).await;
    }
    // The run is still refreshing balances ahead of round 1.
    assert!(controller.request_cancel());
    let report = handle.await.expect("join");

    assert!(report.cancelled);
    assert_eq!(report.wallets_started, 1);
    assert!(report.rounds.is_empty());
    assert!(chain.calls().is_empty());
    assert!(has_event(&events, EventLevel::Warning, "halted before round 1"));
}

#[tokio::test(start_paused = true)]
async fn cancel_right_after_start_reaches_the_new_run() {
    let chain = Arc::new(FakeChain::new(account(16)));
    let (controller, events) = controller(&[chain.clone()]);

    // A finished run leaves its spent token behind.
    controller.run_cycle("1").await.expect("first run");

    let handle = controller.start_run("3").expect("start");
    assert!(controller.request_cancel());
    assert_eq!(controller.status(), RunStatus::Cancelling);
    let report = handle.await.expect("join");

    assert!(report.cancelled);
    assert_eq!(report.wallets_started, 0);
    assert!(report.rounds.is_empty());
    assert_eq!(chain.calls().len(), 1);
    assert!(has_event(&events, EventLevel::Warning, "Stop requested"));
}

#[tokio::test(start_paused = true)]
async fn cancel_without_active_run_is_a_no_op() {
    let chain = Arc::new(FakeChain::new(account(9)));
    let (controller, _) = controller(&[chain.clone()]);

    assert!(!controller.request_cancel());
    let report = controller.run_cycle("1").await.expect("run");
    assert!(!report.cancelled);
    assert_eq!(report.succeeded(), 1);
}

#[tokio::test(start_paused = true)]
async fn second_run_is_rejected_while_active() {
    let chain = Arc::new(FakeChain::new(account(10)));
    let (controller, _) = controller(&[chain.clone()]);

    let handle = controller.start_run("2").expect("first start");
    assert!(matches!(controller.start_run("2"), Err(AppError::RunActive)));
    assert!(matches!(
        controller.run_cycle("1").await,
        Err(AppError::RunActive)
    ));

    let report = handle.await.expect("join");
    assert_eq!(report.rounds.len(), 2);
    assert!(!controller.is_running());

    let again = controller.run_cycle("1").await.expect("idle again");
    assert_eq!(again.phases(), vec![Phase::Wrap]);
    assert_eq!(chain.nonces(), vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn wallets_run_in_order_each_starting_with_wrap() {
    let a = Arc::new(FakeChain::new(account(11)));
    let b = Arc::new(FakeChain::new(account(12)).with_pending_nonce(40));
    let (controller, _) = controller(&[a.clone(), b.clone()]);

    let report = controller.run_cycle("2").await.expect("run");

    assert_eq!(report.wallets_started, 2);
    assert_eq!(
        report.phases(),
        vec![Phase::Wrap, Phase::Unwrap, Phase::Wrap, Phase::Unwrap]
    );
    let owners: Vec<_> = report.rounds.iter().map(|r| r.wallet).collect();
    assert_eq!(
        owners,
        vec![a.address(), a.address(), b.address(), b.address()]
    );
    assert_eq!(report.waits, 2);
    assert_eq!(a.nonces(), vec![0, 1]);
    assert_eq!(b.nonces(), vec![40, 41]);
    assert_eq!(controller.sequencer().lane_count(), 2);
}
