// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::services::swap::pacing::SwapAmount;
use alloy::primitives::Address;
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Native asset into the wrapped token.
    Wrap,
    /// Wrapped token back into the native asset.
    Unwrap,
}

impl Phase {
    pub fn flipped(self) -> Self {
        match self {
            Phase::Wrap => Phase::Unwrap,
            Phase::Unwrap => Phase::Wrap,
        }
    }

    /// Phase after `rounds` completed rounds starting from Wrap.
    pub fn after_rounds(rounds: u32) -> Self {
        if rounds % 2 == 0 {
            Phase::Wrap
        } else {
            Phase::Unwrap
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Wrap => f.write_str("ETH -> WETH"),
            Phase::Unwrap => f.write_str("WETH -> ETH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Idle,
    Active,
    Cancelling,
}

/// Round state of one wallet's sub-run.
#[derive(Debug, Clone)]
pub struct SwapCycleRun {
    loop_count: u32,
    current_round: u32,
    phase: Phase,
    cancel: CancellationToken,
}

impl SwapCycleRun {
    pub fn new(loop_count: u32, cancel: CancellationToken) -> Self {
        Self {
            loop_count,
            current_round: 1,
            phase: Phase::Wrap,
            cancel,
        }
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn has_next_round(&self) -> bool {
        self.current_round <= self.loop_count
    }

    /// Close the current round. The phase flips whatever the round's outcome.
    pub fn advance(&mut self) {
        self.phase = self.phase.flipped();
        self.current_round += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RoundOutcome {
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundRecord {
    pub wallet: Address,
    pub round: u32,
    pub phase: Phase,
    pub amount: SwapAmount,
    pub approval_sent: bool,
    pub outcome: RoundOutcome,
}

/// Live position of the active run, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunProgress {
    pub wallet: Address,
    pub round: u32,
    pub loop_count: u32,
    pub phase: Phase,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub loop_count: u32,
    pub wallets_started: usize,
    pub rounds: Vec<RoundRecord>,
    pub waits: u32,
    pub cancelled: bool,
}

impl RunReport {
    pub fn new(loop_count: u32) -> Self {
        Self {
            loop_count,
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> usize {
        self.rounds
            .iter()
            .filter(|r| r.outcome == RoundOutcome::Succeeded)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.rounds.len() - self.succeeded()
    }

    pub fn approvals(&self) -> usize {
        self.rounds.iter().filter(|r| r.approval_sent).count()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.rounds.iter().map(|r| r.phase).collect()
    }
}
