// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod controller;
pub mod cycle;
pub mod pacing;
pub mod wallet;

pub use controller::SwapController;
pub use cycle::{Phase, RoundOutcome, RunReport, RunStatus};
pub use wallet::WalletContext;
