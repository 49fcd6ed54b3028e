// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("A swap cycle is already running")]
    RunActive,

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Failure raised by the chain client or by a queued transaction task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("nonce has already been used: {0}")]
    NonceAlreadyUsed(String),

    #[error("transaction {hash} reverted")]
    Reverted { hash: String },

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("confirmation timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("{0}")]
    Other(String),
}

// A pending transaction holding the nonce counts as a use: it is mined or
// replaced, never reissued by this account.
const NONCE_USED_MARKERS: [&str; 5] = [
    "nonce has already been used",
    "nonce too low",
    "already known",
    "replacement transaction underpriced",
    "replacement fee too low",
];

impl ChainError {
    /// Map a raw node/transport message onto the taxonomy.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_ascii_lowercase();
        if NONCE_USED_MARKERS.iter().any(|m| lowered.contains(m)) {
            ChainError::NonceAlreadyUsed(message)
        } else {
            ChainError::Rpc(message)
        }
    }

    pub fn is_nonce_already_used(&self) -> bool {
        matches!(self, ChainError::NonceAlreadyUsed(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    #[error(transparent)]
    Task(#[from] ChainError),

    #[error("sequencer lane for {0} closed before the task settled")]
    LaneClosed(String),
}

impl SequencerError {
    pub fn chain_error(&self) -> Option<&ChainError> {
        match self {
            SequencerError::Task(e) => Some(e),
            SequencerError::LaneClosed(_) => None,
        }
    }
}
