// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::short_hex;
use crate::domain::error::ChainError;
use crate::network::chain::ChainClient;
use crate::network::nonce::AccountNonceState;
use crate::services::events::EventLog;
use crate::services::sequencer::queue::{EntryStatus, QueueBoard};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// What a finished job reports back to its lane. `deliver` hands the typed
/// result to the submitter and runs only after the lane has updated its
/// nonce cursor and the queue listing.
pub(crate) struct Settled {
    pub outcome: Result<(), ChainError>,
    pub deliver: Box<dyn FnOnce() + Send>,
}

pub(crate) type JobFn =
    Box<dyn FnOnce(Result<u64, ChainError>) -> BoxFuture<'static, Settled> + Send>;

pub(crate) struct Job {
    pub id: u64,
    pub run: JobFn,
}

pub(crate) enum LaneMessage {
    Run(Job),
    Resync,
}

/// Submission side of a lane.
pub(crate) struct LaneHandle {
    pub tx: mpsc::UnboundedSender<LaneMessage>,
    pub nonce: watch::Receiver<Option<u64>>,
}

/// Single consumer for one account. The lane task is the only owner of the
/// account's nonce cursor, so at most one job holds a nonce at a time.
pub(crate) struct Lane<C: ChainClient> {
    chain: Arc<C>,
    nonce: AccountNonceState,
    board: Arc<QueueBoard>,
    events: Arc<EventLog>,
    published: watch::Sender<Option<u64>>,
    rx: mpsc::UnboundedReceiver<LaneMessage>,
}

impl<C: ChainClient> Lane<C> {
    /// Start the lane task on the current tokio runtime.
    pub fn spawn(chain: Arc<C>, board: Arc<QueueBoard>, events: Arc<EventLog>) -> LaneHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (published, nonce) = watch::channel(None);
        let lane = Lane {
            chain,
            nonce: AccountNonceState::new(),
            board,
            events,
            published,
            rx,
        };
        tokio::spawn(lane.run());
        LaneHandle { tx, nonce }
    }

    async fn run(mut self) {
        let account = self.chain.address();
        tracing::debug!(target: "sequencer", %account, "Lane started");
        while let Some(message) = self.rx.recv().await {
            match message {
                LaneMessage::Run(job) => self.process(job).await,
                LaneMessage::Resync => {
                    self.nonce.resync();
                    self.publish();
                    self.events.info(format!(
                        "Nonce for {} will be re-read from chain",
                        short_hex(&account.to_string())
                    ));
                }
            }
        }
        tracing::debug!(target: "sequencer", %account, "Lane closed");
    }

    async fn process(&mut self, job: Job) {
        let id = job.id;
        self.board.set_status(id, EntryStatus::Processing);
        self.events
            .info(format!("Transaction [{id}] started processing"));

        let assigned = match self.nonce.acquire(self.chain.as_ref()).await {
            Ok((nonce, primed)) => {
                if primed {
                    self.events.info(format!("Initial nonce: {nonce}"));
                    self.publish();
                }
                Ok(nonce)
            }
            Err(e) => {
                tracing::warn!(target: "sequencer", id, error = %e, "Nonce priming failed");
                Err(e)
            }
        };
        let had_nonce = assigned.is_ok();

        let settled = (job.run)(assigned).await;
        match &settled.outcome {
            Ok(()) => {
                self.nonce.record_success();
                self.board.set_status(id, EntryStatus::Completed);
                self.events.info(format!("Transaction [{id}] completed"));
            }
            Err(e) => {
                self.board.set_status(id, EntryStatus::Failed);
                self.events
                    .error(format!("Transaction [{id}] failed: {e}"));
                if had_nonce && self.nonce.record_failure(e) {
                    let next = self.nonce.next_nonce().unwrap_or_default();
                    self.events.warning(format!(
                        "Nonce was already used; advanced to {next}"
                    ));
                }
            }
        }
        self.publish();
        self.board.remove(id);
        (settled.deliver)();
    }

    fn publish(&self) {
        self.published.send_replace(self.nonce.next_nonce());
    }
}
