// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Per-account transaction lanes.
//!
//! Every submitted task is appended to the lane of the signing account and
//! runs only after all earlier tasks of that account settled. The lane hands
//! each task the next nonce and moves its cursor forward on success or when
//! the chain reports the nonce as already used. Failures are returned to the
//! submitter as values and never stop the lane.

mod lane;
pub mod queue;

use crate::domain::error::{ChainError, SequencerError};
use crate::network::chain::ChainClient;
use crate::services::events::EventLog;
use alloy::primitives::Address;
use dashmap::DashMap;
use futures::FutureExt;
use lane::{Job, JobFn, Lane, LaneHandle, LaneMessage, Settled};
use queue::{QueueBoard, QueueEntry};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

pub struct Sequencer {
    board: Arc<QueueBoard>,
    events: Arc<EventLog>,
    lanes: DashMap<Address, LaneHandle>,
    confirmation_timeout: Option<Duration>,
}

impl Sequencer {
    pub fn new(events: Arc<EventLog>) -> Self {
        Self {
            board: Arc::new(QueueBoard::new()),
            events,
            lanes: DashMap::new(),
            confirmation_timeout: None,
        }
    }

    /// Fail tasks that have not settled within `limit` with
    /// [`ChainError::Timeout`]. The nonce cursor is left unchanged for them.
    pub fn with_confirmation_timeout(mut self, limit: Option<Duration>) -> Self {
        self.confirmation_timeout = limit;
        self
    }

    /// Queue `task` on the lane of `chain`'s account.
    ///
    /// The entry is recorded and its lane position fixed before this returns;
    /// the returned future only waits for the outcome. Must be called from
    /// within a tokio runtime.
    pub fn submit<C, D, T, F, Fut>(
        &self,
        chain: &Arc<C>,
        description: D,
        task: F,
    ) -> impl Future<Output = Result<T, SequencerError>> + Send + use<C, D, T, F, Fut>
    where
        C: ChainClient,
        D: Into<String>,
        T: Send + 'static,
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ChainError>> + Send + 'static,
    {
        let account = chain.address();
        let description = description.into();
        let id = self.board.enqueue(account, description.clone());
        self.events
            .info(format!("Transaction [{id}] added to queue: {description}"));

        let (reply, outcome) = oneshot::channel();
        let job = Job {
            id,
            run: Self::wrap_task(task, reply, self.confirmation_timeout),
        };

        if let Err(rejected) = self.lane_sender(chain).send(LaneMessage::Run(job)) {
            // Lane task is gone; drop the job (and its reply) and let the
            // next submission spawn a fresh lane.
            drop(rejected);
            self.lanes.remove(&account);
            self.board.remove(id);
            self.events
                .error(format!("Transaction [{id}] dropped: lane unavailable"));
        }

        async move {
            match outcome.await {
                Ok(result) => result.map_err(SequencerError::Task),
                Err(_) => Err(SequencerError::LaneClosed(account.to_string())),
            }
        }
    }

    fn wrap_task<T, F, Fut>(
        task: F,
        reply: oneshot::Sender<Result<T, ChainError>>,
        limit: Option<Duration>,
    ) -> JobFn
    where
        T: Send + 'static,
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ChainError>> + Send + 'static,
    {
        Box::new(move |assigned: Result<u64, ChainError>| {
            async move {
                let result = match assigned {
                    Ok(nonce) => {
                        let guarded = AssertUnwindSafe(task(nonce)).catch_unwind();
                        let finished = match limit {
                            Some(limit) => tokio::time::timeout(limit, guarded).await.map_err(|_| {
                                ChainError::Timeout {
                                    ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                                }
                            }),
                            None => Ok(guarded.await),
                        };
                        match finished {
                            Ok(Ok(result)) => result,
                            Ok(Err(_panic)) => Err(ChainError::Other("transaction task panicked".into())),
                            Err(timed_out) => Err(timed_out),
                        }
                    }
                    Err(e) => Err(e),
                };

                let outcome = match &result {
                    Ok(_) => Ok(()),
                    Err(e) => Err(e.clone()),
                };
                Settled {
                    outcome,
                    deliver: Box::new(move || {
                        // Submitter may have stopped waiting.
                        let _ = reply.send(result);
                    }),
                }
            }
            .boxed()
        })
    }

    fn lane_sender<C: ChainClient>(
        &self,
        chain: &Arc<C>,
    ) -> tokio::sync::mpsc::UnboundedSender<LaneMessage> {
        let account = chain.address();
        let mut lane = self.lanes.entry(account).or_insert_with(|| {
            Lane::spawn(chain.clone(), self.board.clone(), self.events.clone())
        });
        if lane.tx.is_closed() {
            *lane = Lane::spawn(chain.clone(), self.board.clone(), self.events.clone());
        }
        lane.tx.clone()
    }

    /// Non-terminal entries across all lanes, ordered by id.
    pub fn queue_snapshot(&self) -> Vec<QueueEntry> {
        self.board.snapshot()
    }

    /// Nonce the next task of `account` will receive, if the lane is primed.
    pub fn next_nonce(&self, account: Address) -> Option<u64> {
        self.lanes
            .get(&account)
            .and_then(|lane| *lane.nonce.borrow())
    }

    /// Drop the cached nonce of `account`; the next task re-primes from
    /// chain. Ordered behind tasks already queued on that lane.
    pub fn resync(&self, account: Address) {
        if let Some(lane) = self.lanes.get(&account) {
            let _ = lane.tx.send(LaneMessage::Resync);
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }
}
