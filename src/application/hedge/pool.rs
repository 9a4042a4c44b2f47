//! Bounded worker pool for hedge dispatch.
//!
//! Submissions never block the trade path: when the queue is full the hedge
//! simply stays pending and the recovery sweep picks it up later. Workers
//! report every resolution on a separate bounded outcome channel.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::hedge::dispatcher::HedgeDispatcher;
use crate::application::risk::manager::RiskManager;
use crate::domain::hedge::HedgeStatus;
use crate::domain::id::HedgeId;
use crate::error::HedgeError;

/// How a dispatched hedge resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum HedgeOutcome {
    Placed { hedge_id: HedgeId },
    /// Refused by risk limits or hedging disabled.
    Refused { hedge_id: HedgeId, reason: String },
    /// Reference market error, timeout, or store failure.
    Failed { hedge_id: HedgeId, error: HedgeError },
}

/// Somewhere to hand pending hedges for asynchronous dispatch.
pub trait HedgeQueue: Send + Sync {
    /// Enqueue without waiting. Returns false when the hedge was not accepted.
    fn submit(&self, hedge_id: HedgeId) -> bool;
}

/// Sink for hedge outcomes, consumed by the failure listener.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    async fn publish(&self, outcome: HedgeOutcome);
}

#[async_trait]
impl OutcomeSink for mpsc::Sender<HedgeOutcome> {
    async fn publish(&self, outcome: HedgeOutcome) {
        if let Err(e) = self.try_send(outcome) {
            warn!(error = %e, "Hedge outcome channel full, outcome dropped");
        }
    }
}

/// Fixed set of workers draining a bounded queue.
pub struct HedgeWorkerPool {
    sender: Mutex<Option<mpsc::Sender<HedgeId>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl HedgeWorkerPool {
    /// Spawn `workers` tasks sharing a queue of `capacity` hedges.
    #[must_use]
    pub fn start(
        dispatcher: Arc<HedgeDispatcher>,
        workers: usize,
        capacity: usize,
        outcomes: Arc<dyn OutcomeSink>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<HedgeId>(capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let dispatcher = Arc::clone(&dispatcher);
                let outcomes = Arc::clone(&outcomes);
                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(hedge_id) = next else {
                            break;
                        };
                        debug!(worker, hedge_id = %hedge_id, "Dispatching hedge");
                        let outcome = match dispatcher.execute(&hedge_id).await {
                            Ok(hedge) => match hedge.status() {
                                HedgeStatus::Placed => HedgeOutcome::Placed { hedge_id },
                                HedgeStatus::Failed => HedgeOutcome::Refused {
                                    hedge_id,
                                    reason: hedge.reason().unwrap_or_default().to_string(),
                                },
                                HedgeStatus::Pending => continue,
                            },
                            Err(error) => HedgeOutcome::Failed { hedge_id, error },
                        };
                        outcomes.publish(outcome).await;
                    }
                    debug!(worker, "Hedge worker stopped");
                })
            })
            .collect();

        info!(workers = workers.max(1), capacity, "Hedge worker pool started");
        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(handles),
        }
    }

    /// Stop accepting hedges and wait for queued ones to drain.
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Hedge worker ended abnormally");
            }
        }
        info!("Hedge worker pool stopped");
    }
}

impl HedgeQueue for HedgeWorkerPool {
    fn submit(&self, hedge_id: HedgeId) -> bool {
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            warn!(hedge_id = %hedge_id, "Hedge pool stopped, hedge left pending");
            return false;
        };
        match sender.try_send(hedge_id) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(hedge_id)) => {
                warn!(hedge_id = %hedge_id, "Hedge queue full, hedge left pending for recovery");
                false
            }
            Err(mpsc::error::TrySendError::Closed(hedge_id)) => {
                warn!(hedge_id = %hedge_id, "Hedge queue closed, hedge left pending");
                false
            }
        }
    }
}

/// Log hedge outcomes and count reference market failures.
pub fn spawn_outcome_listener(
    mut outcomes: mpsc::Receiver<HedgeOutcome>,
    risk: Arc<RiskManager>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(outcome) = outcomes.recv().await {
            match outcome {
                HedgeOutcome::Placed { hedge_id } => {
                    debug!(hedge_id = %hedge_id, "Hedge outcome: placed");
                }
                HedgeOutcome::Refused { hedge_id, reason } => {
                    info!(hedge_id = %hedge_id, reason = %reason, "Hedge outcome: refused");
                }
                HedgeOutcome::Failed { hedge_id, error } => {
                    if matches!(error, HedgeError::External(_) | HedgeError::Timeout { .. }) {
                        risk.record_external_failure();
                    }
                    warn!(hedge_id = %hedge_id, error = %error, "Hedge outcome: failed");
                }
            }
        }
    })
}
