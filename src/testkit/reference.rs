//! Scripted [`ReferenceMarket`] for testing hedge dispatch.
//!
//! Each `place_order` call pops the next [`Step`]; once the script runs out
//! every order is filled in full. Every request is recorded.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::port::outbound::reference::{ExternalOrderAck, ExternalOrderRequest, ReferenceMarket};

/// One scripted answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Fill the full size.
    Fill,
    /// Fill only this size.
    Partial(Decimal),
    /// Fail with a venue error.
    Reject(String),
    /// Wait, then fill in full.
    Delay(Duration),
    /// Never answer.
    Hang,
}

pub struct ScriptedReference {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<ExternalOrderRequest>>,
}

impl ScriptedReference {
    pub fn new() -> Self {
        Self::with_script([])
    }

    pub fn with_script(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Append a step to the script.
    pub fn push(&self, step: Step) {
        self.script.lock().push_back(step);
    }

    /// Requests received so far, in arrival order.
    pub fn calls(&self) -> Vec<ExternalOrderRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for ScriptedReference {
    fn default() -> Self {
        Self::new()
    }
}

fn ack(order: &ExternalOrderRequest, filled_size: Decimal, n: usize) -> ExternalOrderAck {
    ExternalOrderAck {
        external_order_id: format!("scripted-{n}-{}", order.instrument_id),
        filled_size,
    }
}

#[async_trait]
impl ReferenceMarket for ScriptedReference {
    async fn place_order(&self, order: &ExternalOrderRequest) -> Result<ExternalOrderAck> {
        let n = {
            let mut calls = self.calls.lock();
            calls.push(order.clone());
            calls.len()
        };
        let step = self.script.lock().pop_front().unwrap_or(Step::Fill);
        match step {
            Step::Fill => Ok(ack(order, order.size, n)),
            Step::Partial(size) => Ok(ack(order, size, n)),
            Step::Reject(message) => Err(Error::Connection(message)),
            Step::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(ack(order, order.size, n))
            }
            Step::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
