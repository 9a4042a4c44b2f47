//! Paper reference market.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::port::outbound::reference::{ExternalOrderAck, ExternalOrderRequest, ReferenceMarket};

/// Acknowledges every order as fully filled at its limit.
#[derive(Debug, Default)]
pub struct PaperReferenceMarket {
    placed: AtomicU64,
}

impl PaperReferenceMarket {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders acknowledged so far.
    #[must_use]
    pub fn placed(&self) -> u64 {
        self.placed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReferenceMarket for PaperReferenceMarket {
    async fn place_order(&self, order: &ExternalOrderRequest) -> Result<ExternalOrderAck> {
        let n = self.placed.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            instrument_id = %order.instrument_id,
            side = %order.side,
            size = %order.size,
            price = %order.price,
            "Paper order filled"
        );
        Ok(ExternalOrderAck {
            external_order_id: format!("paper-{n}"),
            filled_size: order.size,
        })
    }

    fn name(&self) -> &'static str {
        "paper"
    }
}
