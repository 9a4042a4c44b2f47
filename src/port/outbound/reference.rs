//! External reference market port.
//!
//! Hedge orders are replicated onto this venue. The engine treats it as an
//! opaque dependency with its own latency and availability.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::id::InstrumentId;
use crate::domain::order::Side;
use crate::error::Error;

/// Order sent to the reference market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalOrderRequest {
    pub instrument_id: InstrumentId,
    pub side: Side,
    /// Shares.
    pub size: Decimal,
    /// Limit price.
    pub price: Decimal,
}

/// Acknowledgement returned by the reference market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalOrderAck {
    pub external_order_id: String,
    /// Shares filled at acknowledgement time; may be less than requested.
    pub filled_size: Decimal,
}

/// Client for placing orders on the reference market.
#[async_trait]
pub trait ReferenceMarket: Send + Sync {
    /// Place an order.
    async fn place_order(&self, order: &ExternalOrderRequest) -> Result<ExternalOrderAck, Error>;

    /// Venue name for logging.
    fn name(&self) -> &'static str;
}
