//! Builders for domain primitives used across tests.

use rust_decimal::Decimal;

use crate::domain::curve::LmsrCurve;
use crate::domain::id::{InstrumentId, MarketId, OutcomeId, UserId};
use crate::domain::mapping::{InstrumentMap, InstrumentMapping};
use crate::domain::market::{Market, Outcome};
use crate::domain::order::{OrderType, Side};
use crate::port::inbound::trade::TradeRequest;

/// A binary market with outcomes `yes` and `no`, both at 0.5.
pub fn binary_market(id: &str, liquidity: f64) -> Market {
    let curve = LmsrCurve::new(liquidity).expect("positive liquidity");
    Market::binary(
        MarketId::new(id),
        format!("{id}?"),
        Outcome::new("yes", "Yes"),
        Outcome::new("no", "No"),
        curve,
    )
    .expect("distinct outcomes")
}

/// Instrument id used by [`mappings`]: `ext-{market}-{outcome}`.
pub fn instrument(market: &str, outcome: &str) -> InstrumentId {
    InstrumentId::new(format!("ext-{market}-{outcome}"))
}

/// One mapping per outcome of `market`.
pub fn mappings(market: &Market) -> Vec<InstrumentMapping> {
    market
        .outcomes()
        .iter()
        .map(|outcome| InstrumentMapping {
            market_id: market.id().clone(),
            outcome_id: outcome.id().clone(),
            instrument_id: instrument(market.id().as_str(), outcome.id().as_str()),
            display_name: outcome.display_name().to_string(),
        })
        .collect()
}

pub fn instrument_map(markets: &[&Market]) -> InstrumentMap {
    InstrumentMap::new(markets.iter().flat_map(|market| mappings(market))).expect("unambiguous mappings")
}

/// A market order for `amount` of collateral.
pub fn market_order(user: &str, market: &str, outcome: &str, side: Side, amount: Decimal) -> TradeRequest {
    TradeRequest {
        user_id: UserId::new(user),
        market_id: MarketId::new(market),
        outcome_id: OutcomeId::new(outcome),
        side,
        amount,
        limit_price: None,
        order_type: OrderType::Market,
    }
}

/// A limit order for `amount` of collateral at `price`.
pub fn limit_order(
    user: &str,
    market: &str,
    outcome: &str,
    side: Side,
    amount: Decimal,
    price: Decimal,
) -> TradeRequest {
    TradeRequest {
        user_id: UserId::new(user),
        market_id: MarketId::new(market),
        outcome_id: OutcomeId::new(outcome),
        side,
        amount,
        limit_price: Some(price),
        order_type: OrderType::Limit,
    }
}
