//! Pure fill planning for the hybrid matcher.
//!
//! The planner walks the resting book and the curve on private copies of
//! both, so nothing shared changes until the caller commits the plan. At
//! every step the taker gets whichever source is cheaper: a resting order
//! priced at or better than the curve is taken first; otherwise the curve
//! fills until its price reaches the next resting order or the taker's limit.

use rust_decimal::Decimal;

use crate::domain::book::OrderBook;
use crate::domain::curve::{PRICE_CEILING, PRICE_FLOOR};
use crate::domain::error::DomainError;
use crate::domain::fill::FillSource;
use crate::domain::id::{OrderId, OutcomeId};
use crate::domain::market::Market;
use crate::domain::money::{from_f64, to_f64, Price, Volume, AMOUNT_SCALE, DUST};
use crate::domain::order::{Order, Side};

/// Upper bound on planning steps for a single order.
const MAX_STEPS: usize = 4096;

/// Tolerance when comparing a resting price with the curve price.
const PRICE_EPSILON: f64 = 1e-12;

/// One fill the plan will produce.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFill {
    pub source: FillSource,
    /// The resting order after this fill, for book fills.
    pub maker: Option<Order>,
    pub price: Price,
    pub amount: Volume,
    pub shares: Volume,
}

/// Fills and the post-trade state of the book and curve.
#[derive(Debug, Clone)]
pub struct MatchPlan {
    pub fills: Vec<PlannedFill>,
    pub book: OrderBook,
    pub quantities: Vec<f64>,
    pub filled: Volume,
    pub price_before: f64,
    pub price_after: f64,
}

impl MatchPlan {
    #[must_use]
    pub fn remainder(&self, requested: Volume) -> Volume {
        (requested - self.filled).max(Decimal::ZERO)
    }
}

/// What the taker wants.
#[derive(Debug, Clone, Copy)]
pub struct Taker<'a> {
    pub outcome_id: &'a OutcomeId,
    pub outcome: usize,
    pub side: Side,
    pub limit: Option<Price>,
    pub amount: Volume,
}

#[derive(Debug, Clone)]
struct Resting {
    id: OrderId,
    price: Price,
    remaining: Volume,
}

/// Plan the fills for a taker against `book` and `market`'s curve.
///
/// # Errors
///
/// Only on book inconsistencies; an unfillable order yields an empty plan.
pub fn plan(market: &Market, book: &OrderBook, taker: Taker<'_>) -> Result<MatchPlan, DomainError> {
    let curve = market.curve();
    let mut quantities = market.quantities();
    let mut book = book.clone();
    let mut fills = Vec::new();
    let mut remaining = taker.amount;
    let price_before = curve.price(&quantities, taker.outcome);

    let bound = taker.limit.map_or(
        match taker.side {
            Side::Buy => PRICE_CEILING,
            Side::Sell => PRICE_FLOOR,
        },
        to_f64,
    );

    for _ in 0..MAX_STEPS {
        if remaining <= DUST {
            break;
        }
        let resting = best_resting(&book, &taker);
        let curve_price = curve.price(&quantities, taker.outcome);

        if let Some(maker) = &resting {
            if at_or_better(to_f64(maker.price), curve_price, taker.side) {
                remaining -= take_resting(&mut book, maker, remaining, &mut fills)?;
                continue;
            }
        }

        let target = match (&resting, taker.side) {
            (Some(maker), Side::Buy) => bound.min(to_f64(maker.price)),
            (Some(maker), Side::Sell) => bound.max(to_f64(maker.price)),
            (None, _) => bound,
        };
        let budget = from_f64(curve.notional_to_price(&quantities, taker.outcome, taker.side, target))
            .unwrap_or(Decimal::ZERO);

        if budget <= DUST {
            // The curve has reached the next resting price.
            match &resting {
                Some(maker) => {
                    remaining -= take_resting(&mut book, maker, remaining, &mut fills)?;
                    continue;
                }
                None => break,
            }
        }

        let chunk = remaining.min(budget);
        let Some(quote) = curve.quote(&quantities, taker.outcome, taker.side, to_f64(chunk)) else {
            break;
        };
        let Some(shares) = from_f64(quote.shares).filter(|s| *s > Decimal::ZERO) else {
            break;
        };

        match taker.side {
            Side::Buy => quantities[taker.outcome] += quote.shares,
            Side::Sell => quantities[taker.outcome] -= quote.shares,
        }
        let mut price = (chunk / shares).round_dp(AMOUNT_SCALE);
        if let Some(limit) = taker.limit {
            price = match taker.side {
                Side::Buy => price.min(limit),
                Side::Sell => price.max(limit),
            };
        }
        fills.push(PlannedFill {
            source: FillSource::Curve,
            maker: None,
            price,
            amount: chunk,
            shares,
        });
        remaining -= chunk;
    }

    let filled = taker.amount - remaining;
    let price_after = curve.price(&quantities, taker.outcome);
    Ok(MatchPlan {
        fills,
        book,
        quantities,
        filled,
        price_before,
        price_after,
    })
}

fn best_resting(book: &OrderBook, taker: &Taker<'_>) -> Option<Resting> {
    let order = book.best(taker.outcome_id, taker.side.opposite())?;
    let price = order.limit_price()?;
    let within_limit = match (taker.limit, taker.side) {
        (None, _) => true,
        (Some(limit), Side::Buy) => price <= limit,
        (Some(limit), Side::Sell) => price >= limit,
    };
    within_limit.then(|| Resting {
        id: order.id().clone(),
        price,
        remaining: order.remaining(),
    })
}

fn at_or_better(resting: f64, curve: f64, side: Side) -> bool {
    match side {
        Side::Buy => resting <= curve + PRICE_EPSILON,
        Side::Sell => resting >= curve - PRICE_EPSILON,
    }
}

fn take_resting(
    book: &mut OrderBook,
    maker: &Resting,
    remaining: Volume,
    fills: &mut Vec<PlannedFill>,
) -> Result<Volume, DomainError> {
    let amount = remaining.min(maker.remaining);
    let updated = book.fill(&maker.id, amount)?;
    fills.push(PlannedFill {
        source: FillSource::Book,
        maker: Some(updated),
        price: maker.price,
        amount,
        shares: (amount / maker.price).round_dp(AMOUNT_SCALE),
    });
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::curve::LmsrCurve;
    use crate::domain::id::{MarketId, UserId};
    use crate::domain::market::Outcome;
    use crate::domain::order::OrderType;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn market(b: f64) -> Market {
        Market::binary(
            MarketId::new("m"),
            "Will it rain?",
            Outcome::new("yes", "Yes"),
            Outcome::new("no", "No"),
            LmsrCurve::new(b).unwrap(),
        )
        .unwrap()
    }

    fn resting(id: &str, side: Side, price: Decimal, amount: Decimal, age_secs: i64, seq: u64) -> Order {
        Order::try_new(
            OrderId::new(id),
            UserId::new("maker"),
            MarketId::new("m"),
            OutcomeId::new("yes"),
            side,
            OrderType::Limit,
            Some(price),
            amount,
            Utc::now() - Duration::seconds(age_secs),
            seq,
        )
        .unwrap()
    }

    fn buy(yes: &OutcomeId, limit: Option<Decimal>, amount: Decimal) -> Taker<'_> {
        Taker {
            outcome_id: yes,
            outcome: 0,
            side: Side::Buy,
            limit,
            amount,
        }
    }

    #[test]
    fn empty_book_fills_entirely_on_curve() {
        let market = market(10_000.0);
        let yes = OutcomeId::new("yes");
        let plan = plan(&market, &OrderBook::new(MarketId::new("m")), buy(&yes, None, dec!(100))).unwrap();

        assert_eq!(plan.filled, dec!(100));
        assert_eq!(plan.fills.len(), 1);
        assert_eq!(plan.fills[0].source, FillSource::Curve);
        assert!(plan.price_after > 0.5 && plan.price_after < 1.0);
        assert!(plan.fills[0].price > dec!(0.5) && plan.fills[0].price < dec!(0.51));
    }

    #[test]
    fn cheaper_resting_order_fills_before_curve() {
        let market = market(10_000.0);
        let yes = OutcomeId::new("yes");
        let mut book = OrderBook::new(MarketId::new("m"));
        book.insert(resting("ask", Side::Sell, dec!(0.45), dec!(10), 5, 1)).unwrap();

        let plan = plan(&market, &book, buy(&yes, None, dec!(30))).unwrap();

        assert_eq!(plan.fills.len(), 2);
        assert_eq!(plan.fills[0].source, FillSource::Book);
        assert_eq!(plan.fills[0].price, dec!(0.45));
        assert_eq!(plan.fills[0].amount, dec!(10));
        assert_eq!(plan.fills[1].source, FillSource::Curve);
        assert_eq!(plan.filled, dec!(30));
        assert!(plan.book.is_empty());
    }

    #[test]
    fn curve_fills_up_to_a_dearer_resting_order_then_takes_it() {
        let market = market(100.0);
        let yes = OutcomeId::new("yes");
        let mut book = OrderBook::new(MarketId::new("m"));
        book.insert(resting("ask", Side::Sell, dec!(0.6), dec!(50), 5, 1)).unwrap();

        let plan = plan(&market, &book, buy(&yes, None, dec!(200))).unwrap();

        assert_eq!(plan.filled, dec!(200));
        assert_eq!(plan.fills[0].source, FillSource::Curve);
        let book_fill = plan
            .fills
            .iter()
            .find(|fill| fill.source == FillSource::Book)
            .unwrap();
        assert_eq!(book_fill.price, dec!(0.6));
        assert_eq!(book_fill.amount, dec!(50));
        assert!(plan.price_after > 0.6);
    }

    #[test]
    fn fills_never_cross_the_limit() {
        let market = market(100.0);
        let yes = OutcomeId::new("yes");
        let plan = plan(
            &market,
            &OrderBook::new(MarketId::new("m")),
            buy(&yes, Some(dec!(0.55)), dec!(1000)),
        )
        .unwrap();

        assert!(plan.filled > Decimal::ZERO);
        assert!(plan.filled < dec!(1000));
        assert!(plan.fills.iter().all(|fill| fill.price <= dec!(0.55)));
        assert!(plan.price_after <= 0.55 + 1e-6);
        assert_eq!(plan.remainder(dec!(1000)), dec!(1000) - plan.filled);
    }

    #[test]
    fn limit_below_curve_and_book_fills_nothing() {
        let market = market(10_000.0);
        let yes = OutcomeId::new("yes");
        let mut book = OrderBook::new(MarketId::new("m"));
        book.insert(resting("ask", Side::Sell, dec!(0.6), dec!(50), 5, 1)).unwrap();

        let plan = plan(&market, &book, buy(&yes, Some(dec!(0.4)), dec!(10))).unwrap();

        assert!(plan.fills.is_empty());
        assert_eq!(plan.filled, Decimal::ZERO);
        assert_eq!(plan.book.len(), 1);
    }

    #[test]
    fn earlier_order_at_same_price_fills_first() {
        let market = market(10_000.0);
        let yes = OutcomeId::new("yes");
        let mut book = OrderBook::new(MarketId::new("m"));
        book.insert(resting("late", Side::Sell, dec!(0.4), dec!(10), 1, 2)).unwrap();
        book.insert(resting("early", Side::Sell, dec!(0.4), dec!(10), 60, 1)).unwrap();

        let plan = plan(&market, &book, buy(&yes, Some(dec!(0.45)), dec!(5))).unwrap();

        assert_eq!(plan.fills.len(), 1);
        let maker = plan.fills[0].maker.as_ref().unwrap();
        assert_eq!(maker.id(), &OrderId::new("early"));
        assert_eq!(maker.filled(), dec!(5));
        assert_eq!(plan.book.get(&OrderId::new("late")).unwrap().filled(), Decimal::ZERO);
    }

    #[test]
    fn sell_walks_resting_bids_then_curve() {
        let market = market(10_000.0);
        let yes = OutcomeId::new("yes");
        let mut book = OrderBook::new(MarketId::new("m"));
        book.insert(resting("bid", Side::Buy, dec!(0.55), dec!(20), 5, 1)).unwrap();

        let taker = Taker {
            outcome_id: &yes,
            outcome: 0,
            side: Side::Sell,
            limit: Some(dec!(0.45)),
            amount: dec!(50),
        };
        let plan = plan(&market, &book, taker).unwrap();

        assert_eq!(plan.fills[0].source, FillSource::Book);
        assert_eq!(plan.fills[0].price, dec!(0.55));
        assert_eq!(plan.fills[1].source, FillSource::Curve);
        assert!(plan.fills[1].price >= dec!(0.45));
        assert_eq!(plan.filled, dec!(50));
        assert!(plan.price_after < 0.5);
    }
}
