//! Side splitting, cumulative depth and headline stats for funding books.

use crate::types::{BookStats, BookView, DepthLevel, FundingBookSnapshot, FundingOffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

/// Split raw levels into (bids, asks). Positive amounts are funding offered
/// (asks), negative amounts funding demanded (bids). Amounts come out positive;
/// zero-amount levels are dropped.
pub fn split_sides(offers: &[FundingOffer]) -> (Vec<FundingOffer>, Vec<FundingOffer>) {
    let mut bids = Vec::new();
    let mut asks = Vec::new();
    for o in offers {
        if o.amount > 0.0 {
            asks.push(*o);
        } else if o.amount < 0.0 {
            bids.push(FundingOffer { amount: o.amount.abs(), ..*o });
        }
    }
    (bids, asks)
}

/// Sort a side best-first and attach the running sum of amounts.
///
/// Bids go by rate descending, asks by rate ascending. Equal rates keep
/// their upstream order.
pub fn depth_levels(offers: &[FundingOffer], side: Side) -> Vec<DepthLevel> {
    let mut sorted = offers.to_vec();
    match side {
        Side::Bid => sorted.sort_by(|a, b| b.rate.total_cmp(&a.rate)),
        Side::Ask => sorted.sort_by(|a, b| a.rate.total_cmp(&b.rate)),
    }
    let mut cumulative = 0.0;
    sorted
        .into_iter()
        .map(|o| {
            cumulative += o.amount;
            DepthLevel {
                rate: o.rate,
                rate_pct: o.rate_pct(),
                period: o.period,
                count: o.count,
                amount: o.amount,
                cumulative,
            }
        })
        .collect()
}

/// Stats in percent units. `spread_pct` is best ask minus best bid and
/// needs both sides.
pub fn book_stats(bids: &[DepthLevel], asks: &[DepthLevel]) -> BookStats {
    let best_bid_pct = bids.iter().map(|l| l.rate_pct).reduce(f64::max);
    let best_ask_pct = asks.iter().map(|l| l.rate_pct).reduce(f64::min);
    let spread_pct = match (best_bid_pct, best_ask_pct) {
        (Some(b), Some(a)) => Some(a - b),
        _ => None,
    };
    BookStats {
        best_bid_pct,
        best_ask_pct,
        spread_pct,
        bid_total: bids.iter().map(|l| l.amount).sum(),
        ask_total: asks.iter().map(|l| l.amount).sum(),
    }
}

impl BookView {
    pub fn from_snapshot(snapshot: &FundingBookSnapshot) -> Self {
        let bids = depth_levels(&snapshot.bids, Side::Bid);
        let asks = depth_levels(&snapshot.asks, Side::Ask);
        let stats = book_stats(&bids, &asks);
        BookView {
            symbol: snapshot.symbol.clone(),
            updated_at: snapshot.ts,
            bids,
            asks,
            stats,
        }
    }
}
