use serde::{Deserialize, Serialize};

/// One level of a funding book as the exchange reports it.
///
/// `rate` is a daily fraction (0.0002 == 0.02% per day), `period` the offer
/// duration in days and `count` the number of offers aggregated at this level.
/// `amount` keeps the upstream sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundingOffer {
    pub rate: f64,
    pub period: u32,
    pub count: u32,
    pub amount: f64,
}

impl FundingOffer {
    pub fn rate_pct(&self) -> f64 {
        self.rate * 100.0
    }
}

/// A point-in-time funding book. Both sides hold positive amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingBookSnapshot {
    pub symbol: String,
    pub bids: Vec<FundingOffer>,
    pub asks: Vec<FundingOffer>,
    pub ts: i64,
}

impl FundingBookSnapshot {
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// A raw row of one side with the running total of amounts up to and
/// including this level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub rate: f64,
    pub rate_pct: f64,
    pub period: u32,
    pub count: u32,
    pub amount: f64,
    pub cumulative: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BookStats {
    pub best_bid_pct: Option<f64>,
    pub best_ask_pct: Option<f64>,
    pub spread_pct: Option<f64>,
    pub bid_total: f64,
    pub ask_total: f64,
}

/// What the dashboard renders for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookView {
    pub symbol: String,
    pub updated_at: i64,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    pub stats: BookStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DisplayState {
    Loading,
    Ready(BookView),
    Empty { symbol: String, updated_at: i64 },
    Error { message: String, at: i64 },
}

impl DisplayState {
    pub fn error(message: impl Into<String>) -> Self {
        DisplayState::Error {
            message: message.into(),
            at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DisplayState::Error { .. })
    }
}
