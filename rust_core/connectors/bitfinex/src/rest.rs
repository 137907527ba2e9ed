use async_trait::async_trait;
use connectors_common::depth::split_sides;
use connectors_common::types::{FundingBookSnapshot, FundingOffer};
use connectors_common::ConnectorError;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api-pub.bitfinex.com/v2";

#[derive(Debug, Clone)]
pub struct BitfinexConfig {
    pub base_url: String,
    pub symbol: String,
    /// Aggregation level, `P0` (finest) to `P4`.
    pub precision: String,
    pub len: u32,
    pub timeout: Duration,
}

impl Default for BitfinexConfig {
    fn default() -> Self {
        BitfinexConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            symbol: "fUSD".to_string(),
            precision: "P0".to_string(),
            len: 25,
            timeout: Duration::from_secs(5),
        }
    }
}

impl BitfinexConfig {
    pub fn book_url(&self) -> String {
        format!(
            "{}/book/{}/{}?len={}",
            self.base_url.trim_end_matches('/'),
            self.symbol,
            self.precision,
            self.len
        )
    }
}

/// Anything that can produce a fresh funding book.
#[async_trait]
pub trait FundingBookSource: Send + Sync {
    async fn fetch_funding_book(&self) -> Result<FundingBookSnapshot, ConnectorError>;
}

#[derive(Clone)]
pub struct BitfinexRest {
    client: Client,
    config: BitfinexConfig,
}

impl BitfinexRest {
    pub fn new(config: BitfinexConfig) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConnectorError::Other(format!("http client: {}", e)))?;
        Ok(BitfinexRest { client, config })
    }

    pub fn config(&self) -> &BitfinexConfig {
        &self.config
    }
}

#[async_trait]
impl FundingBookSource for BitfinexRest {
    async fn fetch_funding_book(&self) -> Result<FundingBookSnapshot, ConnectorError> {
        let url = self.config.book_url();
        debug!("GET {}", url);
        let resp = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ConnectorError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ConnectorError::Network(e.to_string()))?;
        if !status.is_success() {
            // Bitfinex reports bad symbols etc. with a 500 and an error envelope.
            if let Ok(v) = serde_json::from_str::<Value>(&body) {
                if let Some(err) = upstream_error(&v) {
                    return Err(err);
                }
            }
            return Err(ConnectorError::Http { status: status.as_u16(), body });
        }
        parse_funding_book(&self.config.symbol, &body)
    }
}

/// Parse a `/book/f<CCY>/P*` response: an array of `[RATE, PERIOD, COUNT, AMOUNT]`.
///
/// Malformed rows are skipped. A non-empty response with no usable row is an
/// error; an empty array is an empty book.
pub fn parse_funding_book(symbol: &str, body: &str) -> Result<FundingBookSnapshot, ConnectorError> {
    let v: Value = serde_json::from_str(body)?;
    if let Some(err) = upstream_error(&v) {
        return Err(err);
    }
    let rows = v
        .as_array()
        .ok_or_else(|| ConnectorError::Parse(format!("expected array, got {}", truncate(body, 120))))?;

    let mut offers = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        match parse_row(row) {
            Some(o) => offers.push(o),
            None => warn!("skipping malformed funding book row {}: {}", i, row),
        }
    }
    if offers.is_empty() && !rows.is_empty() {
        return Err(ConnectorError::Parse(format!(
            "no valid levels in response: {}",
            truncate(body, 200)
        )));
    }

    let (bids, asks) = split_sides(&offers);
    Ok(FundingBookSnapshot {
        symbol: symbol.to_string(),
        bids,
        asks,
        ts: chrono::Utc::now().timestamp_millis(),
    })
}

fn parse_row(row: &Value) -> Option<FundingOffer> {
    let a = row.as_array()?;
    if a.len() != 4 {
        return None;
    }
    let rate = a[0].as_f64()?;
    let period = a[1].as_f64()?;
    let count = a[2].as_f64()?;
    let amount = a[3].as_f64()?;
    if !rate.is_finite() || !amount.is_finite() || period < 0.0 || count < 0.0 {
        return None;
    }
    Some(FundingOffer { rate, period: period as u32, count: count as u32, amount })
}

/// `["error", CODE, "MESSAGE"]`
fn upstream_error(v: &Value) -> Option<ConnectorError> {
    let a = v.as_array()?;
    if a.first().and_then(|s| s.as_str()) != Some("error") {
        return None;
    }
    Some(ConnectorError::Upstream {
        code: a.get(1).and_then(|c| c.as_i64()).unwrap_or_default(),
        message: a.get(2).and_then(|m| m.as_str()).unwrap_or("unknown").to_string(),
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
