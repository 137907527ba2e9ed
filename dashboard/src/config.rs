use clap::Parser;
use connector_bitfinex::BitfinexConfig;
use std::net::SocketAddr;
use std::time::Duration;

/// Live view of a Bitfinex funding order book.
#[derive(Parser, Debug, Clone)]
#[command(name = "funding-dashboard", version, about = "Bitfinex funding order book dashboard", long_about = None)]
pub struct Config {
    /// Address the dashboard listens on
    #[arg(long, env = "DASHBOARD_BIND", default_value = "127.0.0.1:8501")]
    pub bind: SocketAddr,

    /// Funding symbol to watch
    #[arg(long, env = "BITFINEX_SYMBOL", default_value = "fUSD", value_parser = parse_symbol)]
    pub symbol: String,

    /// Book precision
    #[arg(long, env = "BITFINEX_PRECISION", default_value = "P0", value_parser = ["P0", "P1", "P2", "P3", "P4"])]
    pub precision: String,

    /// Levels per side requested from the exchange
    #[arg(long, env = "BITFINEX_BOOK_LEN", default_value_t = 25, value_parser = clap::value_parser!(u32).range(1..=250))]
    pub len: u32,

    #[arg(long, env = "BITFINEX_BASE_URL", default_value = connector_bitfinex::rest::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Seconds between refreshes while auto-refresh is on
    #[arg(long, env = "DASHBOARD_INTERVAL_SECS", default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,

    /// HTTP timeout for one book request
    #[arg(long, env = "BITFINEX_TIMEOUT_SECS", default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Start with auto-refresh switched off
    #[arg(long, default_value_t = false)]
    pub no_auto_refresh: bool,
}

/// Symbols end up in the request path and the page title, so only
/// `[A-Za-z0-9:]` is allowed.
fn parse_symbol(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("symbol must not be empty".to_string());
    }
    match s.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == ':')) {
        Some(c) => Err(format!("invalid character {:?} in symbol", c)),
        None => Ok(s.to_string()),
    }
}

impl Config {
    pub fn bitfinex(&self) -> BitfinexConfig {
        BitfinexConfig {
            base_url: self.base_url.clone(),
            symbol: self.symbol.clone(),
            precision: self.precision.clone(),
            len: self.len,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::try_parse_from(["funding-dashboard"]).unwrap();
        assert_eq!(cfg.bind.port(), 8501);
        assert_eq!(cfg.interval(), Duration::from_secs(5));
        assert!(!cfg.no_auto_refresh);
        assert_eq!(cfg.bitfinex().book_url(), "https://api-pub.bitfinex.com/v2/book/fUSD/P0?len=25");
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::try_parse_from([
            "funding-dashboard",
            "--symbol",
            "fBTC",
            "--precision",
            "P2",
            "--len",
            "100",
            "--interval-secs",
            "10",
            "--no-auto-refresh",
        ])
        .unwrap();
        assert_eq!(cfg.bitfinex().book_url(), "https://api-pub.bitfinex.com/v2/book/fBTC/P2?len=100");
        assert_eq!(cfg.interval(), Duration::from_secs(10));
        assert!(cfg.no_auto_refresh);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::try_parse_from(["funding-dashboard", "--precision", "R0"]).is_err());
        assert!(Config::try_parse_from(["funding-dashboard", "--interval-secs", "0"]).is_err());
        assert!(Config::try_parse_from(["funding-dashboard", "--timeout-secs", "0"]).is_err());
    }

    #[test]
    fn test_symbol_charset() {
        let cfg = Config::try_parse_from(["funding-dashboard", "--symbol", "fTESTUSD:TEST"]).unwrap();
        assert_eq!(cfg.symbol, "fTESTUSD:TEST");
        assert!(Config::try_parse_from(["funding-dashboard", "--symbol", "fUSD<script>"]).is_err());
        assert!(Config::try_parse_from(["funding-dashboard", "--symbol", "fUSD/P0"]).is_err());
        assert!(Config::try_parse_from(["funding-dashboard", "--symbol", ""]).is_err());
    }
}
