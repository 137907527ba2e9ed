mod config;
mod server;

use aggregator::Aggregator;
use clap::Parser;
use config::Config;
use connector_bitfinex::{poll_control, run_funding_poll, BitfinexRest};
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cfg = Config::parse();
    info!("config: {:?}", cfg);

    let source = Arc::new(BitfinexRest::new(cfg.bitfinex())?);
    info!("polling {} every {:?}", source.config().book_url(), cfg.interval());

    let agg = Aggregator::new(64);
    let (control, handle) = poll_control(!cfg.no_auto_refresh);
    let input = agg.create_input_channel(16);
    tokio::spawn(run_funding_poll(source, input, handle, cfg.interval()));

    let state = server::AppState {
        aggregator: agg,
        control: control.clone(),
        symbol: cfg.symbol.clone(),
        interval_secs: cfg.interval_secs,
    };
    let res = server::serve(cfg.bind, state).await;
    control.shutdown().await;
    res
}
