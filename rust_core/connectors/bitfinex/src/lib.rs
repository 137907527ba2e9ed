//! Bitfinex public funding book connector: REST snapshot fetch and a
//! toggleable poll loop.

pub mod poll;
pub mod rest;

pub use poll::{poll_control, run_funding_poll, PollControl, PollHandle};
pub use rest::{BitfinexConfig, BitfinexRest, FundingBookSource};
