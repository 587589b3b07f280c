//! Simulated paper broker.
//!
//! Orders are accepted by [`PaperBroker::submit_order`](trading_core::traits::Broker::submit_order)
//! and filled when the caller supplies a price with
//! [`PaperBroker::execute_at_price`].

mod paper;
mod trade;

pub use paper::PaperBroker;
pub use trade::ClosedTrade;
