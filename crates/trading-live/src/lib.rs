//! Live bar polling and the paper trading session loop.
//!
//! [`LiveBarPoller`] turns a request/response market data API into a stream
//! of strictly newer bars. [`LiveSession`] feeds those bars to a strategy and
//! executes its actions against a [`PaperBroker`](trading_broker::PaperBroker).

mod poller;
mod report;
mod session;
mod stats;

#[cfg(test)]
mod testing;

pub use poller::{LiveBarPoller, NoDataReason, PollOutcome, PollPhase, PollState, LATEST_LIMIT};
pub use report::SessionReport;
pub use session::{LiveSession, SessionConfig, StepOutcome};
pub use stats::{SessionStats, TradeSummary};
