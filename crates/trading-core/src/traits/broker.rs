//! Order execution seam.

use crate::error::BrokerError;
use crate::types::{Order, OrderRequest, Portfolio, Position};
use async_trait::async_trait;

/// Where the session sends its orders.
///
/// Long-only: the strategy can only open a position or close all of it, so
/// this is the whole surface the session needs.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Cash, equity and open positions.
    async fn get_account(&self) -> Result<Portfolio, BrokerError>;

    /// Accept a market order. Fills are reported on the returned order or
    /// by the implementation's own execution step.
    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError>;

    /// The open position in `symbol`, if any.
    async fn get_position(&self, symbol: &str) -> Result<Option<Position>, BrokerError>;

    /// Submit a sell for the entire held quantity of `symbol`.
    ///
    /// Fails with [`BrokerError::PositionNotFound`] when flat.
    async fn close_position(&self, symbol: &str) -> Result<Order, BrokerError>;

    fn name(&self) -> &str;
}
