//! Market orders as the paper broker sees them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        })
    }
}

/// Lifecycle of an order. Everything except `Pending` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Filled,
    Canceled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        *self != OrderStatus::Pending
    }
}

/// What the session asks the broker for: `quantity` units of `symbol` at
/// market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
        }
    }
}

/// One execution against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: Uuid,
    pub quantity: Decimal,
    /// Execution price, slippage included
    pub price: Decimal,
    pub commission: Decimal,
    /// Bar time the execution is booked at
    pub timestamp: DateTime<Utc>,
}

/// An order and how much of it has executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub symbol: String,
    pub side: Side,
    /// Requested units
    pub quantity: Decimal,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    /// Volume-weighted price over all fills
    pub filled_avg_price: Option<Decimal>,
    /// Summed over all fills
    pub commission: Decimal,
    /// Wall-clock submission time
    pub created_at: DateTime<Utc>,
    /// Timestamp of the fill that completed the order
    pub filled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// A pending order for `request` with a fresh id.
    pub fn from_request(request: &OrderRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: request.symbol.clone(),
            side: request.side,
            quantity: request.quantity,
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            filled_avg_price: None,
            commission: Decimal::ZERO,
            created_at: Utc::now(),
            filled_at: None,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Notional of the executed units, before commission.
    pub fn value(&self) -> Option<Decimal> {
        Some(self.filled_avg_price? * self.filled_quantity)
    }

    /// Book an execution. The order becomes `Filled` once the executed units
    /// cover the requested quantity.
    pub fn add_fill(&mut self, fill: Fill) {
        let previous_notional = self.value().unwrap_or(Decimal::ZERO);
        let executed = self.filled_quantity + fill.quantity;

        if executed > Decimal::ZERO {
            self.filled_avg_price = Some((previous_notional + fill.price * fill.quantity) / executed);
        }
        self.filled_quantity = executed;
        self.commission += fill.commission;

        if executed >= self.quantity {
            self.status = OrderStatus::Filled;
            self.filled_at = Some(fill.timestamp);
        }
    }
}
