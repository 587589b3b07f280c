//! Round-trip trade records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A long position that was opened and later closed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    /// Price difference times quantity
    pub gross_pnl: Decimal,
    /// Entry and exit commission
    pub commission: Decimal,
}

impl ClosedTrade {
    /// P&L after commission.
    pub fn net_pnl(&self) -> Decimal {
        self.gross_pnl - self.commission
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl() > Decimal::ZERO
    }
}
