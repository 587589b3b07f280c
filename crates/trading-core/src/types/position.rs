//! Holdings and cash for the paper account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{PositionState, Side};

/// Units held in one symbol. Never negative: there is no shorting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_entry_price: Decimal,
    /// Last mark
    pub current_price: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// A position marked at its entry price.
    pub fn new(symbol: impl Into<String>, quantity: Decimal, avg_entry_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            avg_entry_price,
            current_price: avg_entry_price,
            market_value: quantity * avg_entry_price,
            unrealized_pnl: Decimal::ZERO,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Re-mark the position at `price`.
    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.market_value = self.quantity * price;
        self.unrealized_pnl = self.quantity * (price - self.avg_entry_price);
    }

    /// Book an execution and return the P&L it realises.
    ///
    /// Buys average into the entry price. Sells are capped at the held
    /// quantity and realise against the entry price.
    pub fn apply_fill(&mut self, side: Side, quantity: Decimal, price: Decimal) -> Decimal {
        let realized = match side {
            Side::Buy => {
                let cost = self.quantity * self.avg_entry_price + quantity * price;
                self.quantity += quantity;
                if !self.quantity.is_zero() {
                    self.avg_entry_price = cost / self.quantity;
                }
                Decimal::ZERO
            }
            Side::Sell => {
                let sold = quantity.min(self.quantity);
                self.quantity -= sold;
                sold * (price - self.avg_entry_price)
            }
        };

        self.update_price(price);
        realized
    }
}

/// Cash plus positions, marked to the last close seen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: Decimal,
    /// `cash` plus the market value of every position
    pub equity: Decimal,
    pub positions: HashMap<String, Position>,
    /// Net of commission
    pub total_realized_pnl: Decimal,
    pub initial_capital: Decimal,
}

impl Portfolio {
    /// An all-cash account.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            cash: initial_capital,
            equity: initial_capital,
            positions: HashMap::new(),
            total_realized_pnl: Decimal::ZERO,
            initial_capital,
        }
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// What the strategy is told about `symbol`.
    pub fn position_state(&self, symbol: &str) -> PositionState {
        match self.positions.get(symbol) {
            Some(p) if !p.is_flat() => PositionState::Long,
            _ => PositionState::Flat,
        }
    }

    pub fn update_equity(&mut self) {
        let held: Decimal = self.positions.values().map(|p| p.market_value).sum();
        self.equity = self.cash + held;
    }

    /// Re-mark every position with a price in `prices`, then recompute equity.
    pub fn update_prices(&mut self, prices: &HashMap<String, Decimal>) {
        for (symbol, position) in self.positions.iter_mut() {
            if let Some(&price) = prices.get(symbol) {
                position.update_price(price);
            }
        }
        self.update_equity();
    }
}
