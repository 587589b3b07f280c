//! Paper trading broker for live simulation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use trading_core::error::BrokerError;
use trading_core::traits::Broker;
use trading_core::types::{Fill, Order, OrderRequest, OrderStatus, Portfolio, Position, Side};
use uuid::Uuid;

use crate::trade::ClosedTrade;

/// Entry side of a trade still open.
#[derive(Debug, Clone)]
struct OpenTrade {
    opened_at: DateTime<Utc>,
    commission: Decimal,
}

#[derive(Debug, Default)]
struct Ledger {
    orders: HashMap<Uuid, Order>,
    open_trades: HashMap<String, OpenTrade>,
    closed_trades: Vec<ClosedTrade>,
}

/// Paper trading broker for simulation.
///
/// Long-only: sells can only reduce an existing position.
pub struct PaperBroker {
    portfolio: Mutex<Portfolio>,
    ledger: Mutex<Ledger>,
    slippage_pct: Decimal,
    commission_per_unit: Decimal,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, BrokerError> {
    mutex
        .lock()
        .map_err(|_| BrokerError::Internal("paper broker state poisoned".into()))
}

impl PaperBroker {
    /// Create a new paper broker with initial capital.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            portfolio: Mutex::new(Portfolio::new(initial_capital)),
            ledger: Mutex::new(Ledger::default()),
            slippage_pct: Decimal::ZERO,
            commission_per_unit: Decimal::ZERO,
        }
    }

    /// Set slippage percentage (0.05 = 0.05%).
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    /// Set commission per unit traded.
    pub fn with_commission(mut self, commission: Decimal) -> Self {
        self.commission_per_unit = commission;
        self
    }

    /// Fill a pending order at `market_price` (plus slippage) as of `at`.
    ///
    /// Terminal orders are returned unchanged. A buy the cash cannot cover
    /// is rejected and leaves the portfolio untouched.
    pub fn execute_at_price(
        &self,
        order_id: Uuid,
        market_price: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Order, BrokerError> {
        let mut ledger = lock(&self.ledger)?;
        let ledger = &mut *ledger;
        let order = ledger
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| BrokerError::OrderNotFound(order_id.to_string()))?;

        if order.status.is_terminal() {
            return Ok(order.clone());
        }

        let fill_price = match order.side {
            Side::Buy => market_price * (dec!(1) + self.slippage_pct / dec!(100)),
            Side::Sell => market_price * (dec!(1) - self.slippage_pct / dec!(100)),
        };
        let commission = self.commission_per_unit * order.quantity;
        let fill_value = fill_price * order.quantity;

        let mut portfolio = lock(&self.portfolio)?;

        match order.side {
            Side::Buy => {
                let cost = fill_value + commission;
                if cost > portfolio.cash {
                    order.status = OrderStatus::Rejected;
                    return Err(BrokerError::InsufficientFunds {
                        required: cost,
                        available: portfolio.cash,
                    });
                }
                portfolio.cash -= cost;
            }
            Side::Sell => {
                let held = portfolio
                    .get_position(&order.symbol)
                    .map(|p| p.quantity)
                    .unwrap_or(Decimal::ZERO);
                if held < order.quantity {
                    order.status = OrderStatus::Rejected;
                    return Err(BrokerError::OrderRejected(format!(
                        "cannot sell {} {}, holding {}",
                        order.quantity, order.symbol, held
                    )));
                }
                portfolio.cash += fill_value - commission;
            }
        }

        order.add_fill(Fill {
            order_id,
            quantity: order.quantity,
            price: fill_price,
            commission,
            timestamp: at,
        });

        let position = portfolio
            .positions
            .entry(order.symbol.clone())
            .or_insert_with(|| Position::new(order.symbol.as_str(), Decimal::ZERO, Decimal::ZERO));
        let entry_price = position.avg_entry_price;
        let realized = position.apply_fill(order.side, order.quantity, fill_price);
        let now_flat = position.is_flat();

        match order.side {
            Side::Buy => {
                portfolio.total_realized_pnl -= commission;
                ledger
                    .open_trades
                    .entry(order.symbol.clone())
                    .and_modify(|t| t.commission += commission)
                    .or_insert(OpenTrade {
                        opened_at: at,
                        commission,
                    });
            }
            Side::Sell => {
                portfolio.total_realized_pnl += realized - commission;
                if now_flat {
                    let open = ledger.open_trades.remove(&order.symbol);
                    let trade = ClosedTrade {
                        symbol: order.symbol.clone(),
                        quantity: order.quantity,
                        entry_price,
                        exit_price: fill_price,
                        opened_at: open.as_ref().map(|t| t.opened_at).unwrap_or(at),
                        closed_at: at,
                        gross_pnl: realized,
                        commission: commission + open.map(|t| t.commission).unwrap_or_default(),
                    };
                    info!(
                        symbol = %trade.symbol,
                        entry = %trade.entry_price,
                        exit = %trade.exit_price,
                        pnl = %trade.net_pnl(),
                        "Trade closed"
                    );
                    ledger.closed_trades.push(trade);
                }
            }
        }

        if now_flat {
            portfolio.positions.remove(&order.symbol);
        }
        portfolio.update_equity();

        debug!(
            order_id = %order.id,
            side = %order.side,
            quantity = %order.quantity,
            price = %fill_price,
            cash = %portfolio.cash,
            "Order filled"
        );
        Ok(order.clone())
    }

    /// Mark open positions to the latest prices.
    pub fn update_prices(&self, prices: &HashMap<String, Decimal>) -> Result<(), BrokerError> {
        lock(&self.portfolio)?.update_prices(prices);
        Ok(())
    }

    /// Get a snapshot of the portfolio.
    pub fn portfolio_snapshot(&self) -> Result<Portfolio, BrokerError> {
        Ok(lock(&self.portfolio)?.clone())
    }

    /// Trades opened and closed so far, oldest first.
    pub fn closed_trades(&self) -> Result<Vec<ClosedTrade>, BrokerError> {
        Ok(lock(&self.ledger)?.closed_trades.clone())
    }
}

#[async_trait]
impl Broker for PaperBroker {
    async fn get_account(&self) -> Result<Portfolio, BrokerError> {
        self.portfolio_snapshot()
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError> {
        // Buying power is checked at fill time, when the price is known.
        if request.quantity <= Decimal::ZERO {
            return Err(BrokerError::OrderRejected(format!(
                "quantity must be positive, got {}",
                request.quantity
            )));
        }

        let order = Order::from_request(&request);
        lock(&self.ledger)?.orders.insert(order.id, order.clone());
        debug!(order_id = %order.id, side = %order.side, symbol = %order.symbol, "Order accepted");
        Ok(order)
    }

    async fn get_position(&self, symbol: &str) -> Result<Option<Position>, BrokerError> {
        Ok(lock(&self.portfolio)?.get_position(symbol).cloned())
    }

    async fn close_position(&self, symbol: &str) -> Result<Order, BrokerError> {
        let quantity = {
            let portfolio = lock(&self.portfolio)?;
            portfolio
                .get_position(symbol)
                .filter(|p| !p.is_flat())
                .map(|p| p.quantity)
                .ok_or_else(|| BrokerError::PositionNotFound(symbol.to_string()))?
        }; // guard dropped before await

        self.submit_order(OrderRequest::market(symbol, Side::Sell, quantity))
            .await
    }

    fn name(&self) -> &str {
        "paper"
    }
}
