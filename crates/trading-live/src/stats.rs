//! Session statistics.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_broker::ClosedTrade;
use trading_core::types::Portfolio;

/// Closed-trade summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    /// Round trips completed
    pub closed: usize,
    /// Position still open at the end of the session
    pub open: bool,
    pub won: usize,
    pub lost: usize,
    /// Sum of net P&L over closed trades
    pub net_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub win_rate_pct: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    /// Gross profit over gross loss; `None` without losing trades
    pub profit_factor: Option<Decimal>,
    pub longest_win_streak: usize,
    pub longest_loss_streak: usize,
}

impl TradeSummary {
    pub fn from_trades(trades: &[ClosedTrade], open: bool) -> Self {
        let mut summary = Self {
            closed: trades.len(),
            open,
            ..Self::default()
        };

        let (mut win_streak, mut loss_streak) = (0, 0);
        for trade in trades {
            let pnl = trade.net_pnl();
            summary.net_pnl += pnl;

            if trade.is_winner() {
                summary.won += 1;
                summary.gross_profit += pnl;
                win_streak += 1;
                loss_streak = 0;
            } else {
                // Breakeven counts as a loss.
                summary.lost += 1;
                summary.gross_loss += pnl.abs();
                loss_streak += 1;
                win_streak = 0;
            }
            summary.longest_win_streak = summary.longest_win_streak.max(win_streak);
            summary.longest_loss_streak = summary.longest_loss_streak.max(loss_streak);
        }

        if summary.closed > 0 {
            summary.win_rate_pct =
                Decimal::from(summary.won * 100) / Decimal::from(summary.closed);
        }
        if summary.won > 0 {
            summary.avg_win = summary.gross_profit / Decimal::from(summary.won);
        }
        if summary.lost > 0 {
            summary.avg_loss = summary.gross_loss / Decimal::from(summary.lost);
        }
        if summary.gross_loss > Decimal::ZERO {
            summary.profit_factor = Some(summary.gross_profit / summary.gross_loss);
        }

        summary
    }
}

/// Per-bar equity tracking and end-of-session metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub initial_capital: Decimal,
    pub final_equity: Decimal,
    pub total_return_pct: Decimal,
    pub max_drawdown_pct: Decimal,
    /// Annualised Sharpe ratio of per-bar returns (risk-free rate 0);
    /// `None` with fewer than two returns or zero variance
    pub sharpe_ratio: Option<f64>,
    pub bars_processed: usize,
    pub orders_filled: usize,
    pub orders_rejected: usize,
    pub trades: TradeSummary,
    pub equity_curve: Vec<(DateTime<Utc>, Decimal)>,
    peak_equity: Decimal,
    returns: Vec<f64>,
}

impl SessionStats {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            final_equity: initial_capital,
            total_return_pct: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            sharpe_ratio: None,
            bars_processed: 0,
            orders_filled: 0,
            orders_rejected: 0,
            trades: TradeSummary::default(),
            equity_curve: Vec::new(),
            peak_equity: initial_capital,
            returns: Vec::new(),
        }
    }

    /// Record the marked-to-market equity after a bar.
    pub fn record_equity(&mut self, timestamp: DateTime<Utc>, equity: Decimal) {
        let previous = self
            .equity_curve
            .last()
            .map(|&(_, e)| e)
            .unwrap_or(self.initial_capital);
        if previous > Decimal::ZERO {
            if let Some(ret) = ((equity - previous) / previous).to_f64() {
                self.returns.push(ret);
            }
        }

        self.equity_curve.push((timestamp, equity));
        self.final_equity = equity;

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }

        self.bars_processed += 1;
    }

    pub fn record_fill(&mut self) {
        self.orders_filled += 1;
    }

    pub fn record_rejection(&mut self) {
        self.orders_rejected += 1;
    }

    /// Per-bar returns recorded so far.
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// Compute the end-of-session figures.
    pub fn finalize(
        &mut self,
        portfolio: &Portfolio,
        trades: &[ClosedTrade],
        symbol: &str,
        periods_per_year: f64,
    ) {
        self.final_equity = portfolio.equity;
        if self.initial_capital > Decimal::ZERO {
            self.total_return_pct =
                (self.final_equity - self.initial_capital) / self.initial_capital * dec!(100);
        }

        let open = !portfolio.position_state(symbol).is_flat();
        self.trades = TradeSummary::from_trades(trades, open);
        self.sharpe_ratio = sharpe_ratio(&self.returns, periods_per_year);
    }
}

/// Annualised Sharpe ratio with a zero risk-free rate (sample std).
pub(crate) fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    // Flat equity leaves only rounding noise in the variance.
    if std_dev > 1e-12 && std_dev.is_finite() {
        Some(mean / std_dev * periods_per_year.sqrt())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use trading_core::types::Position;

    fn ts(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn trade(gross: Decimal) -> ClosedTrade {
        ClosedTrade {
            symbol: "NVDA".into(),
            quantity: dec!(1),
            entry_price: dec!(100),
            exit_price: dec!(100) + gross,
            opened_at: ts(0),
            closed_at: ts(5),
            gross_pnl: gross,
            commission: Decimal::ZERO,
        }
    }

    #[test]
    fn test_drawdown_tracks_peak() {
        let mut stats = SessionStats::new(dec!(1000));
        stats.record_equity(ts(0), dec!(1100));
        stats.record_equity(ts(1), dec!(990));
        stats.record_equity(ts(2), dec!(1050));

        assert_eq!(stats.max_drawdown_pct, dec!(10));
        assert_eq!(stats.bars_processed, 3);
        assert_eq!(stats.final_equity, dec!(1050));
        assert!((stats.returns()[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_sharpe_needs_variance() {
        assert_eq!(sharpe_ratio(&[0.01], 252.0), None);
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01], 252.0), None);

        let sharpe = sharpe_ratio(&[0.01, -0.01, 0.02], 1.0).unwrap();
        // mean 0.00667, sample std 0.01528
        assert!((sharpe - 0.436436).abs() < 1e-5);
    }

    #[test]
    fn test_trade_summary() {
        let trades = [trade(dec!(5)), trade(dec!(3)), trade(dec!(-2)), trade(dec!(0))];
        let summary = TradeSummary::from_trades(&trades, false);

        assert_eq!(summary.closed, 4);
        assert_eq!(summary.won, 2);
        assert_eq!(summary.lost, 2);
        assert_eq!(summary.net_pnl, dec!(6));
        assert_eq!(summary.win_rate_pct, dec!(50));
        assert_eq!(summary.avg_win, dec!(4));
        assert_eq!(summary.avg_loss, dec!(1));
        assert_eq!(summary.profit_factor, Some(dec!(4)));
        assert_eq!(summary.longest_win_streak, 2);
        assert_eq!(summary.longest_loss_streak, 2);
    }

    #[test]
    fn test_empty_summary() {
        let summary = TradeSummary::from_trades(&[], true);
        assert_eq!(summary.closed, 0);
        assert!(summary.open);
        assert_eq!(summary.profit_factor, None);
    }

    #[test]
    fn test_finalize() {
        let mut stats = SessionStats::new(dec!(1000));
        stats.record_equity(ts(0), dec!(1000));
        stats.record_equity(ts(1), dec!(1010));
        stats.record_equity(ts(2), dec!(1005));

        let mut portfolio = Portfolio::new(dec!(1000));
        portfolio.cash = dec!(905);
        portfolio
            .positions
            .insert("NVDA".into(), Position::new("NVDA", dec!(1), dec!(100)));
        portfolio.update_equity();

        stats.finalize(&portfolio, &[trade(dec!(5))], "NVDA", 252.0);
        assert_eq!(stats.final_equity, dec!(1005));
        assert_eq!(stats.total_return_pct, dec!(0.5));
        assert!(stats.trades.open);
        assert_eq!(stats.trades.won, 1);
        assert!(stats.sharpe_ratio.is_some());
    }
}
