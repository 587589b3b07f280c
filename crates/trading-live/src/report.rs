//! End-of-session report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use trading_core::traits::StrategyState;
use trading_core::types::{DataSourceKind, Portfolio};

use crate::SessionStats;

const RULE: &str = "═══════════════════════════════════════════════════════════\n";
const SECTION: &str = "───────────────────────────────────────────────────────────\n";

/// Complete report for one paper trading session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub symbol: String,
    pub source: DataSourceKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: SessionStats,
    pub strategy: StrategyState,
    pub final_portfolio: Portfolio,
}

impl SessionReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let stats = &self.stats;
        let trades = &stats.trades;
        let mut s = String::new();

        s.push_str(RULE);
        s.push_str("                  PAPER TRADING SESSION                    \n");
        s.push_str(RULE);
        let _ = writeln!(s, "  {} via {} ({})", self.symbol, self.source, self.strategy.name);
        let _ = writeln!(
            s,
            "  {} -> {}\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        s.push_str("PERFORMANCE\n");
        s.push_str(SECTION);
        let _ = writeln!(s, "  Starting Value:      ${:.2}", stats.initial_capital);
        let _ = writeln!(s, "  Final Value:         ${:.2}", stats.final_equity);
        let _ = writeln!(s, "  Total Return:        {:.2}%", stats.total_return_pct);
        let _ = writeln!(s, "  Max Drawdown:        {:.2}%", stats.max_drawdown_pct);
        match stats.sharpe_ratio {
            Some(sharpe) => {
                let _ = writeln!(s, "  Sharpe Ratio:        {:.2}", sharpe);
            }
            None => s.push_str("  Sharpe Ratio:        n/a\n"),
        }
        s.push('\n');

        s.push_str("TRADE ANALYSIS\n");
        s.push_str(SECTION);
        let _ = writeln!(s, "  Closed Trades:       {}", trades.closed);
        let _ = writeln!(
            s,
            "  Open Position:       {}",
            if trades.open { "yes" } else { "no" }
        );
        let _ = writeln!(s, "  Won / Lost:          {} / {}", trades.won, trades.lost);
        let _ = writeln!(s, "  Net PnL:             ${:.2}", trades.net_pnl);
        let _ = writeln!(s, "  Win Rate:            {:.2}%", trades.win_rate_pct);
        let _ = writeln!(s, "  Avg Win:             ${:.2}", trades.avg_win);
        let _ = writeln!(s, "  Avg Loss:            ${:.2}", trades.avg_loss);
        match trades.profit_factor {
            Some(pf) => {
                let _ = writeln!(s, "  Profit Factor:       {:.2}", pf);
            }
            None => s.push_str("  Profit Factor:       n/a\n"),
        }
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str(SECTION);
        let _ = writeln!(s, "  Bars Processed:      {}", stats.bars_processed);
        let _ = writeln!(s, "  Orders Filled:       {}", stats.orders_filled);
        let _ = writeln!(s, "  Orders Rejected:     {}", stats.orders_rejected);
        let _ = writeln!(s, "  Actions Emitted:     {}", self.strategy.actions_emitted);
        s.push('\n');

        s.push_str(RULE);
        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
