//! Paper trading session loop.
//!
//! One cycle: poll for a new bar, mark the portfolio to its close, ask the
//! strategy for an action, fill any resulting order at the close and record
//! the equity. Everything runs on the caller's task.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::future::Future;
use tracing::{info, warn};
use trading_broker::PaperBroker;
use trading_core::error::{BrokerError, ConfigError, DataError, TradingError};
use trading_core::traits::{Broker, MarketData, Strategy};
use trading_core::types::{
    Action, Bar, DataSourceKind, Order, OrderRequest, PositionState, Side, Symbol, Timeframe,
};

use crate::{LiveBarPoller, SessionReport, SessionStats};

/// Session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub symbol: Symbol,
    /// Where the model's training data came from (reporting only)
    pub source: DataSourceKind,
    /// Units bought on every Open
    pub stake: Decimal,
    /// Bar size used to annualise the Sharpe ratio
    pub timeframe: Timeframe,
}

impl SessionConfig {
    pub fn new(symbol: Symbol, source: DataSourceKind, stake: Decimal) -> Self {
        Self {
            symbol,
            source,
            stake,
            timeframe: Timeframe::Minute1,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stake <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "stake".into(),
                reason: format!("must be positive, got {}", self.stake),
            });
        }
        Ok(())
    }
}

/// What one session cycle did.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// No new bar this cycle
    Idle,
    /// A new bar was processed
    Processed {
        bar: Bar,
        action: Action,
        /// The filled order, if the action traded and the fill succeeded
        order: Option<Order>,
    },
}

/// Owns the poller, the strategy and the paper broker for one run.
pub struct LiveSession<S> {
    poller: LiveBarPoller<S>,
    strategy: Box<dyn Strategy>,
    broker: PaperBroker,
    config: SessionConfig,
    stats: SessionStats,
}

impl<S: MarketData> LiveSession<S> {
    pub fn new(
        poller: LiveBarPoller<S>,
        strategy: Box<dyn Strategy>,
        broker: PaperBroker,
        config: SessionConfig,
    ) -> Result<Self, TradingError> {
        config.validate()?;
        let initial_capital = broker.portfolio_snapshot()?.initial_capital;
        Ok(Self {
            poller,
            strategy,
            broker,
            config,
            stats: SessionStats::new(initial_capital),
        })
    }

    /// Run one poll cycle and act on the bar it yields, if any.
    pub async fn step(&mut self) -> Result<StepOutcome, TradingError> {
        match self.poller.poll().await {
            Some(bar) => self.on_bar(bar).await,
            None => Ok(StepOutcome::Idle),
        }
    }

    /// Process one bar that is known to be new.
    pub async fn on_bar(&mut self, bar: Bar) -> Result<StepOutcome, TradingError> {
        let price = Decimal::try_from(bar.close)
            .map_err(|e| DataError::ParseError(format!("close {}: {}", bar.close, e)))?;
        self.mark(price)?;

        let position = match self.broker.get_position(self.config.symbol.as_str()).await? {
            Some(p) if !p.is_flat() => PositionState::Long,
            _ => PositionState::Flat,
        };

        let action = self.strategy.on_bar(&bar, position);
        let order = self.execute(action, price, bar.timestamp).await?;

        let equity = self.broker.portfolio_snapshot()?.equity;
        self.stats.record_equity(bar.timestamp, equity);

        info!(
            symbol = %self.config.symbol,
            timestamp = %bar.timestamp,
            close = bar.close,
            position = ?position,
            action = %action,
            equity = %equity,
            "Bar processed"
        );

        Ok(StepOutcome::Processed { bar, action, order })
    }

    /// Poll until `shutdown` resolves or `max_bars` bars have been processed.
    ///
    /// Transient fetch failures never end the loop. Broker errors other than
    /// an order rejection do.
    pub async fn run<F>(
        &mut self,
        shutdown: F,
        max_bars: Option<usize>,
    ) -> Result<SessionReport, TradingError>
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        tokio::pin!(shutdown);

        info!(
            symbol = %self.config.symbol,
            strategy = self.strategy.name(),
            description = self.strategy.description(),
            interval_secs = self.poller.interval().as_secs(),
            max_bars = ?max_bars,
            "Session started"
        );

        loop {
            if max_bars.is_some_and(|max| self.stats.bars_processed >= max) {
                info!(bars = self.stats.bars_processed, "Bar budget exhausted");
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                outcome = self.step() => {
                    outcome?;
                }
            }
        }

        self.report(started_at)
    }

    /// Build the report for everything processed so far.
    pub fn report(&mut self, started_at: DateTime<Utc>) -> Result<SessionReport, TradingError> {
        let portfolio = self.broker.portfolio_snapshot()?;
        let trades = self.broker.closed_trades()?;
        self.stats.finalize(
            &portfolio,
            &trades,
            self.config.symbol.as_str(),
            self.config.timeframe.periods_per_year(),
        );

        let (cycles, failures) = self.poller.counters();
        info!(
            bars = self.stats.bars_processed,
            cycles,
            failures,
            final_equity = %self.stats.final_equity,
            closed_trades = self.stats.trades.closed,
            "Session finished"
        );

        Ok(SessionReport {
            symbol: self.config.symbol.to_string(),
            source: self.config.source,
            started_at,
            finished_at: Utc::now(),
            stats: self.stats.clone(),
            strategy: self.strategy.state(),
            final_portfolio: portfolio,
        })
    }

    pub fn broker(&self) -> &PaperBroker {
        &self.broker
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn poller(&self) -> &LiveBarPoller<S> {
        &self.poller
    }

    fn mark(&self, price: Decimal) -> Result<(), BrokerError> {
        let prices = HashMap::from([(self.config.symbol.to_string(), price)]);
        self.broker.update_prices(&prices)
    }

    async fn execute(
        &mut self,
        action: Action,
        price: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, TradingError> {
        let symbol = self.config.symbol.as_str();
        let order = match action {
            Action::Hold => return Ok(None),
            Action::Open => {
                self.broker
                    .submit_order(OrderRequest::market(symbol, Side::Buy, self.config.stake))
                    .await?
            }
            Action::Close => self.broker.close_position(symbol).await?,
        };

        match self.broker.execute_at_price(order.id, price, at) {
            Ok(filled) if filled.is_filled() => {
                self.stats.record_fill();
                info!(
                    symbol,
                    side = %filled.side,
                    quantity = %filled.filled_quantity,
                    price = ?filled.filled_avg_price,
                    value = ?filled.value(),
                    "Order filled"
                );
                Ok(Some(filled))
            }
            Ok(unfilled) => {
                self.stats.record_rejection();
                warn!(symbol, status = ?unfilled.status, "Order not filled");
                Ok(None)
            }
            Err(e @ (BrokerError::InsufficientFunds { .. } | BrokerError::OrderRejected(_))) => {
                self.stats.record_rejection();
                warn!(symbol, action = %action, error = %e, "Order rejected");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bar, Scripted};
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::time::Duration;
    use trading_core::traits::{Classifier, StrategyState};
    use trading_core::types::{FeatureVector, Label};
    use trading_strategies::{MlStrategy, MlStrategyConfig};

    /// Replays a fixed list of actions, then holds.
    struct Script(VecDeque<Action>);

    impl Strategy for Script {
        fn name(&self) -> &str {
            "script"
        }

        fn on_bar(&mut self, _bar: &Bar, _position: PositionState) -> Action {
            self.0.pop_front().unwrap_or(Action::Hold)
        }

        fn reset(&mut self) {}

        fn state(&self) -> StrategyState {
            StrategyState {
                name: "script".into(),
                ..StrategyState::default()
            }
        }

        fn warmup_period(&self) -> usize {
            0
        }
    }

    struct AlwaysUp;

    impl Classifier for AlwaysUp {
        fn predict(&self, _features: &FeatureVector) -> Label {
            Label::Up
        }

        fn name(&self) -> &str {
            "always_up"
        }
    }

    fn session(
        source: Scripted,
        strategy: Box<dyn Strategy>,
        capital: Decimal,
    ) -> LiveSession<Scripted> {
        let symbol = Symbol::new("NVDA").unwrap();
        let poller = LiveBarPoller::new(source, symbol.clone(), Duration::from_secs(15)).unwrap();
        LiveSession::new(
            poller,
            strategy,
            PaperBroker::new(capital),
            SessionConfig::new(symbol, DataSourceKind::Alpaca, dec!(1)),
        )
        .unwrap()
    }

    fn script(actions: &[Action]) -> Box<dyn Strategy> {
        Box::new(Script(actions.iter().copied().collect()))
    }

    #[tokio::test]
    async fn test_open_then_close_round_trip() {
        let source = Scripted::closes(&[100.0, 101.0, 103.0, 102.0]);
        let mut session = session(
            source,
            script(&[Action::Hold, Action::Open, Action::Hold, Action::Close]),
            dec!(1000),
        );

        for _ in 0..4 {
            assert!(matches!(
                session.step().await.unwrap(),
                StepOutcome::Processed { .. }
            ));
        }

        let trades = session.broker().closed_trades().unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_price, dec!(101));
        assert_eq!(trades[0].exit_price, dec!(102));

        let portfolio = session.broker().portfolio_snapshot().unwrap();
        assert_eq!(portfolio.cash, dec!(1001));
        assert_eq!(portfolio.position_state("NVDA"), PositionState::Flat);

        let equity: Vec<Decimal> = session.stats().equity_curve.iter().map(|&(_, e)| e).collect();
        assert_eq!(equity, vec![dec!(1000), dec!(1000), dec!(1002), dec!(1001)]);
        assert_eq!(session.stats().orders_filled, 2);
    }

    #[tokio::test]
    async fn test_rejected_buy_does_not_stop_session() {
        let source = Scripted::closes(&[500.0, 510.0]);
        let mut session = session(source, script(&[Action::Open, Action::Hold]), dec!(100));

        match session.step().await.unwrap() {
            StepOutcome::Processed { action, order, .. } => {
                assert_eq!(action, Action::Open);
                assert!(order.is_none());
            }
            StepOutcome::Idle => panic!("expected a bar"),
        }
        assert!(matches!(
            session.step().await.unwrap(),
            StepOutcome::Processed { .. }
        ));
        assert_eq!(session.stats().orders_rejected, 1);
        assert_eq!(
            session.broker().portfolio_snapshot().unwrap().cash,
            dec!(100)
        );
    }

    #[tokio::test]
    async fn test_model_strategy_opens_after_warmup() {
        let strategy =
            MlStrategy::new(MlStrategyConfig::default(), Box::new(AlwaysUp)).unwrap();
        let closes = [10.0, 11.0, 9.0, 12.0, 13.0, 14.0];
        let mut session = session(Scripted::closes(&closes), Box::new(strategy), dec!(1000));

        let mut actions = Vec::new();
        for _ in 0..closes.len() {
            if let StepOutcome::Processed { action, .. } = session.step().await.unwrap() {
                actions.push(action);
            }
        }

        assert_eq!(
            actions,
            vec![
                Action::Hold,
                Action::Hold,
                Action::Hold,
                Action::Hold,
                Action::Open,
                Action::Hold
            ]
        );
        let portfolio = session.broker().portfolio_snapshot().unwrap();
        assert_eq!(portfolio.position_state("NVDA"), PositionState::Long);
        assert_eq!(portfolio.equity, dec!(1001));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_at_bar_budget() {
        let source = Scripted::closes(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let mut session = session(
            source,
            script(&[Action::Open, Action::Hold, Action::Close]),
            dec!(1000),
        );

        let report = session
            .run(std::future::pending::<()>(), Some(3))
            .await
            .unwrap();

        assert_eq!(report.stats.bars_processed, 3);
        assert_eq!(report.stats.trades.closed, 1);
        assert_eq!(report.stats.trades.won, 1);
        assert_eq!(report.stats.trades.net_pnl, dec!(2));
        assert_eq!(report.stats.final_equity, dec!(1002));
        assert_eq!(session.poller().counters(), (3, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown_without_data() {
        let mut session = session(Scripted::new(Vec::new()), script(&[]), dec!(1000));

        let report = session
            .run(tokio::time::sleep(Duration::from_secs(60)), None)
            .await
            .unwrap();

        assert_eq!(report.stats.bars_processed, 0);
        assert_eq!(report.stats.final_equity, dec!(1000));
        assert_eq!(report.stats.sharpe_ratio, None);
        // One cycle per 15s interval before the 60s deadline.
        let (cycles, _) = session.poller().counters();
        assert!((4..=5).contains(&cycles));
    }

    #[test]
    fn test_non_positive_stake_rejected() {
        let config = SessionConfig::new(
            Symbol::new("NVDA").unwrap(),
            DataSourceKind::Alpaca,
            Decimal::ZERO,
        );
        assert!(config.validate().is_err());
    }
}
