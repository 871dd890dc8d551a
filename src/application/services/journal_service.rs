//! Journal Service
//!
//! The single stateful data-access layer of the application: every API
//! handler goes through here. Each operation is scoped to one user, maps
//! between API payloads and table rows, applies the derived balance updates
//! (closed trades and capital movements), and fans out a change event.
//!
//! There is no cross-entity transaction: a closed trade and the balance it
//! moves are two independent row writes, mirroring the backend's row-level
//! guarantees.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::application::events::DataEvent;
use crate::domain::entities::asset::{Asset, AssetDraft, AssetUpdate};
use crate::domain::entities::goal::{Goal, GoalDraft, GoalUpdate};
use crate::domain::entities::portfolio::{
    PortfolioSettings, PortfolioUpdate, Transaction, TransactionDraft, TransactionKind,
};
use crate::domain::entities::trade::{Trade, TradeDraft, TradeUpdate};
use crate::domain::entities::user_settings::{UserSettings, UserSettingsUpdate};
use crate::domain::errors::{JournalError, ValidationError};
use crate::domain::services::metrics::{self, RiskStatus, TradeStats};
use crate::domain::value_objects::pnl::PnL;
use crate::persistence::models::*;
use crate::persistence::repository::{
    AssetRepository, GoalRepository, PortfolioRepository, TradeRepository,
    TransactionRepository, UserSettingsRepository,
};
use crate::persistence::DbPool;

/// Read-only metrics view derived from stored rows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub stats: TradeStats,
    pub account_equity: f64,
    pub risk: RiskStatus,
    /// Reasons a proposed position size breaks the limits; empty when it
    /// fits or no size was proposed
    pub position_size_violations: Vec<String>,
}

pub struct JournalService {
    trades: TradeRepository,
    portfolio: PortfolioRepository,
    transactions: TransactionRepository,
    goals: GoalRepository,
    assets: AssetRepository,
    settings: UserSettingsRepository,
    events: broadcast::Sender<DataEvent>,
}

impl JournalService {
    pub fn new(pool: DbPool, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            trades: TradeRepository::new(pool.clone()),
            portfolio: PortfolioRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool.clone()),
            goals: GoalRepository::new(pool.clone()),
            assets: AssetRepository::new(pool.clone()),
            settings: UserSettingsRepository::new(pool),
            events,
        }
    }

    /// Subscribe to change events for all users
    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: DataEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    // ---- Trades ----

    pub async fn list_trades(&self, user_id: &str) -> Result<Vec<Trade>, JournalError> {
        self.trades
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|r| r.into_trade())
            .collect()
    }

    pub async fn add_trade(
        &self,
        user_id: &str,
        mut draft: TradeDraft,
    ) -> Result<Trade, JournalError> {
        draft.validate()?;

        // A trade recorded closed without an explicit pnl gets the gross
        // figure derived from its fill
        if !draft.is_open && draft.pnl.is_none() {
            if let Some(exit) = draft.exit_price {
                let gross =
                    PnL::from_fill(draft.direction, draft.entry_price, exit, draft.position_size)?;
                draft.pnl = Some(gross.value());
            }
        }

        let record = self
            .trades
            .create(CreateTrade {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                date: draft.date.clone(),
                time: draft.time.clone(),
                asset: draft.asset.clone(),
                direction: draft.direction.as_str().to_string(),
                entry_price: draft.entry_price,
                exit_price: draft.exit_price,
                position_size: draft.position_size,
                strategy: draft.strategy.clone(),
                reasoning: draft.reasoning.clone(),
                market_conditions: draft.market_conditions.clone(),
                tags: encode_json(&draft.tags)?,
                screenshots: draft
                    .screenshots
                    .as_ref()
                    .map(encode_json)
                    .transpose()?,
                is_open: draft.is_open,
                pnl: draft.pnl,
                fees: draft.fees,
                emotional_state: draft.emotional_state.clone(),
            })
            .await?;

        let trade = record.into_trade()?;
        info!("Recorded trade {} on {} for {}", trade.id, trade.asset, user_id);

        // A trade recorded already closed moves the balance immediately
        if let Some(net) = trade.net_pnl() {
            self.apply_balance_delta(user_id, net).await?;
            self.publish(DataEvent::PortfolioChanged(user_id.to_string()));
        }

        self.publish(DataEvent::TradesChanged(user_id.to_string()));
        Ok(trade)
    }

    pub async fn update_trade(
        &self,
        user_id: &str,
        id: &str,
        update: TradeUpdate,
    ) -> Result<Trade, JournalError> {
        update.validate()?;

        let record = self
            .trades
            .get(user_id, id)
            .await?
            .ok_or(JournalError::NotFound {
                entity: "trade",
                id: id.to_string(),
            })?;
        let mut trade = record.into_trade()?;
        let was_open = trade.is_open;

        merge_trade_update(&mut trade, &update);

        // The merged state must still hold the create-time invariants
        if !trade.is_open && trade.exit_price.is_none() {
            return Err(ValidationError::MissingExitPrice.into());
        }

        // Closing without an explicit pnl derives the gross figure from the fill
        if was_open && !trade.is_open && trade.pnl.is_none() {
            if let Some(exit) = trade.exit_price {
                let gross =
                    PnL::from_fill(trade.direction, trade.entry_price, exit, trade.position_size)?;
                trade.pnl = Some(gross.value());
            }
        }

        self.trades
            .update(
                user_id,
                id,
                TradeRow {
                    date: trade.date.clone(),
                    time: trade.time.clone(),
                    asset: trade.asset.clone(),
                    direction: trade.direction.as_str().to_string(),
                    entry_price: trade.entry_price,
                    exit_price: trade.exit_price,
                    position_size: trade.position_size,
                    strategy: trade.strategy.clone(),
                    reasoning: trade.reasoning.clone(),
                    market_conditions: trade.market_conditions.clone(),
                    tags: encode_json(&trade.tags)?,
                    screenshots: trade.screenshots.as_ref().map(encode_json).transpose()?,
                    is_open: trade.is_open,
                    pnl: trade.pnl,
                    fees: trade.fees,
                    emotional_state: trade.emotional_state.clone(),
                },
            )
            .await?;

        // Only the open -> closed transition moves the balance; edits to an
        // already-closed trade never re-apply it.
        if was_open && !trade.is_open {
            if let Some(net) = trade.net_pnl() {
                self.apply_balance_delta(user_id, net).await?;
                self.publish(DataEvent::PortfolioChanged(user_id.to_string()));
            }
        }

        self.publish(DataEvent::TradesChanged(user_id.to_string()));
        Ok(trade)
    }

    pub async fn delete_trade(&self, user_id: &str, id: &str) -> Result<(), JournalError> {
        let removed = self.trades.delete(user_id, id).await?;
        if removed == 0 {
            return Err(JournalError::NotFound {
                entity: "trade",
                id: id.to_string(),
            });
        }
        debug!("Deleted trade {} for {}", id, user_id);
        self.publish(DataEvent::TradesChanged(user_id.to_string()));
        Ok(())
    }

    // ---- Portfolio ----

    /// Portfolio settings merged with the user's transactions. A user with
    /// no stored row gets the defaults.
    pub async fn portfolio(&self, user_id: &str) -> Result<PortfolioSettings, JournalError> {
        let mut settings = match self.portfolio.get(user_id).await? {
            Some(record) => record.into_settings(),
            None => PortfolioSettings::default(),
        };

        let transactions = self
            .transactions
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|r| r.into_transaction())
            .collect::<Result<Vec<_>, _>>()?;

        for transaction in transactions {
            match transaction.kind {
                TransactionKind::Deposit => settings.deposits.push(transaction),
                TransactionKind::Withdrawal => settings.withdrawals.push(transaction),
            }
        }

        Ok(settings)
    }

    pub async fn update_portfolio(
        &self,
        user_id: &str,
        update: PortfolioUpdate,
    ) -> Result<PortfolioSettings, JournalError> {
        update.validate()?;

        let mut settings = match self.portfolio.get(user_id).await? {
            Some(record) => record.into_settings(),
            None => PortfolioSettings::default(),
        };
        update.merge_into(&mut settings);

        self.portfolio
            .upsert(user_id, PortfolioRow::from(&settings))
            .await?;

        self.publish(DataEvent::PortfolioChanged(user_id.to_string()));
        self.portfolio(user_id).await
    }

    pub async fn add_transaction(
        &self,
        user_id: &str,
        draft: TransactionDraft,
    ) -> Result<Transaction, JournalError> {
        draft.validate()?;

        let record = self
            .transactions
            .create(CreateTransaction {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                date: draft.date.clone(),
                amount: draft.amount,
                kind: draft.kind.as_str().to_string(),
                description: draft.description.clone(),
            })
            .await?;
        let transaction = record.into_transaction()?;

        let delta = match transaction.kind {
            TransactionKind::Deposit => transaction.amount,
            TransactionKind::Withdrawal => -transaction.amount,
        };
        self.apply_balance_delta(user_id, delta).await?;
        info!(
            "Recorded {} of {:.2} for {}",
            transaction.kind.as_str(),
            transaction.amount,
            user_id
        );

        self.publish(DataEvent::PortfolioChanged(user_id.to_string()));
        Ok(transaction)
    }

    /// Shift the stored balance by `delta`, creating the settings row from
    /// defaults when the user has none yet.
    async fn apply_balance_delta(&self, user_id: &str, delta: f64) -> Result<(), JournalError> {
        let mut settings = match self.portfolio.get(user_id).await? {
            Some(record) => record.into_settings(),
            None => PortfolioSettings::default(),
        };
        settings.current_balance += delta;
        self.portfolio
            .upsert(user_id, PortfolioRow::from(&settings))
            .await?;
        debug!("Balance for {} moved by {:+.2}", user_id, delta);
        Ok(())
    }

    // ---- Goals ----

    pub async fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>, JournalError> {
        self.goals
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|r| r.into_goal())
            .collect()
    }

    pub async fn add_goal(&self, user_id: &str, draft: GoalDraft) -> Result<Goal, JournalError> {
        draft.validate()?;

        let record = self
            .goals
            .create(CreateGoal {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                goal_type: draft.goal_type.clone(),
                target: draft.target,
                current: draft.current,
                deadline: draft.deadline.clone(),
                description: draft.description.clone(),
                is_active: draft.is_active,
                priority: draft.priority.as_str().to_string(),
                category: draft.category.clone(),
            })
            .await?;

        let goal = record.into_goal()?;
        self.publish(DataEvent::GoalsChanged(user_id.to_string()));
        Ok(goal)
    }

    pub async fn update_goal(
        &self,
        user_id: &str,
        id: &str,
        update: GoalUpdate,
    ) -> Result<Goal, JournalError> {
        update.validate()?;

        let record = self
            .goals
            .get(user_id, id)
            .await?
            .ok_or(JournalError::NotFound {
                entity: "goal",
                id: id.to_string(),
            })?;
        let mut goal = record.into_goal()?;

        if let Some(v) = &update.goal_type {
            goal.goal_type = v.clone();
        }
        if let Some(v) = update.target {
            goal.target = v;
        }
        if let Some(v) = update.current {
            goal.current = v;
        }
        if let Some(v) = &update.deadline {
            goal.deadline = v.clone();
        }
        if let Some(v) = &update.description {
            goal.description = v.clone();
        }
        if let Some(v) = update.is_active {
            goal.is_active = v;
        }
        if let Some(v) = update.priority {
            goal.priority = v;
        }
        if let Some(v) = &update.category {
            goal.category = v.clone();
        }

        self.goals
            .update(
                user_id,
                id,
                GoalRow {
                    goal_type: goal.goal_type.clone(),
                    target: goal.target,
                    current: goal.current,
                    deadline: goal.deadline.clone(),
                    description: goal.description.clone(),
                    is_active: goal.is_active,
                    priority: goal.priority.as_str().to_string(),
                    category: goal.category.clone(),
                },
            )
            .await?;

        self.publish(DataEvent::GoalsChanged(user_id.to_string()));
        Ok(goal)
    }

    pub async fn delete_goal(&self, user_id: &str, id: &str) -> Result<(), JournalError> {
        let removed = self.goals.delete(user_id, id).await?;
        if removed == 0 {
            return Err(JournalError::NotFound {
                entity: "goal",
                id: id.to_string(),
            });
        }
        self.publish(DataEvent::GoalsChanged(user_id.to_string()));
        Ok(())
    }

    // ---- Assets ----

    pub async fn list_assets(&self, user_id: &str) -> Result<Vec<Asset>, JournalError> {
        Ok(self
            .assets
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|r| r.into_asset())
            .collect())
    }

    pub async fn add_asset(&self, user_id: &str, draft: AssetDraft) -> Result<Asset, JournalError> {
        draft.validate()?;

        let record = self
            .assets
            .create(CreateAsset {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                symbol: draft.symbol.clone(),
                name: draft.name.clone(),
                category: draft.category.clone(),
                exchange: draft.exchange.clone(),
                sector: draft.sector.clone(),
                is_active: draft.is_active,
            })
            .await?;

        let asset = record.into_asset();
        self.publish(DataEvent::AssetsChanged(user_id.to_string()));
        Ok(asset)
    }

    pub async fn update_asset(
        &self,
        user_id: &str,
        id: &str,
        update: AssetUpdate,
    ) -> Result<Asset, JournalError> {
        update.validate()?;

        let record = self
            .assets
            .get(user_id, id)
            .await?
            .ok_or(JournalError::NotFound {
                entity: "asset",
                id: id.to_string(),
            })?;
        let mut asset = record.into_asset();

        if let Some(v) = &update.symbol {
            asset.symbol = v.clone();
        }
        if let Some(v) = &update.name {
            asset.name = v.clone();
        }
        if let Some(v) = &update.category {
            asset.category = v.clone();
        }
        if let Some(v) = &update.exchange {
            asset.exchange = Some(v.clone());
        }
        if let Some(v) = &update.sector {
            asset.sector = Some(v.clone());
        }
        if let Some(v) = update.is_active {
            asset.is_active = v;
        }

        self.assets
            .update(
                user_id,
                id,
                AssetRow {
                    symbol: asset.symbol.clone(),
                    name: asset.name.clone(),
                    category: asset.category.clone(),
                    exchange: asset.exchange.clone(),
                    sector: asset.sector.clone(),
                    is_active: asset.is_active,
                },
            )
            .await?;

        self.publish(DataEvent::AssetsChanged(user_id.to_string()));
        Ok(asset)
    }

    pub async fn delete_asset(&self, user_id: &str, id: &str) -> Result<(), JournalError> {
        let removed = self.assets.delete(user_id, id).await?;
        if removed == 0 {
            return Err(JournalError::NotFound {
                entity: "asset",
                id: id.to_string(),
            });
        }
        self.publish(DataEvent::AssetsChanged(user_id.to_string()));
        Ok(())
    }

    // ---- User settings ----

    pub async fn user_settings(&self, user_id: &str) -> Result<UserSettings, JournalError> {
        match self.settings.get(user_id).await? {
            Some(record) => record.into_settings(),
            None => Ok(UserSettings::default()),
        }
    }

    pub async fn update_user_settings(
        &self,
        user_id: &str,
        update: UserSettingsUpdate,
    ) -> Result<UserSettings, JournalError> {
        let mut settings = self.user_settings(user_id).await?;
        update.merge_into(&mut settings);

        self.settings
            .upsert(
                user_id,
                UserSettingsRow {
                    theme: settings.theme.clone(),
                    currency: settings.currency.clone(),
                    timezone: settings.timezone.clone(),
                    date_format: settings.date_format.clone(),
                    notifications: encode_json(&settings.notifications)?,
                    risk_management: encode_json(&settings.risk_management)?,
                    trading_hours: encode_json(&settings.trading_hours)?,
                },
            )
            .await?;

        self.publish(DataEvent::SettingsChanged(user_id.to_string()));
        Ok(settings)
    }

    // ---- Derived metrics ----

    /// Metrics for the given day (YYYY-MM-DD); defaults to today (UTC).
    /// A proposed position size, when given, is checked against the
    /// portfolio limits.
    pub async fn metrics(
        &self,
        user_id: &str,
        day: Option<String>,
        proposed_size: Option<f64>,
    ) -> Result<MetricsSummary, JournalError> {
        let trades = self.list_trades(user_id).await?;
        let portfolio = self.portfolio(user_id).await?;

        let stats = metrics::compute_stats(&trades);
        let account_equity = metrics::account_equity(
            portfolio.initial_capital,
            &portfolio.deposits,
            &portfolio.withdrawals,
            stats.total_net_pnl,
        );
        let day = day.unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());
        let risk = metrics::check_risk(&trades, &portfolio, &day);
        let position_size_violations = proposed_size
            .map(|size| metrics::position_size_violations(&portfolio, size))
            .unwrap_or_default();

        Ok(MetricsSummary {
            stats,
            account_equity,
            risk,
            position_size_violations,
        })
    }

    // ---- Snapshot export ----

    /// Full JSON snapshot of the user's journal, for backups.
    pub async fn export(&self, user_id: &str) -> Result<serde_json::Value, JournalError> {
        let trades = self.list_trades(user_id).await?;
        let portfolio = self.portfolio(user_id).await?;
        let goals = self.list_goals(user_id).await?;
        let assets = self.list_assets(user_id).await?;
        let user_settings = self.user_settings(user_id).await?;

        Ok(serde_json::json!({
            "trades": trades,
            "portfolio": portfolio,
            "goals": goals,
            "assets": assets,
            "userSettings": user_settings,
            "exportDate": Utc::now().to_rfc3339(),
        }))
    }
}

fn merge_trade_update(trade: &mut Trade, update: &TradeUpdate) {
    if let Some(v) = &update.date {
        trade.date = v.clone();
    }
    if let Some(v) = &update.time {
        trade.time = v.clone();
    }
    if let Some(v) = &update.asset {
        trade.asset = v.clone();
    }
    if let Some(v) = update.direction {
        trade.direction = v;
    }
    if let Some(v) = update.entry_price {
        trade.entry_price = v;
    }
    if let Some(v) = update.exit_price {
        trade.exit_price = Some(v);
    }
    if let Some(v) = update.position_size {
        trade.position_size = v;
    }
    if let Some(v) = &update.strategy {
        trade.strategy = v.clone();
    }
    if let Some(v) = &update.reasoning {
        trade.reasoning = v.clone();
    }
    if let Some(v) = &update.market_conditions {
        trade.market_conditions = v.clone();
    }
    if let Some(v) = &update.tags {
        trade.tags = v.clone();
    }
    if let Some(v) = &update.screenshots {
        trade.screenshots = Some(v.clone());
    }
    if let Some(v) = update.is_open {
        trade.is_open = v;
    }
    if let Some(v) = update.pnl {
        trade.pnl = Some(v);
    }
    if let Some(v) = update.fees {
        trade.fees = Some(v);
    }
    if let Some(v) = &update.emotional_state {
        trade.emotional_state = Some(v.clone());
    }
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, JournalError> {
    serde_json::to_string(value).map_err(|e| JournalError::Storage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::trade::TradeDirection;
    use crate::persistence::init_database;

    async fn service() -> JournalService {
        let pool = init_database("sqlite::memory:").await.unwrap();
        JournalService::new(pool, 16)
    }

    fn open_draft() -> TradeDraft {
        TradeDraft {
            date: "2024-03-01".to_string(),
            time: "10:15".to_string(),
            asset: "AAPL".to_string(),
            direction: TradeDirection::Long,
            entry_price: 150.0,
            exit_price: None,
            position_size: 10.0,
            strategy: "breakout".to_string(),
            reasoning: String::new(),
            market_conditions: String::new(),
            tags: vec!["momentum".to_string()],
            screenshots: None,
            is_open: true,
            pnl: None,
            fees: None,
            emotional_state: None,
        }
    }

    #[tokio::test]
    async fn test_closing_trade_moves_balance_once() {
        let service = service().await;
        let trade = service.add_trade("user-a", open_draft()).await.unwrap();

        let close = TradeUpdate {
            exit_price: Some(155.0),
            is_open: Some(false),
            pnl: Some(50.0),
            fees: Some(2.0),
            ..Default::default()
        };
        service
            .update_trade("user-a", &trade.id, close)
            .await
            .unwrap();

        let portfolio = service.portfolio("user-a").await.unwrap();
        assert_eq!(portfolio.current_balance, 10_048.0);

        // Editing the closed trade must not re-apply the pnl
        let touch = TradeUpdate {
            reasoning: Some("late note".to_string()),
            ..Default::default()
        };
        service
            .update_trade("user-a", &trade.id, touch)
            .await
            .unwrap();
        let portfolio = service.portfolio("user-a").await.unwrap();
        assert_eq!(portfolio.current_balance, 10_048.0);
    }

    #[tokio::test]
    async fn test_closed_trade_on_insert_moves_balance() {
        let service = service().await;
        let mut draft = open_draft();
        draft.is_open = false;
        draft.exit_price = Some(145.0);
        draft.pnl = Some(-50.0);
        draft.fees = Some(1.0);

        service.add_trade("user-a", draft).await.unwrap();
        let portfolio = service.portfolio("user-a").await.unwrap();
        assert_eq!(portfolio.current_balance, 10_000.0 - 51.0);
    }

    #[tokio::test]
    async fn test_transactions_split_and_move_balance() {
        let service = service().await;

        service
            .add_transaction(
                "user-a",
                TransactionDraft {
                    date: "2024-03-01".to_string(),
                    amount: 1_000.0,
                    kind: TransactionKind::Deposit,
                    description: Some("funding".to_string()),
                },
            )
            .await
            .unwrap();
        service
            .add_transaction(
                "user-a",
                TransactionDraft {
                    date: "2024-03-02".to_string(),
                    amount: 250.0,
                    kind: TransactionKind::Withdrawal,
                    description: None,
                },
            )
            .await
            .unwrap();

        let portfolio = service.portfolio("user-a").await.unwrap();
        assert_eq!(portfolio.current_balance, 10_750.0);
        assert_eq!(portfolio.deposits.len(), 1);
        assert_eq!(portfolio.withdrawals.len(), 1);
    }

    #[tokio::test]
    async fn test_events_fan_out() {
        let service = service().await;
        let mut events = service.subscribe();

        service.add_trade("user-a", open_draft()).await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event, DataEvent::TradesChanged("user-a".to_string()));
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let service = service().await;
        let trade = service.add_trade("user-a", open_draft()).await.unwrap();

        assert!(service.list_trades("user-b").await.unwrap().is_empty());
        let result = service.delete_trade("user-b", &trade.id).await;
        assert!(matches!(result, Err(JournalError::NotFound { .. })));

        // Still there for the owner
        assert_eq!(service.list_trades("user-a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_rows_yield_defaults() {
        let service = service().await;
        let portfolio = service.portfolio("nobody").await.unwrap();
        assert_eq!(portfolio.initial_capital, 10_000.0);

        let settings = service.user_settings("nobody").await.unwrap();
        assert_eq!(settings.theme, "light");
    }
}
