//! Database Repositories
//!
//! Data access for the journal tables. Every query carries a `user_id`
//! predicate so one user can never read or write another user's rows.

use super::models::*;
use super::{DatabaseError, DbPool};
use chrono::Utc;
use tracing::{debug, error};

/// Trade repository
pub struct TradeRepository {
    pool: DbPool,
}

impl TradeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, trade: CreateTrade) -> Result<TradeRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, TradeRecord>(
            r#"
            INSERT INTO trades (
                id, user_id, date, time, asset, direction, entry_price, exit_price,
                position_size, strategy, reasoning, market_conditions, tags,
                screenshots, is_open, pnl, fees, emotional_state, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            RETURNING *
            "#,
        )
        .bind(&trade.id)
        .bind(&trade.user_id)
        .bind(&trade.date)
        .bind(&trade.time)
        .bind(&trade.asset)
        .bind(&trade.direction)
        .bind(trade.entry_price)
        .bind(trade.exit_price)
        .bind(trade.position_size)
        .bind(&trade.strategy)
        .bind(&trade.reasoning)
        .bind(&trade.market_conditions)
        .bind(&trade.tags)
        .bind(&trade.screenshots)
        .bind(trade.is_open)
        .bind(trade.pnl)
        .bind(trade.fees)
        .bind(&trade.emotional_state)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create trade: {}", e);
            DatabaseError::QueryError(format!("Failed to create trade: {}", e))
        })?;

        debug!("Created trade: {} for {}", record.id, record.asset);
        Ok(record)
    }

    pub async fn get(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<TradeRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, TradeRecord>(
            "SELECT * FROM trades WHERE id = ?1 AND user_id = ?2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get trade {}: {}", id, e);
            DatabaseError::QueryError(format!("Failed to get trade: {}", e))
        })?;

        Ok(record)
    }

    /// All trades for a user, newest first
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<TradeRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, TradeRecord>(
            "SELECT * FROM trades WHERE user_id = ?1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list trades for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to list trades: {}", e))
        })?;

        Ok(records)
    }

    /// Overwrite the updatable columns of a trade
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        row: TradeRow,
    ) -> Result<(), DatabaseError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE trades
            SET date = ?1, time = ?2, asset = ?3, direction = ?4, entry_price = ?5,
                exit_price = ?6, position_size = ?7, strategy = ?8, reasoning = ?9,
                market_conditions = ?10, tags = ?11, screenshots = ?12, is_open = ?13,
                pnl = ?14, fees = ?15, emotional_state = ?16
            WHERE id = ?17 AND user_id = ?18
            "#,
        )
        .bind(&row.date)
        .bind(&row.time)
        .bind(&row.asset)
        .bind(&row.direction)
        .bind(row.entry_price)
        .bind(row.exit_price)
        .bind(row.position_size)
        .bind(&row.strategy)
        .bind(&row.reasoning)
        .bind(&row.market_conditions)
        .bind(&row.tags)
        .bind(&row.screenshots)
        .bind(row.is_open)
        .bind(row.pnl)
        .bind(row.fees)
        .bind(&row.emotional_state)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to update trade {}: {}", id, e);
            DatabaseError::QueryError(format!("Failed to update trade: {}", e))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(DatabaseError::QueryError(format!(
                "Trade not found: {}",
                id
            )));
        }

        debug!("Updated trade: {}", id);
        Ok(())
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<u64, DatabaseError> {
        let rows_affected = sqlx::query("DELETE FROM trades WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete trade {}: {}", id, e);
                DatabaseError::QueryError(format!("Failed to delete trade: {}", e))
            })?
            .rows_affected();

        Ok(rows_affected)
    }
}

/// Portfolio settings repository (one row per user)
pub struct PortfolioRepository {
    pool: DbPool,
}

impl PortfolioRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<PortfolioRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, PortfolioRecord>(
            "SELECT * FROM portfolio_settings WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get portfolio for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to get portfolio: {}", e))
        })?;

        Ok(record)
    }

    pub async fn upsert(
        &self,
        user_id: &str,
        row: PortfolioRow,
    ) -> Result<PortfolioRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, PortfolioRecord>(
            r#"
            INSERT INTO portfolio_settings (
                id, user_id, initial_capital, current_balance, max_daily_loss,
                max_daily_loss_percentage, max_position_size, max_position_size_percentage,
                risk_reward_ratio, currency, timezone, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            ON CONFLICT(user_id) DO UPDATE SET
                initial_capital = excluded.initial_capital,
                current_balance = excluded.current_balance,
                max_daily_loss = excluded.max_daily_loss,
                max_daily_loss_percentage = excluded.max_daily_loss_percentage,
                max_position_size = excluded.max_position_size,
                max_position_size_percentage = excluded.max_position_size_percentage,
                risk_reward_ratio = excluded.risk_reward_ratio,
                currency = excluded.currency,
                timezone = excluded.timezone,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(row.initial_capital)
        .bind(row.current_balance)
        .bind(row.max_daily_loss)
        .bind(row.max_daily_loss_percentage)
        .bind(row.max_position_size)
        .bind(row.max_position_size_percentage)
        .bind(row.risk_reward_ratio)
        .bind(&row.currency)
        .bind(&row.timezone)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to upsert portfolio for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to upsert portfolio: {}", e))
        })?;

        debug!("Upserted portfolio settings for {}", user_id);
        Ok(record)
    }
}

/// Transaction repository
pub struct TransactionRepository {
    pool: DbPool,
}

impl TransactionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        transaction: CreateTransaction,
    ) -> Result<TransactionRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, TransactionRecord>(
            r#"
            INSERT INTO transactions (id, user_id, date, amount, kind, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING *
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.user_id)
        .bind(&transaction.date)
        .bind(transaction.amount)
        .bind(&transaction.kind)
        .bind(&transaction.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create transaction: {}", e);
            DatabaseError::QueryError(format!("Failed to create transaction: {}", e))
        })?;

        debug!("Created {}: {}", record.kind, record.id);
        Ok(record)
    }

    /// All transactions for a user, newest first
    pub async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<TransactionRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            "SELECT * FROM transactions WHERE user_id = ?1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list transactions for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to list transactions: {}", e))
        })?;

        Ok(records)
    }
}

/// Goal repository
pub struct GoalRepository {
    pool: DbPool,
}

impl GoalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, goal: CreateGoal) -> Result<GoalRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, GoalRecord>(
            r#"
            INSERT INTO goals (
                id, user_id, goal_type, target, current, deadline, description,
                is_active, priority, category, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            RETURNING *
            "#,
        )
        .bind(&goal.id)
        .bind(&goal.user_id)
        .bind(&goal.goal_type)
        .bind(goal.target)
        .bind(goal.current)
        .bind(&goal.deadline)
        .bind(&goal.description)
        .bind(goal.is_active)
        .bind(&goal.priority)
        .bind(&goal.category)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create goal: {}", e);
            DatabaseError::QueryError(format!("Failed to create goal: {}", e))
        })?;

        debug!("Created goal: {}", record.id);
        Ok(record)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<GoalRecord>, DatabaseError> {
        let record =
            sqlx::query_as::<_, GoalRecord>("SELECT * FROM goals WHERE id = ?1 AND user_id = ?2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to get goal {}: {}", id, e);
                    DatabaseError::QueryError(format!("Failed to get goal: {}", e))
                })?;

        Ok(record)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<GoalRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, GoalRecord>(
            "SELECT * FROM goals WHERE user_id = ?1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list goals for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to list goals: {}", e))
        })?;

        Ok(records)
    }

    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        row: GoalRow,
    ) -> Result<(), DatabaseError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE goals
            SET goal_type = ?1, target = ?2, current = ?3, deadline = ?4,
                description = ?5, is_active = ?6, priority = ?7, category = ?8
            WHERE id = ?9 AND user_id = ?10
            "#,
        )
        .bind(&row.goal_type)
        .bind(row.target)
        .bind(row.current)
        .bind(&row.deadline)
        .bind(&row.description)
        .bind(row.is_active)
        .bind(&row.priority)
        .bind(&row.category)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to update goal {}: {}", id, e);
            DatabaseError::QueryError(format!("Failed to update goal: {}", e))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(DatabaseError::QueryError(format!("Goal not found: {}", id)));
        }

        Ok(())
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<u64, DatabaseError> {
        let rows_affected = sqlx::query("DELETE FROM goals WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete goal {}: {}", id, e);
                DatabaseError::QueryError(format!("Failed to delete goal: {}", e))
            })?
            .rows_affected();

        Ok(rows_affected)
    }
}

/// Asset (watchlist) repository
pub struct AssetRepository {
    pool: DbPool,
}

impl AssetRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, asset: CreateAsset) -> Result<AssetRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, AssetRecord>(
            r#"
            INSERT INTO assets (
                id, user_id, symbol, name, category, exchange, sector, is_active, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING *
            "#,
        )
        .bind(&asset.id)
        .bind(&asset.user_id)
        .bind(&asset.symbol)
        .bind(&asset.name)
        .bind(&asset.category)
        .bind(&asset.exchange)
        .bind(&asset.sector)
        .bind(asset.is_active)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create asset: {}", e);
            DatabaseError::QueryError(format!("Failed to create asset: {}", e))
        })?;

        debug!("Created asset: {} ({})", record.symbol, record.id);
        Ok(record)
    }

    pub async fn get(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<AssetRecord>, DatabaseError> {
        let record =
            sqlx::query_as::<_, AssetRecord>("SELECT * FROM assets WHERE id = ?1 AND user_id = ?2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to get asset {}: {}", id, e);
                    DatabaseError::QueryError(format!("Failed to get asset: {}", e))
                })?;

        Ok(record)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<AssetRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, AssetRecord>(
            "SELECT * FROM assets WHERE user_id = ?1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list assets for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to list assets: {}", e))
        })?;

        Ok(records)
    }

    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        row: AssetRow,
    ) -> Result<(), DatabaseError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE assets
            SET symbol = ?1, name = ?2, category = ?3, exchange = ?4, sector = ?5, is_active = ?6
            WHERE id = ?7 AND user_id = ?8
            "#,
        )
        .bind(&row.symbol)
        .bind(&row.name)
        .bind(&row.category)
        .bind(&row.exchange)
        .bind(&row.sector)
        .bind(row.is_active)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to update asset {}: {}", id, e);
            DatabaseError::QueryError(format!("Failed to update asset: {}", e))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(DatabaseError::QueryError(format!(
                "Asset not found: {}",
                id
            )));
        }

        Ok(())
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<u64, DatabaseError> {
        let rows_affected = sqlx::query("DELETE FROM assets WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete asset {}: {}", id, e);
                DatabaseError::QueryError(format!("Failed to delete asset: {}", e))
            })?
            .rows_affected();

        Ok(rows_affected)
    }
}

/// User settings repository (one row per user)
pub struct UserSettingsRepository {
    pool: DbPool,
}

impl UserSettingsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<UserSettingsRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, UserSettingsRecord>(
            "SELECT * FROM user_settings WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get user settings for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to get user settings: {}", e))
        })?;

        Ok(record)
    }

    pub async fn upsert(
        &self,
        user_id: &str,
        row: UserSettingsRow,
    ) -> Result<UserSettingsRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, UserSettingsRecord>(
            r#"
            INSERT INTO user_settings (
                id, user_id, theme, currency, timezone, date_format,
                notifications, risk_management, trading_hours, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ON CONFLICT(user_id) DO UPDATE SET
                theme = excluded.theme,
                currency = excluded.currency,
                timezone = excluded.timezone,
                date_format = excluded.date_format,
                notifications = excluded.notifications,
                risk_management = excluded.risk_management,
                trading_hours = excluded.trading_hours,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(&row.theme)
        .bind(&row.currency)
        .bind(&row.timezone)
        .bind(&row.date_format)
        .bind(&row.notifications)
        .bind(&row.risk_management)
        .bind(&row.trading_hours)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to upsert user settings for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to upsert user settings: {}", e))
        })?;

        debug!("Upserted user settings for {}", user_id);
        Ok(record)
    }
}
