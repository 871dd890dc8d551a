//! Database Models
//!
//! Row-shaped structs for the journal tables plus create/update inputs.
//! Enum-like columns are stored as text and list/blob columns as JSON
//! strings; `into_*` conversions turn rows back into domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::entities::asset::Asset;
use crate::domain::entities::goal::Goal;
use crate::domain::entities::portfolio::{PortfolioSettings, Transaction};
use crate::domain::entities::trade::Trade;
use crate::domain::entities::user_settings::UserSettings;
use crate::domain::errors::JournalError;

/// Trade row in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradeRecord {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub time: String,
    pub asset: String,
    pub direction: String, // "long" or "short"
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub position_size: f64,
    pub strategy: String,
    pub reasoning: String,
    pub market_conditions: String,
    pub tags: String, // JSON array of strings
    pub screenshots: Option<String>, // JSON array of strings
    pub is_open: bool,
    pub pnl: Option<f64>,
    pub fees: Option<f64>,
    pub emotional_state: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TradeRecord {
    pub fn into_trade(self) -> Result<Trade, JournalError> {
        let direction = self
            .direction
            .parse()
            .map_err(|e: String| JournalError::CorruptRow(e))?;
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| JournalError::CorruptRow(format!("bad tags on trade {}: {}", self.id, e)))?;
        let screenshots = match self.screenshots {
            Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
                JournalError::CorruptRow(format!("bad screenshots on trade {}: {}", self.id, e))
            })?),
            None => None,
        };

        Ok(Trade {
            id: self.id,
            date: self.date,
            time: self.time,
            asset: self.asset,
            direction,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            position_size: self.position_size,
            strategy: self.strategy,
            reasoning: self.reasoning,
            market_conditions: self.market_conditions,
            tags,
            screenshots,
            is_open: self.is_open,
            pnl: self.pnl,
            fees: self.fees,
            emotional_state: self.emotional_state,
            created_at: self.created_at,
        })
    }
}

/// Create trade input (row-shaped; list fields pre-serialized to JSON)
#[derive(Debug, Clone)]
pub struct CreateTrade {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub time: String,
    pub asset: String,
    pub direction: String,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub position_size: f64,
    pub strategy: String,
    pub reasoning: String,
    pub market_conditions: String,
    pub tags: String,
    pub screenshots: Option<String>,
    pub is_open: bool,
    pub pnl: Option<f64>,
    pub fees: Option<f64>,
    pub emotional_state: Option<String>,
}

/// Full set of updatable trade columns, written as one row
#[derive(Debug, Clone)]
pub struct TradeRow {
    pub date: String,
    pub time: String,
    pub asset: String,
    pub direction: String,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub position_size: f64,
    pub strategy: String,
    pub reasoning: String,
    pub market_conditions: String,
    pub tags: String,
    pub screenshots: Option<String>,
    pub is_open: bool,
    pub pnl: Option<f64>,
    pub fees: Option<f64>,
    pub emotional_state: Option<String>,
}

/// Portfolio settings row in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PortfolioRecord {
    pub id: String,
    pub user_id: String,
    pub initial_capital: f64,
    pub current_balance: f64,
    pub max_daily_loss: f64,
    pub max_daily_loss_percentage: f64,
    pub max_position_size: f64,
    pub max_position_size_percentage: f64,
    pub risk_reward_ratio: f64,
    pub currency: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PortfolioRecord {
    /// Convert to the domain view; transactions are filled in by the caller.
    pub fn into_settings(self) -> PortfolioSettings {
        PortfolioSettings {
            initial_capital: self.initial_capital,
            current_balance: self.current_balance,
            max_daily_loss: self.max_daily_loss,
            max_daily_loss_percentage: self.max_daily_loss_percentage,
            max_position_size: self.max_position_size,
            max_position_size_percentage: self.max_position_size_percentage,
            risk_reward_ratio: self.risk_reward_ratio,
            currency: self.currency,
            timezone: self.timezone,
            deposits: Vec::new(),
            withdrawals: Vec::new(),
        }
    }
}

/// Upsert input for portfolio settings
#[derive(Debug, Clone)]
pub struct PortfolioRow {
    pub initial_capital: f64,
    pub current_balance: f64,
    pub max_daily_loss: f64,
    pub max_daily_loss_percentage: f64,
    pub max_position_size: f64,
    pub max_position_size_percentage: f64,
    pub risk_reward_ratio: f64,
    pub currency: String,
    pub timezone: String,
}

impl From<&PortfolioSettings> for PortfolioRow {
    fn from(s: &PortfolioSettings) -> Self {
        Self {
            initial_capital: s.initial_capital,
            current_balance: s.current_balance,
            max_daily_loss: s.max_daily_loss,
            max_daily_loss_percentage: s.max_daily_loss_percentage,
            max_position_size: s.max_position_size,
            max_position_size_percentage: s.max_position_size_percentage,
            risk_reward_ratio: s.risk_reward_ratio,
            currency: s.currency.clone(),
            timezone: s.timezone.clone(),
        }
    }
}

/// Transaction row in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransactionRecord {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub amount: f64,
    pub kind: String, // "deposit" or "withdrawal"
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn into_transaction(self) -> Result<Transaction, JournalError> {
        let kind = self
            .kind
            .parse()
            .map_err(|e: String| JournalError::CorruptRow(e))?;
        Ok(Transaction {
            id: self.id,
            date: self.date,
            amount: self.amount,
            kind,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

/// Create transaction input
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub amount: f64,
    pub kind: String,
    pub description: Option<String>,
}

/// Goal row in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GoalRecord {
    pub id: String,
    pub user_id: String,
    pub goal_type: String,
    pub target: f64,
    pub current: f64,
    pub deadline: String,
    pub description: String,
    pub is_active: bool,
    pub priority: String, // "low", "medium" or "high"
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl GoalRecord {
    pub fn into_goal(self) -> Result<Goal, JournalError> {
        let priority = self
            .priority
            .parse()
            .map_err(|e: String| JournalError::CorruptRow(e))?;
        Ok(Goal {
            id: self.id,
            goal_type: self.goal_type,
            target: self.target,
            current: self.current,
            deadline: self.deadline,
            description: self.description,
            is_active: self.is_active,
            priority,
            category: self.category,
            created_at: self.created_at,
        })
    }
}

/// Create goal input
#[derive(Debug, Clone)]
pub struct CreateGoal {
    pub id: String,
    pub user_id: String,
    pub goal_type: String,
    pub target: f64,
    pub current: f64,
    pub deadline: String,
    pub description: String,
    pub is_active: bool,
    pub priority: String,
    pub category: String,
}

/// Full set of updatable goal columns
#[derive(Debug, Clone)]
pub struct GoalRow {
    pub goal_type: String,
    pub target: f64,
    pub current: f64,
    pub deadline: String,
    pub description: String,
    pub is_active: bool,
    pub priority: String,
    pub category: String,
}

/// Asset row in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssetRecord {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AssetRecord {
    pub fn into_asset(self) -> Asset {
        Asset {
            id: self.id,
            symbol: self.symbol,
            name: self.name,
            category: self.category,
            exchange: self.exchange,
            sector: self.sector,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// Create asset input
#[derive(Debug, Clone)]
pub struct CreateAsset {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub is_active: bool,
}

/// Full set of updatable asset columns
#[derive(Debug, Clone)]
pub struct AssetRow {
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub is_active: bool,
}

/// User settings row in database (preference blobs stored as JSON text)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSettingsRecord {
    pub id: String,
    pub user_id: String,
    pub theme: String,
    pub currency: String,
    pub timezone: String,
    pub date_format: String,
    pub notifications: String,
    pub risk_management: String,
    pub trading_hours: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettingsRecord {
    pub fn into_settings(self) -> Result<UserSettings, JournalError> {
        let notifications = serde_json::from_str(&self.notifications).map_err(|e| {
            JournalError::CorruptRow(format!("bad notifications for {}: {}", self.user_id, e))
        })?;
        let risk_management = serde_json::from_str(&self.risk_management).map_err(|e| {
            JournalError::CorruptRow(format!("bad risk_management for {}: {}", self.user_id, e))
        })?;
        let trading_hours = serde_json::from_str(&self.trading_hours).map_err(|e| {
            JournalError::CorruptRow(format!("bad trading_hours for {}: {}", self.user_id, e))
        })?;

        Ok(UserSettings {
            theme: self.theme,
            currency: self.currency,
            timezone: self.timezone,
            date_format: self.date_format,
            notifications,
            risk_management,
            trading_hours,
        })
    }
}

/// Upsert input for user settings
#[derive(Debug, Clone)]
pub struct UserSettingsRow {
    pub theme: String,
    pub currency: String,
    pub timezone: String,
    pub date_format: String,
    pub notifications: String,
    pub risk_management: String,
    pub trading_hours: String,
}
