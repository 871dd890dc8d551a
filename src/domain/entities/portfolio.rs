use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;

/// Kind of capital movement on the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

/// A deposit or withdrawal against the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub date: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub description: Option<String>,
}

impl TransactionDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.amount.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        if self.amount <= 0.0 {
            return Err(ValidationError::InvalidAmount(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

/// Per-user capital and risk configuration, one row per user.
///
/// `deposits` and `withdrawals` are derived from the transactions table and
/// carried here so callers get the full portfolio picture in one value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSettings {
    pub initial_capital: f64,
    pub current_balance: f64,
    pub max_daily_loss: f64,
    pub max_daily_loss_percentage: f64,
    pub max_position_size: f64,
    pub max_position_size_percentage: f64,
    pub risk_reward_ratio: f64,
    pub currency: String,
    pub timezone: String,
    pub deposits: Vec<Transaction>,
    pub withdrawals: Vec<Transaction>,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            current_balance: 10_000.0,
            max_daily_loss: 500.0,
            max_daily_loss_percentage: 5.0,
            max_position_size: 1_000.0,
            max_position_size_percentage: 10.0,
            risk_reward_ratio: 2.0,
            currency: "USD".to_string(),
            timezone: "America/New_York".to_string(),
            deposits: Vec::new(),
            withdrawals: Vec::new(),
        }
    }
}

/// Partial update for portfolio settings; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioUpdate {
    pub initial_capital: Option<f64>,
    pub current_balance: Option<f64>,
    pub max_daily_loss: Option<f64>,
    pub max_daily_loss_percentage: Option<f64>,
    pub max_position_size: Option<f64>,
    pub max_position_size_percentage: Option<f64>,
    pub risk_reward_ratio: Option<f64>,
    pub currency: Option<String>,
    pub timezone: Option<String>,
}

impl PortfolioUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for value in [
            self.initial_capital,
            self.current_balance,
            self.max_daily_loss,
            self.max_daily_loss_percentage,
            self.max_position_size,
            self.max_position_size_percentage,
            self.risk_reward_ratio,
        ]
        .into_iter()
        .flatten()
        {
            if !value.is_finite() {
                return Err(ValidationError::MustBeFinite);
            }
        }
        Ok(())
    }

    /// Apply this update on top of existing settings.
    pub fn merge_into(&self, settings: &mut PortfolioSettings) {
        if let Some(v) = self.initial_capital {
            settings.initial_capital = v;
        }
        if let Some(v) = self.current_balance {
            settings.current_balance = v;
        }
        if let Some(v) = self.max_daily_loss {
            settings.max_daily_loss = v;
        }
        if let Some(v) = self.max_daily_loss_percentage {
            settings.max_daily_loss_percentage = v;
        }
        if let Some(v) = self.max_position_size {
            settings.max_position_size = v;
        }
        if let Some(v) = self.max_position_size_percentage {
            settings.max_position_size_percentage = v;
        }
        if let Some(v) = self.risk_reward_ratio {
            settings.risk_reward_ratio = v;
        }
        if let Some(v) = &self.currency {
            settings.currency = v.clone();
        }
        if let Some(v) = &self.timezone {
            settings.timezone = v.clone();
        }
    }
}
