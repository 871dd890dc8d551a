use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;

/// Direction of a trade: long profits when price rises, short when it falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Long => "long",
            TradeDirection::Short => "short",
        }
    }
}

impl std::str::FromStr for TradeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(TradeDirection::Long),
            "short" => Ok(TradeDirection::Short),
            other => Err(format!("unknown trade direction: {}", other)),
        }
    }
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A journal entry for a single trade.
///
/// Prices and sizes are stored exactly as entered; `pnl` is the gross
/// profit/loss recorded on close and `fees` are kept separately, so the
/// net effect on the account is `pnl - fees`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    /// Calendar day of the trade as entered (YYYY-MM-DD)
    pub date: String,
    /// Wall-clock time of the trade as entered (HH:MM)
    pub time: String,
    pub asset: String,
    pub direction: TradeDirection,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub position_size: f64,
    pub strategy: String,
    pub reasoning: String,
    pub market_conditions: String,
    pub tags: Vec<String>,
    pub screenshots: Option<Vec<String>>,
    pub is_open: bool,
    pub pnl: Option<f64>,
    pub fees: Option<f64>,
    pub emotional_state: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Trade {
    /// Net effect of this trade on the account balance, if closed with a pnl.
    pub fn net_pnl(&self) -> Option<f64> {
        if self.is_open {
            return None;
        }
        self.pnl.map(|gross| gross - self.fees.unwrap_or(0.0))
    }
}

/// Payload for recording a new trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDraft {
    pub date: String,
    pub time: String,
    pub asset: String,
    pub direction: TradeDirection,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub position_size: f64,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub market_conditions: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub screenshots: Option<Vec<String>>,
    pub is_open: bool,
    pub pnl: Option<f64>,
    pub fees: Option<f64>,
    pub emotional_state: Option<String>,
}

impl TradeDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_price(self.entry_price)?;
        if let Some(exit) = self.exit_price {
            validate_price(exit)?;
        }
        if !self.position_size.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        if self.position_size <= 0.0 {
            return Err(ValidationError::InvalidPositionSize(format!(
                "position size must be positive, got {}",
                self.position_size
            )));
        }
        if self.asset.trim().is_empty() {
            return Err(ValidationError::InvalidSymbol("asset is empty".to_string()));
        }
        if !self.is_open && self.exit_price.is_none() {
            return Err(ValidationError::MissingExitPrice);
        }
        if let Some(fees) = self.fees {
            if !fees.is_finite() {
                return Err(ValidationError::MustBeFinite);
            }
            if fees < 0.0 {
                return Err(ValidationError::MustBeNonNegative);
            }
        }
        if let Some(pnl) = self.pnl {
            if !pnl.is_finite() {
                return Err(ValidationError::MustBeFinite);
            }
        }
        Ok(())
    }
}

/// Field-level update for an existing trade; `None` leaves the field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeUpdate {
    pub date: Option<String>,
    pub time: Option<String>,
    pub asset: Option<String>,
    pub direction: Option<TradeDirection>,
    pub entry_price: Option<f64>,
    pub exit_price: Option<f64>,
    pub position_size: Option<f64>,
    pub strategy: Option<String>,
    pub reasoning: Option<String>,
    pub market_conditions: Option<String>,
    pub tags: Option<Vec<String>>,
    pub screenshots: Option<Vec<String>>,
    pub is_open: Option<bool>,
    pub pnl: Option<f64>,
    pub fees: Option<f64>,
    pub emotional_state: Option<String>,
}

impl TradeUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(entry) = self.entry_price {
            validate_price(entry)?;
        }
        if let Some(exit) = self.exit_price {
            validate_price(exit)?;
        }
        if let Some(size) = self.position_size {
            if !size.is_finite() {
                return Err(ValidationError::MustBeFinite);
            }
            if size <= 0.0 {
                return Err(ValidationError::InvalidPositionSize(format!(
                    "position size must be positive, got {}",
                    size
                )));
            }
        }
        if let Some(fees) = self.fees {
            if !fees.is_finite() {
                return Err(ValidationError::MustBeFinite);
            }
            if fees < 0.0 {
                return Err(ValidationError::MustBeNonNegative);
            }
        }
        if let Some(pnl) = self.pnl {
            if !pnl.is_finite() {
                return Err(ValidationError::MustBeFinite);
            }
        }
        Ok(())
    }
}

fn validate_price(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::MustBeFinite);
    }
    if value <= 0.0 {
        return Err(ValidationError::InvalidPrice(format!(
            "price must be positive, got {}",
            value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TradeDraft {
        TradeDraft {
            date: "2024-03-01".to_string(),
            time: "10:15".to_string(),
            asset: "AAPL".to_string(),
            direction: TradeDirection::Long,
            entry_price: 150.0,
            exit_price: Some(155.0),
            position_size: 10.0,
            strategy: "breakout".to_string(),
            reasoning: String::new(),
            market_conditions: String::new(),
            tags: vec![],
            screenshots: None,
            is_open: false,
            pnl: Some(50.0),
            fees: Some(2.0),
            emotional_state: None,
        }
    }

    #[test]
    fn test_valid_draft() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_closed_trade_requires_exit_price() {
        let mut d = draft();
        d.exit_price = None;
        assert!(matches!(
            d.validate(),
            Err(ValidationError::MissingExitPrice)
        ));
    }

    #[test]
    fn test_rejects_non_positive_entry() {
        let mut d = draft();
        d.entry_price = 0.0;
        assert!(d.validate().is_err());
        d.entry_price = -5.0;
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let mut d = draft();
        d.pnl = Some(f64::NAN);
        assert!(d.validate().is_err());

        let mut d = draft();
        d.position_size = f64::INFINITY;
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_fees() {
        let mut d = draft();
        d.fees = Some(-1.0);
        assert!(matches!(
            d.validate(),
            Err(ValidationError::MustBeNonNegative)
        ));
    }

    #[test]
    fn test_net_pnl_subtracts_fees() {
        let trade = Trade {
            id: "t1".to_string(),
            date: "2024-03-01".to_string(),
            time: "10:15".to_string(),
            asset: "AAPL".to_string(),
            direction: TradeDirection::Long,
            entry_price: 150.0,
            exit_price: Some(155.0),
            position_size: 10.0,
            strategy: String::new(),
            reasoning: String::new(),
            market_conditions: String::new(),
            tags: vec![],
            screenshots: None,
            is_open: false,
            pnl: Some(50.0),
            fees: Some(2.0),
            emotional_state: None,
            created_at: Utc::now(),
        };
        assert_eq!(trade.net_pnl(), Some(48.0));
    }

    #[test]
    fn test_net_pnl_none_while_open() {
        let mut trade = Trade {
            id: "t1".to_string(),
            date: "2024-03-01".to_string(),
            time: "10:15".to_string(),
            asset: "AAPL".to_string(),
            direction: TradeDirection::Long,
            entry_price: 150.0,
            exit_price: None,
            position_size: 10.0,
            strategy: String::new(),
            reasoning: String::new(),
            market_conditions: String::new(),
            tags: vec![],
            screenshots: None,
            is_open: true,
            pnl: Some(50.0),
            fees: None,
            emotional_state: None,
            created_at: Utc::now(),
        };
        assert_eq!(trade.net_pnl(), None);
        trade.is_open = false;
        assert_eq!(trade.net_pnl(), Some(50.0));
    }

    #[test]
    fn test_direction_round_trip() {
        assert_eq!("long".parse::<TradeDirection>().unwrap(), TradeDirection::Long);
        assert_eq!("short".parse::<TradeDirection>().unwrap(), TradeDirection::Short);
        assert!("sideways".parse::<TradeDirection>().is_err());
        assert_eq!(TradeDirection::Long.as_str(), "long");
    }
}
