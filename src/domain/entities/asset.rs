use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;

/// A watchlist entry: an instrument the user trades or follows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDraft {
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub is_active: bool,
}

impl AssetDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::InvalidSymbol(
                "symbol is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUpdate {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub is_active: Option<bool>,
}

impl AssetUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(symbol) = &self.symbol {
            if symbol.trim().is_empty() {
                return Err(ValidationError::InvalidSymbol(
                    "symbol is empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_requires_symbol() {
        let draft = AssetDraft {
            symbol: "  ".to_string(),
            name: "Apple".to_string(),
            category: "stocks".to_string(),
            exchange: Some("NASDAQ".to_string()),
            sector: Some("Technology".to_string()),
            is_active: true,
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_update_allows_empty_patch() {
        assert!(AssetUpdate::default().validate().is_ok());
    }
}
