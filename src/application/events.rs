//! Change-event fan-out
//!
//! Every successful mutation publishes an event naming the collection that
//! changed and the owning user. Delivery is best-effort broadcast: slow
//! subscribers lag and miss events rather than block writers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "userId", rename_all = "camelCase")]
pub enum DataEvent {
    TradesChanged(String),
    PortfolioChanged(String),
    GoalsChanged(String),
    AssetsChanged(String),
    SettingsChanged(String),
}

impl DataEvent {
    pub fn user_id(&self) -> &str {
        match self {
            DataEvent::TradesChanged(user_id)
            | DataEvent::PortfolioChanged(user_id)
            | DataEvent::GoalsChanged(user_id)
            | DataEvent::AssetsChanged(user_id)
            | DataEvent::SettingsChanged(user_id) => user_id,
        }
    }
}
