use serde::{Deserialize, Serialize};

/// Notification toggles stored as a JSON blob on the settings row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPrefs {
    pub daily_loss_limit: bool,
    pub goal_progress: bool,
    pub trade_reminders: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            daily_loss_limit: true,
            goal_progress: true,
            trade_reminders: false,
        }
    }
}

/// Risk-management defaults applied when entering trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskManagementPrefs {
    pub max_daily_loss: f64,
    pub max_daily_loss_percentage: f64,
    pub max_position_size: f64,
    pub max_position_size_percentage: f64,
    pub risk_reward_ratio: f64,
    pub stop_loss_required: bool,
    pub take_profit_required: bool,
}

impl Default for RiskManagementPrefs {
    fn default() -> Self {
        Self {
            max_daily_loss: 500.0,
            max_daily_loss_percentage: 5.0,
            max_position_size: 1_000.0,
            max_position_size_percentage: 10.0,
            risk_reward_ratio: 2.0,
            stop_loss_required: false,
            take_profit_required: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingHours {
    pub start: String,
    pub end: String,
    pub timezone: String,
}

impl Default for TradingHours {
    fn default() -> Self {
        Self {
            start: "09:30".to_string(),
            end: "16:00".to_string(),
            timezone: "America/New_York".to_string(),
        }
    }
}

/// Per-user preferences, one row per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub theme: String,
    pub currency: String,
    pub timezone: String,
    pub date_format: String,
    pub notifications: NotificationPrefs,
    pub risk_management: RiskManagementPrefs,
    pub trading_hours: TradingHours,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            currency: "USD".to_string(),
            timezone: "America/New_York".to_string(),
            date_format: "MM/DD/YYYY".to_string(),
            notifications: NotificationPrefs::default(),
            risk_management: RiskManagementPrefs::default(),
            trading_hours: TradingHours::default(),
        }
    }
}

/// Partial update for user settings; nested blobs are replaced whole,
/// matching how the UI submits them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsUpdate {
    pub theme: Option<String>,
    pub currency: Option<String>,
    pub timezone: Option<String>,
    pub date_format: Option<String>,
    pub notifications: Option<NotificationPrefs>,
    pub risk_management: Option<RiskManagementPrefs>,
    pub trading_hours: Option<TradingHours>,
}

impl UserSettingsUpdate {
    pub fn merge_into(&self, settings: &mut UserSettings) {
        if let Some(v) = &self.theme {
            settings.theme = v.clone();
        }
        if let Some(v) = &self.currency {
            settings.currency = v.clone();
        }
        if let Some(v) = &self.timezone {
            settings.timezone = v.clone();
        }
        if let Some(v) = &self.date_format {
            settings.date_format = v.clone();
        }
        if let Some(v) = &self.notifications {
            settings.notifications = v.clone();
        }
        if let Some(v) = &self.risk_management {
            settings.risk_management = v.clone();
        }
        if let Some(v) = &self.trading_hours {
            settings.trading_hours = v.clone();
        }
    }
}
