/// Server and provider configuration for the journal
#[derive(Clone)]
pub struct JournalConfig {
    /// Port the HTTP API listens on
    pub port: u16,
    /// Global request budget per minute
    pub requests_per_minute: u32,
    /// Base URL of the hosted auth provider (GoTrue-style REST surface)
    pub auth_base_url: String,
    /// Public API key sent with every auth provider request
    pub auth_api_key: String,
    /// Minimum password length enforced before calling the provider
    pub min_password_length: usize,
    /// Broadcast capacity for the change-event channel
    pub event_channel_capacity: usize,
}

impl JournalConfig {
    pub fn default() -> JournalConfig {
        JournalConfig {
            port: 3000,
            requests_per_minute: 120,
            auth_base_url: "http://localhost:9999".to_string(),
            auth_api_key: String::new(),
            min_password_length: 6,
            event_channel_capacity: 64,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> JournalConfig {
        let mut config = JournalConfig::default();

        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(value) if value > 0 => config.port = value,
                Ok(value) => {
                    tracing::warn!("Invalid PORT value: {}, using default: {}", value, config.port);
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse PORT '{}': {}, using default: {}",
                        port,
                        e,
                        config.port
                    );
                }
            }
        }

        if let Ok(rpm) = std::env::var("REQUESTS_PER_MINUTE") {
            if let Ok(value) = rpm.parse::<u32>() {
                if value > 0 && value <= 10_000 {
                    config.requests_per_minute = value;
                } else {
                    tracing::warn!(
                        "REQUESTS_PER_MINUTE out of range: {}, using default: {}",
                        value,
                        config.requests_per_minute
                    );
                }
            }
        }

        if let Ok(url) = std::env::var("AUTH_BASE_URL") {
            if !url.trim().is_empty() {
                config.auth_base_url = url;
            }
        }

        if let Ok(key) = std::env::var("AUTH_API_KEY") {
            config.auth_api_key = key;
        }

        if let Ok(len) = std::env::var("MIN_PASSWORD_LENGTH") {
            if let Ok(value) = len.parse::<usize>() {
                if (6..=128).contains(&value) {
                    config.min_password_length = value;
                }
            }
        }

        if let Ok(capacity) = std::env::var("EVENT_CHANNEL_CAPACITY") {
            if let Ok(value) = capacity.parse::<usize>() {
                if value > 0 && value <= 4096 {
                    config.event_channel_capacity = value;
                }
            }
        }

        config
    }
}
