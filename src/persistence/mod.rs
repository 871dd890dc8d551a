//! Persistence Layer
//!
//! SQLite-backed storage for the journal, accessed asynchronously via sqlx.
//! Every table carries a `user_id` column and every query is scoped to it;
//! rows for different users never mix.
//!
//! # Tables
//! - trades: one row per journal entry
//! - portfolio_settings: one row per user (capital and risk limits)
//! - transactions: deposits and withdrawals
//! - goals: measurable trading goals
//! - assets: the user's watchlist
//! - user_settings: preferences (theme, notifications, trading hours)

pub mod models;
pub mod repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Database connection pool
pub type DbPool = SqlitePool;

/// Database initialization error
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),
}

/// Initialize a pool with default settings and run migrations.
///
/// # Arguments
/// - `database_url`: Path to SQLite database file (e.g., "sqlite://data/tradebook.db")
pub async fn init_database(database_url: &str) -> Result<DbPool, DatabaseError> {
    DatabaseConfig {
        url: database_url.to_string(),
        ..Default::default()
    }
    .connect()
    .await
}

/// Run database migrations
async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trades (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            asset TEXT NOT NULL,
            direction TEXT NOT NULL CHECK(direction IN ('long', 'short')),
            entry_price REAL NOT NULL,
            exit_price REAL,
            position_size REAL NOT NULL,
            strategy TEXT NOT NULL DEFAULT '',
            reasoning TEXT NOT NULL DEFAULT '',
            market_conditions TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '[]',
            screenshots TEXT,
            is_open BOOLEAN NOT NULL,
            pnl REAL,
            fees REAL,
            emotional_state TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create trades table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS portfolio_settings (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            initial_capital REAL NOT NULL,
            current_balance REAL NOT NULL,
            max_daily_loss REAL NOT NULL,
            max_daily_loss_percentage REAL NOT NULL,
            max_position_size REAL NOT NULL,
            max_position_size_percentage REAL NOT NULL,
            risk_reward_ratio REAL NOT NULL,
            currency TEXT NOT NULL,
            timezone TEXT NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create portfolio_settings table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            amount REAL NOT NULL CHECK(amount > 0),
            kind TEXT NOT NULL CHECK(kind IN ('deposit', 'withdrawal')),
            description TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create transactions table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS goals (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            goal_type TEXT NOT NULL,
            target REAL NOT NULL,
            current REAL NOT NULL DEFAULT 0.0,
            deadline TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            is_active BOOLEAN NOT NULL,
            priority TEXT NOT NULL CHECK(priority IN ('low', 'medium', 'high')),
            category TEXT NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create goals table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assets (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            symbol TEXT NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            exchange TEXT,
            sector TEXT,
            is_active BOOLEAN NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create assets table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_settings (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            theme TEXT NOT NULL,
            currency TEXT NOT NULL,
            timezone TEXT NOT NULL,
            date_format TEXT NOT NULL,
            notifications TEXT NOT NULL,
            risk_management TEXT NOT NULL,
            trading_hours TEXT NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create user_settings table: {}", e))
    })?;

    // Indexes for the per-user list queries
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_trades_user ON trades(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_trades_user_date ON trades(user_id, date)",
        "CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_assets_user ON assets(user_id, created_at)",
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;
    }

    info!("Database migrations completed successfully");

    Ok(())
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://data/tradebook.db")
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Enable query logging
    pub log_queries: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/tradebook.db".to_string(),
            max_connections: 5,
            log_queries: cfg!(debug_assertions),
        }
    }
}

impl DatabaseConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/tradebook.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let log_queries = std::env::var("DATABASE_LOG_QUERIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(cfg!(debug_assertions));

        Self {
            url,
            max_connections,
            log_queries,
        }
    }

    /// Open the pool described by this configuration and run migrations.
    pub async fn connect(&self) -> Result<DbPool, DatabaseError> {
        info!("Initializing database: {}", self.url);

        // Ensure data directory exists
        if let Some(db_path) = self.url.strip_prefix("sqlite://") {
            if let Some(parent) = Path::new(db_path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
                })?;
            }
        }

        let statement_level = if self.log_queries {
            tracing::log::LevelFilter::Debug
        } else {
            tracing::log::LevelFilter::Off
        };
        let options = SqliteConnectOptions::from_str(&self.url)?
            .create_if_missing(true)
            .log_statements(statement_level);

        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        info!("Database initialized successfully");

        Ok(pool)
    }
}
