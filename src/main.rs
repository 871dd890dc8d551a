use axum::{
    extract::{Extension, Path, Query, State},
    http::HeaderMap,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradebook::application::services::journal_service::{JournalService, MetricsSummary};
use tradebook::auth::{init_session_secret, require_session, AuthUser};
use tradebook::config::JournalConfig;
use tradebook::domain::entities::asset::{Asset, AssetDraft, AssetUpdate};
use tradebook::domain::entities::goal::{Goal, GoalDraft, GoalUpdate};
use tradebook::domain::entities::portfolio::{
    PortfolioSettings, PortfolioUpdate, Transaction, TransactionDraft,
};
use tradebook::domain::entities::trade::{Trade, TradeDraft, TradeUpdate};
use tradebook::domain::entities::user_settings::{UserSettings, UserSettingsUpdate};
use tradebook::domain::errors::ApiError;
use tradebook::infrastructure::auth_provider::{
    AuthProvider, HostedAuthClient, ProviderUser, Session,
};
use tradebook::persistence::{DatabaseConfig, DbPool};
use tradebook::rate_limit::{create_rate_limiter, rate_limit_middleware};

#[derive(Clone)]
struct AppState {
    service: Arc<JournalService>,
    auth: Arc<dyn AuthProvider>,
    config: JournalConfig,
    pool: DbPool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradebook=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Trading journal server starting...");

    // Session token verification is mandatory; this panics without a secret
    init_session_secret();

    let config = JournalConfig::from_env();
    let db_config = DatabaseConfig::from_env();
    let pool = db_config.connect().await?;

    let service = Arc::new(JournalService::new(
        pool.clone(),
        config.event_channel_capacity,
    ));
    let auth: Arc<dyn AuthProvider> = Arc::new(HostedAuthClient::new(
        config.auth_base_url.clone(),
        config.auth_api_key.clone(),
    ));

    let state = AppState {
        service,
        auth,
        config: config.clone(),
        pool,
    };

    let limiter = create_rate_limiter(config.requests_per_minute);

    let protected = Router::new()
        .route("/trades", get(list_trades).post(add_trade))
        .route("/trades/:id", patch(update_trade).delete(delete_trade))
        .route("/portfolio", get(get_portfolio).put(update_portfolio))
        .route("/transactions", post(add_transaction))
        .route("/goals", get(list_goals).post(add_goal))
        .route("/goals/:id", patch(update_goal).delete(delete_goal))
        .route("/assets", get(list_assets).post(add_asset))
        .route("/assets/:id", patch(update_asset).delete(delete_asset))
        .route("/settings", get(get_user_settings).put(update_user_settings))
        .route("/metrics", get(get_metrics))
        .route("/export", get(export_data))
        .route("/import", post(import_data))
        .layer(middleware::from_fn(require_session))
        .layer(middleware::from_fn(move |request, next| {
            rate_limit_middleware(limiter.clone(), request, next)
        }));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
        .route("/auth/reset-password", post(reset_password))
        .nest("/api", protected)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app);

    let shutdown_signal = async {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    info!("Server started successfully. Press Ctrl+C to stop.");
    server.with_graceful_shutdown(shutdown_signal).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    Json(serde_json::json!({
        "status": "running",
        "database": database_ok,
    }))
}

// ---- Auth proxy ----

#[derive(Debug, Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct EmailOnly {
    email: String,
}

async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<ProviderUser>, ApiError> {
    if !body.email.contains('@') {
        return Err(ApiError::InvalidRequest("invalid email address".to_string()));
    }
    if body.password.len() < state.config.min_password_length {
        return Err(ApiError::InvalidRequest(format!(
            "password must be at least {} characters",
            state.config.min_password_length
        )));
    }

    let user = state.auth.sign_up(&body.email, &body.password).await?;
    Ok(Json(user))
}

async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<Session>, ApiError> {
    let session = state.auth.sign_in(&body.email, &body.password).await?;
    Ok(Json(session))
}

async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    state.auth.sign_out(token).await?;
    Ok(Json(serde_json::json!({ "signed_out": true })))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<EmailOnly>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.auth.reset_password(&body.email).await?;
    // Same answer whether or not the account exists
    Ok(Json(serde_json::json!({ "recovery_sent": true })))
}

// ---- Trades ----

async fn list_trades(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Trade>>, ApiError> {
    Ok(Json(state.service.list_trades(&user.id).await?))
}

async fn add_trade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(draft): Json<TradeDraft>,
) -> Result<Json<Trade>, ApiError> {
    Ok(Json(state.service.add_trade(&user.id, draft).await?))
}

async fn update_trade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(update): Json<TradeUpdate>,
) -> Result<Json<Trade>, ApiError> {
    Ok(Json(state.service.update_trade(&user.id, &id, update).await?))
}

async fn delete_trade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.service.delete_trade(&user.id, &id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

// ---- Portfolio ----

async fn get_portfolio(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PortfolioSettings>, ApiError> {
    Ok(Json(state.service.portfolio(&user.id).await?))
}

async fn update_portfolio(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<PortfolioUpdate>,
) -> Result<Json<PortfolioSettings>, ApiError> {
    Ok(Json(state.service.update_portfolio(&user.id, update).await?))
}

async fn add_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(draft): Json<TransactionDraft>,
) -> Result<Json<Transaction>, ApiError> {
    Ok(Json(state.service.add_transaction(&user.id, draft).await?))
}

// ---- Goals ----

async fn list_goals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Goal>>, ApiError> {
    Ok(Json(state.service.list_goals(&user.id).await?))
}

async fn add_goal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(draft): Json<GoalDraft>,
) -> Result<Json<Goal>, ApiError> {
    Ok(Json(state.service.add_goal(&user.id, draft).await?))
}

async fn update_goal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(update): Json<GoalUpdate>,
) -> Result<Json<Goal>, ApiError> {
    Ok(Json(state.service.update_goal(&user.id, &id, update).await?))
}

async fn delete_goal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.service.delete_goal(&user.id, &id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

// ---- Assets ----

async fn list_assets(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Asset>>, ApiError> {
    Ok(Json(state.service.list_assets(&user.id).await?))
}

async fn add_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(draft): Json<AssetDraft>,
) -> Result<Json<Asset>, ApiError> {
    Ok(Json(state.service.add_asset(&user.id, draft).await?))
}

async fn update_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(update): Json<AssetUpdate>,
) -> Result<Json<Asset>, ApiError> {
    Ok(Json(state.service.update_asset(&user.id, &id, update).await?))
}

async fn delete_asset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.service.delete_asset(&user.id, &id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

// ---- User settings ----

async fn get_user_settings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserSettings>, ApiError> {
    Ok(Json(state.service.user_settings(&user.id).await?))
}

async fn update_user_settings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<UserSettingsUpdate>,
) -> Result<Json<UserSettings>, ApiError> {
    Ok(Json(
        state.service.update_user_settings(&user.id, update).await?,
    ))
}

// ---- Metrics and export ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricsQuery {
    /// Day to evaluate risk limits against (YYYY-MM-DD), defaults to today
    day: Option<String>,
    /// Position size to check against the portfolio limits
    proposed_size: Option<f64>,
}

async fn get_metrics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<MetricsSummary>, ApiError> {
    Ok(Json(
        state
            .service
            .metrics(&user.id, query.day, query.proposed_size)
            .await?,
    ))
}

async fn export_data(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(state.service.export(&user.id).await?))
}

async fn import_data() -> Result<Json<serde_json::Value>, ApiError> {
    Err(ApiError::NotImplemented(
        "snapshot import is not supported yet".to_string(),
    ))
}
