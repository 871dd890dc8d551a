//! End-to-end tests for the journal service against an in-memory database.
//!
//! These exercise the full path the API handlers take: validation, row
//! mapping, the balance coupling between closed trades / transactions and
//! portfolio settings, and the change-event fan-out.

use tradebook::application::events::DataEvent;
use tradebook::application::services::journal_service::JournalService;
use tradebook::domain::entities::asset::{AssetDraft, AssetUpdate};
use tradebook::domain::entities::goal::{GoalDraft, GoalPriority, GoalUpdate};
use tradebook::domain::entities::portfolio::{
    PortfolioUpdate, TransactionDraft, TransactionKind,
};
use tradebook::domain::entities::trade::{TradeDirection, TradeDraft, TradeUpdate};
use tradebook::domain::entities::user_settings::{TradingHours, UserSettingsUpdate};
use tradebook::domain::errors::JournalError;
use tradebook::persistence::init_database;

async fn service() -> JournalService {
    let pool = init_database("sqlite::memory:").await.unwrap();
    JournalService::new(pool, 32)
}

fn open_trade(asset: &str, date: &str) -> TradeDraft {
    TradeDraft {
        date: date.to_string(),
        time: "10:30".to_string(),
        asset: asset.to_string(),
        direction: TradeDirection::Long,
        entry_price: 100.0,
        exit_price: None,
        position_size: 5.0,
        strategy: "trend following".to_string(),
        reasoning: "higher low on the daily".to_string(),
        market_conditions: "uptrend".to_string(),
        tags: vec!["swing".to_string()],
        screenshots: None,
        is_open: true,
        pnl: None,
        fees: None,
        emotional_state: Some("calm".to_string()),
    }
}

fn deposit(amount: f64) -> TransactionDraft {
    TransactionDraft {
        date: "2024-03-01".to_string(),
        amount,
        kind: TransactionKind::Deposit,
        description: None,
    }
}

#[tokio::test]
async fn trade_lifecycle_updates_balance_exactly_once() {
    let service = service().await;
    let user = "user-1";

    let trade = service.add_trade(user, open_trade("AAPL", "2024-03-01")).await.unwrap();
    assert!(trade.is_open);
    assert_eq!(trade.net_pnl(), None);

    // Opening a trade does not touch the balance
    let portfolio = service.portfolio(user).await.unwrap();
    assert_eq!(portfolio.current_balance, 10_000.0);

    // Closing applies net pnl (gross minus fees)
    let closed = service
        .update_trade(
            user,
            &trade.id,
            TradeUpdate {
                exit_price: Some(150.0),
                is_open: Some(false),
                pnl: Some(250.0),
                fees: Some(10.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!closed.is_open);
    assert_eq!(closed.net_pnl(), Some(240.0));

    let portfolio = service.portfolio(user).await.unwrap();
    assert_eq!(portfolio.current_balance, 10_240.0);

    // Later edits to the closed trade leave the balance alone
    service
        .update_trade(
            user,
            &trade.id,
            TradeUpdate {
                tags: Some(vec!["swing".to_string(), "reviewed".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let portfolio = service.portfolio(user).await.unwrap();
    assert_eq!(portfolio.current_balance, 10_240.0);
}

#[tokio::test]
async fn closing_without_explicit_pnl_derives_it_from_the_fill() {
    let service = service().await;
    let user = "user-1";
    let trade = service.add_trade(user, open_trade("AAPL", "2024-03-01")).await.unwrap();

    // Long 5 units, entry 100, exit 110: gross 50, net 48 after fees
    let closed = service
        .update_trade(
            user,
            &trade.id,
            TradeUpdate {
                exit_price: Some(110.0),
                is_open: Some(false),
                fees: Some(2.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(closed.pnl, Some(50.0));
    assert_eq!(closed.net_pnl(), Some(48.0));

    let portfolio = service.portfolio(user).await.unwrap();
    assert_eq!(portfolio.current_balance, 10_048.0);
}

#[tokio::test]
async fn trade_recorded_closed_applies_pnl_immediately() {
    let service = service().await;
    let mut draft = open_trade("EURUSD", "2024-03-02");
    draft.is_open = false;
    draft.exit_price = Some(90.0);
    draft.pnl = Some(-100.0);
    draft.fees = Some(5.0);

    service.add_trade("user-1", draft).await.unwrap();

    let portfolio = service.portfolio("user-1").await.unwrap();
    assert_eq!(portfolio.current_balance, 10_000.0 - 105.0);
}

#[tokio::test]
async fn closed_trade_validation_requires_exit_price() {
    let service = service().await;
    let mut draft = open_trade("AAPL", "2024-03-01");
    draft.is_open = false;

    let result = service.add_trade("user-1", draft).await;
    assert!(matches!(result, Err(JournalError::Validation(_))));
}

#[tokio::test]
async fn closing_an_existing_trade_requires_an_exit_price() {
    let service = service().await;
    let user = "user-1";
    let trade = service.add_trade(user, open_trade("AAPL", "2024-03-01")).await.unwrap();

    // Marking it closed without an exit price must fail
    let result = service
        .update_trade(
            user,
            &trade.id,
            TradeUpdate {
                is_open: Some(false),
                pnl: Some(25.0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(JournalError::Validation(_))));

    // The trade stays open and the balance is untouched
    let trades = service.list_trades(user).await.unwrap();
    assert!(trades[0].is_open);
    assert!(trades[0].exit_price.is_none());
    let portfolio = service.portfolio(user).await.unwrap();
    assert_eq!(portfolio.current_balance, 10_000.0);
}

#[tokio::test]
async fn deposits_and_withdrawals_move_balance_and_split() {
    let service = service().await;
    let user = "user-1";

    service.add_transaction(user, deposit(2_000.0)).await.unwrap();
    service
        .add_transaction(
            user,
            TransactionDraft {
                date: "2024-03-05".to_string(),
                amount: 500.0,
                kind: TransactionKind::Withdrawal,
                description: Some("rent".to_string()),
            },
        )
        .await
        .unwrap();

    let portfolio = service.portfolio(user).await.unwrap();
    assert_eq!(portfolio.current_balance, 11_500.0);
    assert_eq!(portfolio.deposits.len(), 1);
    assert_eq!(portfolio.deposits[0].amount, 2_000.0);
    assert_eq!(portfolio.withdrawals.len(), 1);
    assert_eq!(portfolio.withdrawals[0].description.as_deref(), Some("rent"));
}

#[tokio::test]
async fn zero_amount_transaction_is_rejected() {
    let service = service().await;
    let result = service.add_transaction("user-1", deposit(0.0)).await;
    assert!(matches!(result, Err(JournalError::Validation(_))));
}

#[tokio::test]
async fn portfolio_partial_update_keeps_other_fields() {
    let service = service().await;
    let user = "user-1";

    let updated = service
        .update_portfolio(
            user,
            PortfolioUpdate {
                max_daily_loss: Some(750.0),
                currency: Some("EUR".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.max_daily_loss, 750.0);
    assert_eq!(updated.currency, "EUR");
    assert_eq!(updated.initial_capital, 10_000.0);
    assert_eq!(updated.risk_reward_ratio, 2.0);
}

#[tokio::test]
async fn goal_crud_and_progress() {
    let service = service().await;
    let user = "user-1";

    let goal = service
        .add_goal(
            user,
            GoalDraft {
                goal_type: "profit".to_string(),
                target: 1_000.0,
                current: 0.0,
                deadline: "2024-12-31".to_string(),
                description: "first thousand".to_string(),
                is_active: true,
                priority: GoalPriority::High,
                category: "performance".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(goal.progress_percent(), 0.0);

    let goal = service
        .update_goal(
            user,
            &goal.id,
            GoalUpdate {
                current: Some(400.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(goal.progress_percent(), 40.0);
    assert_eq!(goal.priority, GoalPriority::High);

    service.delete_goal(user, &goal.id).await.unwrap();
    assert!(service.list_goals(user).await.unwrap().is_empty());

    let result = service.delete_goal(user, &goal.id).await;
    assert!(matches!(result, Err(JournalError::NotFound { .. })));
}

#[tokio::test]
async fn asset_watchlist_crud() {
    let service = service().await;
    let user = "user-1";

    let asset = service
        .add_asset(
            user,
            AssetDraft {
                symbol: "BTCUSD".to_string(),
                name: "Bitcoin".to_string(),
                category: "crypto".to_string(),
                exchange: None,
                sector: None,
                is_active: true,
            },
        )
        .await
        .unwrap();

    let asset = service
        .update_asset(
            user,
            &asset.id,
            AssetUpdate {
                is_active: Some(false),
                exchange: Some("Coinbase".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!asset.is_active);
    assert_eq!(asset.exchange.as_deref(), Some("Coinbase"));
    assert_eq!(asset.symbol, "BTCUSD");

    service.delete_asset(user, &asset.id).await.unwrap();
    assert!(service.list_assets(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn user_settings_default_then_persist() {
    let service = service().await;
    let user = "user-1";

    let settings = service.user_settings(user).await.unwrap();
    assert_eq!(settings.theme, "light");
    assert_eq!(settings.trading_hours.start, "09:30");

    let updated = service
        .update_user_settings(
            user,
            UserSettingsUpdate {
                theme: Some("dark".to_string()),
                trading_hours: Some(TradingHours {
                    start: "08:00".to_string(),
                    end: "17:00".to_string(),
                    timezone: "Europe/London".to_string(),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.theme, "dark");

    // Round trip through the stored row
    let reloaded = service.user_settings(user).await.unwrap();
    assert_eq!(reloaded.theme, "dark");
    assert_eq!(reloaded.trading_hours.timezone, "Europe/London");
    assert_eq!(reloaded.currency, "USD");
}

#[tokio::test]
async fn metrics_reflect_closed_trades_and_capital() {
    let service = service().await;
    let user = "user-1";

    let mut winner = open_trade("AAPL", "2024-03-01");
    winner.is_open = false;
    winner.exit_price = Some(120.0);
    winner.pnl = Some(100.0);
    winner.fees = Some(0.0);
    service.add_trade(user, winner).await.unwrap();

    let mut loser = open_trade("TSLA", "2024-03-01");
    loser.is_open = false;
    loser.exit_price = Some(80.0);
    loser.pnl = Some(-600.0);
    loser.fees = Some(0.0);
    service.add_trade(user, loser).await.unwrap();

    service.add_transaction(user, deposit(1_000.0)).await.unwrap();

    let metrics = service
        .metrics(user, Some("2024-03-01".to_string()), None)
        .await
        .unwrap();
    assert_eq!(metrics.stats.closed_trades, 2);
    assert_eq!(metrics.stats.winning_trades, 1);
    assert_eq!(metrics.stats.total_net_pnl, -500.0);
    // 10_000 initial + 1_000 deposited - 500 realized
    assert_eq!(metrics.account_equity, 10_500.0);
    assert_eq!(metrics.risk.daily_net_pnl, -500.0);
    assert!(metrics.risk.daily_loss_limit_breached);
}

#[tokio::test]
async fn metrics_flag_oversized_positions() {
    let service = service().await;
    let user = "user-1";

    // Default limits: 1 000 absolute and 10% of the 10 000 balance
    let metrics = service.metrics(user, None, Some(1_500.0)).await.unwrap();
    assert_eq!(metrics.position_size_violations.len(), 2);

    let metrics = service.metrics(user, None, Some(900.0)).await.unwrap();
    assert!(metrics.position_size_violations.is_empty());

    // No proposed size, nothing to flag
    let metrics = service.metrics(user, None, None).await.unwrap();
    assert!(metrics.position_size_violations.is_empty());
}

#[tokio::test]
async fn export_snapshot_contains_all_collections() {
    let service = service().await;
    let user = "user-1";

    service.add_trade(user, open_trade("AAPL", "2024-03-01")).await.unwrap();
    service.add_transaction(user, deposit(100.0)).await.unwrap();

    let snapshot = service.export(user).await.unwrap();
    assert_eq!(snapshot["trades"].as_array().unwrap().len(), 1);
    assert!(snapshot["portfolio"]["currentBalance"].is_number());
    assert!(snapshot["goals"].as_array().unwrap().is_empty());
    assert!(snapshot["assets"].as_array().unwrap().is_empty());
    assert_eq!(snapshot["userSettings"]["theme"], "light");
    assert!(snapshot["exportDate"].is_string());
}

#[tokio::test]
async fn events_announce_each_changed_collection() {
    let service = service().await;
    let mut events = service.subscribe();

    service.add_transaction("user-1", deposit(50.0)).await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event, DataEvent::PortfolioChanged("user-1".to_string()));
    assert_eq!(event.user_id(), "user-1");
}

#[tokio::test]
async fn rows_never_leak_across_users() {
    let service = service().await;

    let trade = service
        .add_trade("user-a", open_trade("AAPL", "2024-03-01"))
        .await
        .unwrap();
    service.add_transaction("user-a", deposit(5_000.0)).await.unwrap();

    assert!(service.list_trades("user-b").await.unwrap().is_empty());
    let portfolio_b = service.portfolio("user-b").await.unwrap();
    assert_eq!(portfolio_b.current_balance, 10_000.0);
    assert!(portfolio_b.deposits.is_empty());

    // Another user cannot modify or delete the trade
    let result = service
        .update_trade(
            "user-b",
            &trade.id,
            TradeUpdate {
                is_open: Some(false),
                exit_price: Some(1.0),
                pnl: Some(999.0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(JournalError::NotFound { .. })));
    assert!(service.delete_trade("user-b", &trade.id).await.is_err());

    // Owner still sees it untouched
    let trades = service.list_trades("user-a").await.unwrap();
    assert_eq!(trades.len(), 1);
    assert!(trades[0].is_open);
}
