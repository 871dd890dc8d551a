//! Derived journal metrics
//!
//! Everything here is pure arithmetic over stored trades and portfolio
//! settings: realized P&L aggregates, account equity, and risk-limit checks.
//! Only closed trades with a recorded pnl count toward the aggregates.

use serde::{Deserialize, Serialize};

use crate::domain::entities::portfolio::{PortfolioSettings, Transaction};
use crate::domain::entities::trade::Trade;

/// Aggregate statistics over a user's closed trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeStats {
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Sum of net pnl (gross minus fees) over closed trades
    pub total_net_pnl: f64,
    /// Fraction of closed trades with positive net pnl, 0.0 when none closed
    pub win_rate: f64,
    /// Gross wins divided by gross losses; None when there are no losses
    pub profit_factor: Option<f64>,
    pub average_win: f64,
    pub average_loss: f64,
}

/// Result of evaluating portfolio risk limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskStatus {
    /// Net realized pnl of trades dated today
    pub daily_net_pnl: f64,
    /// True when today's realized loss breaches the absolute daily limit
    pub daily_loss_limit_breached: bool,
    /// True when today's realized loss breaches the percentage-of-balance limit
    pub daily_loss_percentage_breached: bool,
}

/// Compute aggregate stats from a slice of trades.
pub fn compute_stats(trades: &[Trade]) -> TradeStats {
    let mut closed = 0usize;
    let mut wins = 0usize;
    let mut losses = 0usize;
    let mut total = 0.0f64;
    let mut win_sum = 0.0f64;
    let mut loss_sum = 0.0f64;

    for trade in trades {
        let Some(net) = trade.net_pnl() else {
            continue;
        };
        closed += 1;
        total += net;
        if net > 0.0 {
            wins += 1;
            win_sum += net;
        } else if net < 0.0 {
            losses += 1;
            loss_sum += net.abs();
        }
    }

    TradeStats {
        closed_trades: closed,
        winning_trades: wins,
        losing_trades: losses,
        total_net_pnl: total,
        win_rate: if closed > 0 {
            wins as f64 / closed as f64
        } else {
            0.0
        },
        profit_factor: if loss_sum > 0.0 {
            Some(win_sum / loss_sum)
        } else {
            None
        },
        average_win: if wins > 0 { win_sum / wins as f64 } else { 0.0 },
        average_loss: if losses > 0 {
            loss_sum / losses as f64
        } else {
            0.0
        },
    }
}

/// Account equity: starting capital plus capital movements plus realized P&L.
pub fn account_equity(
    initial_capital: f64,
    deposits: &[Transaction],
    withdrawals: &[Transaction],
    net_realized_pnl: f64,
) -> f64 {
    let deposited: f64 = deposits.iter().map(|t| t.amount).sum();
    let withdrawn: f64 = withdrawals.iter().map(|t| t.amount).sum();
    initial_capital + deposited - withdrawn + net_realized_pnl
}

/// Net realized pnl of closed trades dated `day` (YYYY-MM-DD).
pub fn daily_net_pnl(trades: &[Trade], day: &str) -> f64 {
    trades
        .iter()
        .filter(|t| t.date == day)
        .filter_map(|t| t.net_pnl())
        .sum()
}

/// Evaluate daily-loss limits for the given day.
pub fn check_risk(trades: &[Trade], settings: &PortfolioSettings, day: &str) -> RiskStatus {
    let daily = daily_net_pnl(trades, day);
    let loss = (-daily).max(0.0);

    let absolute_breached = settings.max_daily_loss > 0.0 && loss >= settings.max_daily_loss;
    let percentage_breached = settings.max_daily_loss_percentage > 0.0
        && settings.current_balance > 0.0
        && loss >= settings.current_balance * settings.max_daily_loss_percentage / 100.0;

    RiskStatus {
        daily_net_pnl: daily,
        daily_loss_limit_breached: absolute_breached,
        daily_loss_percentage_breached: percentage_breached,
    }
}

/// Check a proposed position size against the portfolio limits.
///
/// Returns the reasons the size is disallowed; empty means it fits.
pub fn position_size_violations(
    settings: &PortfolioSettings,
    proposed_size: f64,
) -> Vec<String> {
    let mut violations = Vec::new();

    if settings.max_position_size > 0.0 && proposed_size > settings.max_position_size {
        violations.push(format!(
            "position size {:.2} exceeds maximum {:.2}",
            proposed_size, settings.max_position_size
        ));
    }

    if settings.max_position_size_percentage > 0.0 && settings.current_balance > 0.0 {
        let cap = settings.current_balance * settings.max_position_size_percentage / 100.0;
        if proposed_size > cap {
            violations.push(format!(
                "position size {:.2} exceeds {:.1}% of balance ({:.2})",
                proposed_size, settings.max_position_size_percentage, cap
            ));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::portfolio::TransactionKind;
    use crate::domain::entities::trade::TradeDirection;
    use chrono::Utc;

    fn closed_trade(date: &str, pnl: f64, fees: f64) -> Trade {
        Trade {
            id: uuid::Uuid::new_v4().to_string(),
            date: date.to_string(),
            time: "10:00".to_string(),
            asset: "AAPL".to_string(),
            direction: TradeDirection::Long,
            entry_price: 100.0,
            exit_price: Some(110.0),
            position_size: 10.0,
            strategy: String::new(),
            reasoning: String::new(),
            market_conditions: String::new(),
            tags: vec![],
            screenshots: None,
            is_open: false,
            pnl: Some(pnl),
            fees: Some(fees),
            emotional_state: None,
            created_at: Utc::now(),
        }
    }

    fn open_trade(date: &str) -> Trade {
        let mut t = closed_trade(date, 0.0, 0.0);
        t.is_open = true;
        t.exit_price = None;
        t.pnl = None;
        t
    }

    fn transaction(amount: f64, kind: TransactionKind) -> Transaction {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            date: "2024-03-01".to_string(),
            amount,
            kind,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_stats_ignore_open_trades() {
        let trades = vec![
            closed_trade("2024-03-01", 100.0, 5.0),
            closed_trade("2024-03-01", -50.0, 5.0),
            open_trade("2024-03-01"),
        ];
        let stats = compute_stats(&trades);
        assert_eq!(stats.closed_trades, 2);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.losing_trades, 1);
        // 95 net win, 55 net loss
        assert!((stats.total_net_pnl - 40.0).abs() < 1e-9);
        assert_eq!(stats.win_rate, 0.5);
        assert!((stats.profit_factor.unwrap() - 95.0 / 55.0).abs() < 1e-9);
        assert_eq!(stats.average_win, 95.0);
        assert_eq!(stats.average_loss, 55.0);
    }

    #[test]
    fn test_stats_empty() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.closed_trades, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.profit_factor, None);
    }

    #[test]
    fn test_profit_factor_none_without_losses() {
        let stats = compute_stats(&[closed_trade("2024-03-01", 100.0, 0.0)]);
        assert_eq!(stats.profit_factor, None);
        assert_eq!(stats.win_rate, 1.0);
    }

    #[test]
    fn test_account_equity() {
        let deposits = vec![transaction(1_000.0, TransactionKind::Deposit)];
        let withdrawals = vec![transaction(250.0, TransactionKind::Withdrawal)];
        let equity = account_equity(10_000.0, &deposits, &withdrawals, 340.0);
        assert_eq!(equity, 11_090.0);
    }

    #[test]
    fn test_daily_net_pnl_buckets_by_date() {
        let trades = vec![
            closed_trade("2024-03-01", -300.0, 0.0),
            closed_trade("2024-03-01", -250.0, 0.0),
            closed_trade("2024-02-29", 400.0, 0.0),
        ];
        assert_eq!(daily_net_pnl(&trades, "2024-03-01"), -550.0);
        assert_eq!(daily_net_pnl(&trades, "2024-02-29"), 400.0);
        assert_eq!(daily_net_pnl(&trades, "2024-03-02"), 0.0);
    }

    #[test]
    fn test_daily_loss_limit_breach() {
        let settings = PortfolioSettings::default(); // 500 absolute, 5% of 10k = 500
        let trades = vec![closed_trade("2024-03-01", -520.0, 0.0)];
        let status = check_risk(&trades, &settings, "2024-03-01");
        assert!(status.daily_loss_limit_breached);
        assert!(status.daily_loss_percentage_breached);
        assert_eq!(status.daily_net_pnl, -520.0);
    }

    #[test]
    fn test_profitable_day_breaches_nothing() {
        let settings = PortfolioSettings::default();
        let trades = vec![closed_trade("2024-03-01", 600.0, 0.0)];
        let status = check_risk(&trades, &settings, "2024-03-01");
        assert!(!status.daily_loss_limit_breached);
        assert!(!status.daily_loss_percentage_breached);
    }

    #[test]
    fn test_position_size_violations() {
        let settings = PortfolioSettings::default(); // 1000 absolute, 10% of 10k = 1000
        assert!(position_size_violations(&settings, 900.0).is_empty());
        let violations = position_size_violations(&settings, 1_500.0);
        assert_eq!(violations.len(), 2);
    }
}
