//! # Dashboard Summary
//!
//! Revenue figures over the order ledger. Drafts are not sales and are left
//! out; refunds and cancellations carry negative totals and net off.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::order::{Order, OrderStatus};

/// Number of trailing days in the daily chart.
pub const DAILY_WINDOW: i64 = 7;

/// Number of orders shown under "recent".
pub const RECENT_ORDERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub revenue_this_month: Money,
    pub revenue_last_month: Money,
    /// Month-over-month change in percent; 0 when last month had nothing.
    pub revenue_change: f64,
    pub orders_this_month: usize,
    pub orders_last_month: usize,
    pub orders_change: f64,
    pub total_revenue: Money,
    pub total_orders: usize,
    pub active_products: usize,
    pub customers: usize,
    /// Oldest first, ending today.
    pub daily: Vec<DailyTotal>,
    /// Newest first.
    pub recent_orders: Vec<Order>,
}

fn change_percent(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

impl DashboardSummary {
    pub fn compute(
        orders: &[Order],
        active_products: usize,
        customers: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let sales: Vec<&Order> = orders
            .iter()
            .filter(|o| o.status != OrderStatus::Draft)
            .collect();

        let today = now.date_naive();
        let this_month = today.with_day(1).unwrap_or(today);
        let last_month = this_month
            .pred_opt()
            .and_then(|d| d.with_day(1))
            .unwrap_or(this_month);

        let in_this_month = |o: &&&Order| o.created_at.date_naive() >= this_month;
        let in_last_month = |o: &&&Order| {
            let d = o.created_at.date_naive();
            d >= last_month && d < this_month
        };

        let revenue_this_month: Money = sales.iter().filter(in_this_month).map(|o| o.total).sum();
        let revenue_last_month: Money = sales.iter().filter(in_last_month).map(|o| o.total).sum();
        let orders_this_month = sales.iter().filter(in_this_month).count();
        let orders_last_month = sales.iter().filter(in_last_month).count();

        let daily = (0..DAILY_WINDOW)
            .rev()
            .map(|back| {
                let date = today - Duration::days(back);
                let total = sales
                    .iter()
                    .filter(|o| o.created_at.date_naive() == date)
                    .map(|o| o.total)
                    .sum();
                DailyTotal { date, total }
            })
            .collect();

        let mut recent: Vec<&Order> = sales.clone();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let recent_orders = recent.into_iter().take(RECENT_ORDERS).cloned().collect();

        DashboardSummary {
            revenue_this_month,
            revenue_last_month,
            revenue_change: change_percent(revenue_this_month.to_f64(), revenue_last_month.to_f64()),
            orders_this_month,
            orders_last_month,
            orders_change: change_percent(orders_this_month as f64, orders_last_month as f64),
            total_revenue: sales.iter().map(|o| o.total).sum(),
            total_orders: sales.len(),
            active_products,
            customers,
            daily,
            recent_orders,
        }
    }
}
