//! Time-based insights: monthly, quarterly, weekday, hourly, and cumulative
//! order activity.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::analyzers::by_time;
use crate::analyzers::calendar::{self, WEEKDAY_NAMES};
use crate::analyzers::types::CategorySeries;
use crate::order::OrderRecord;

/// Weeks always present in the week-of-month series.
const WEEKS_SHOWN: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeInsights {
    pub monthly_orders: CategorySeries,
    pub monthly_revenue: CategorySeries,
    pub quarterly_orders: CategorySeries,
    pub quarterly_revenue: CategorySeries,
    /// Descending by order count, not in calendar order.
    pub weekday_orders: CategorySeries,
    /// Aligned with `weekday_orders`.
    pub weekday_revenue: CategorySeries,
    pub hourly_orders: CategorySeries,
    pub cumulative_orders: CategorySeries,
    pub week_of_month: CategorySeries,
    pub busiest_weekday: Option<String>,
    pub peak_hour: Option<usize>,
}

#[instrument(skip(orders), fields(orders = orders.len()))]
pub fn aggregate(orders: &[OrderRecord]) -> TimeInsights {
    let mut monthly: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    let mut quarterly: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    let mut weekday_counts = [0usize; 7];
    let mut weekday_revenue = [0f64; 7];
    let mut hourly = [0usize; 24];
    let mut weeks: BTreeMap<usize, usize> = (1..=WEEKS_SHOWN).map(|w| (w, 0)).collect();

    for order in orders {
        let local = order.local_time();

        let m = monthly.entry(calendar::month_key(&local)).or_default();
        m.0 += 1;
        m.1 += order.order_total;

        let q = quarterly.entry(calendar::quarter_key(&local)).or_default();
        q.0 += 1;
        q.1 += order.order_total;

        let day = calendar::weekday_index(&local);
        weekday_counts[day] += 1;
        weekday_revenue[day] += order.order_total;

        hourly[calendar::hour(&local)] += 1;

        *weeks.entry(calendar::week_of_month(&local)).or_insert(0) += 1;
    }

    let mut days: Vec<usize> = (0..7).filter(|d| weekday_counts[*d] > 0).collect();
    days.sort_by(|a, b| weekday_counts[*b].cmp(&weekday_counts[*a]).then(a.cmp(b)));

    let peak_hour = if orders.is_empty() {
        None
    } else {
        // first maximum, so ties resolve to the earliest hour
        (0..24).reduce(|best, h| if hourly[h] > hourly[best] { h } else { best })
    };

    let cumulative = by_time(orders)
        .iter()
        .enumerate()
        .map(|(i, o)| (o.day_label(), (i + 1) as f64))
        .collect::<Vec<_>>();

    let insights = TimeInsights {
        monthly_orders: CategorySeries::from_counts(monthly.iter().map(|(k, v)| (k.clone(), v.0))),
        monthly_revenue: CategorySeries::from_pairs(monthly.iter().map(|(k, v)| (k.clone(), v.1))),
        quarterly_orders: CategorySeries::from_counts(
            quarterly.iter().map(|(k, v)| (k.clone(), v.0)),
        ),
        quarterly_revenue: CategorySeries::from_pairs(
            quarterly.iter().map(|(k, v)| (k.clone(), v.1)),
        ),
        weekday_orders: CategorySeries::from_counts(
            days.iter().map(|d| (WEEKDAY_NAMES[*d], weekday_counts[*d])),
        ),
        weekday_revenue: CategorySeries::from_pairs(
            days.iter().map(|d| (WEEKDAY_NAMES[*d], weekday_revenue[*d])),
        ),
        hourly_orders: CategorySeries::from_counts(
            hourly.iter().enumerate().map(|(h, n)| (calendar::hour_label(h), *n)),
        ),
        cumulative_orders: CategorySeries::from_pairs(cumulative),
        week_of_month: CategorySeries::from_counts(
            weeks.iter().map(|(w, n)| (format!("Week {w}"), *n)),
        ),
        busiest_weekday: days.first().map(|d| WEEKDAY_NAMES[*d].to_string()),
        peak_hour,
    };

    debug!(
        months = insights.monthly_orders.len(),
        busiest = ?insights.busiest_weekday,
        peak_hour = ?insights.peak_hour,
        "Time insights aggregated"
    );
    insights
}
