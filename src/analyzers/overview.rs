//! Headline numbers shown on the overview page.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument};

use crate::analyzers::types::{CategorySeries, LabeledSeries};
use crate::analyzers::utility::{frequency, mean, mode_first_seen, pct, round_to, top_n};
use crate::order::{OrderRecord, UNKNOWN};

const TOP_TYPES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverviewInsights {
    pub total_orders: usize,
    pub total_revenue: f64,
    pub avg_order_value: f64,
    pub total_items: usize,
    pub avg_items_per_order: f64,
    pub distinct_restaurants: usize,
    /// Percentage of orders with a punctuality flag that arrived on time, one decimal.
    pub on_time_rate: f64,
    pub max_order_value: f64,
    pub min_order_value: f64,
    pub avg_delivery_minutes: f64,
    pub max_delivery_minutes: f64,
    pub total_distance_km: f64,
    /// Sum of the `GST` charge over orders that itemize it.
    pub total_gst: f64,
    pub top_restaurant_type: Option<String>,
    pub top_payment_method: Option<String>,
    pub monthly_orders: CategorySeries,
    pub monthly_revenue: CategorySeries,
    pub restaurant_types: LabeledSeries,
}

#[instrument(skip(orders), fields(orders = orders.len()))]
pub fn aggregate(orders: &[OrderRecord]) -> OverviewInsights {
    let total_orders = orders.len();
    let total_revenue: f64 = orders.iter().map(|o| o.order_total).sum();
    let total_items: usize = orders.iter().map(OrderRecord::item_count).sum();

    let (avg_order_value, avg_items_per_order) = if total_orders == 0 {
        (0.0, 0.0)
    } else {
        (
            total_revenue / total_orders as f64,
            total_items as f64 / total_orders as f64,
        )
    };

    let distinct_restaurants = orders
        .iter()
        .map(|o| o.restaurant_name.as_str())
        .collect::<HashSet<_>>()
        .len();

    let on_time = orders.iter().filter(|o| o.on_time == Some(true)).count();
    let timed = orders.iter().filter(|o| o.on_time.is_some()).count();

    let totals: Vec<f64> = orders.iter().map(|o| o.order_total).collect();
    let minutes: Vec<f64> = orders.iter().filter_map(|o| o.delivery_minutes()).collect();

    let mut monthly: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for order in orders {
        let entry = monthly.entry(order.month_key()).or_default();
        entry.0 += 1;
        entry.1 += order.order_total;
    }

    let top_restaurant_type = mode_first_seen(
        orders
            .iter()
            .map(|o| o.restaurant_type_label())
            .filter(|t| *t != UNKNOWN),
    );
    let top_payment_method = mode_first_seen(
        orders
            .iter()
            .filter_map(|o| o.payment_method.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty()),
    );

    let types = top_n(
        frequency(orders, |o| o.restaurant_type_label().to_string()),
        TOP_TYPES,
    );

    let insights = OverviewInsights {
        total_orders,
        total_revenue,
        avg_order_value,
        total_items,
        avg_items_per_order,
        distinct_restaurants,
        on_time_rate: round_to(pct(on_time, timed), 1),
        max_order_value: totals.iter().copied().reduce(f64::max).unwrap_or(0.0),
        min_order_value: totals.iter().copied().reduce(f64::min).unwrap_or(0.0),
        avg_delivery_minutes: mean(&minutes),
        max_delivery_minutes: minutes.iter().copied().reduce(f64::max).unwrap_or(0.0),
        total_distance_km: orders.iter().map(OrderRecord::distance).sum(),
        total_gst: orders.iter().filter_map(|o| o.charge("GST")).sum(),
        top_restaurant_type,
        top_payment_method,
        monthly_orders: CategorySeries::from_counts(monthly.iter().map(|(k, v)| (k.clone(), v.0))),
        monthly_revenue: CategorySeries::from_pairs(monthly.iter().map(|(k, v)| (k.clone(), v.1))),
        restaurant_types: LabeledSeries::ranked_counts(types),
    };

    debug!(
        total_orders,
        total_revenue,
        on_time_rate = insights.on_time_rate,
        "Overview aggregated"
    );
    insights
}
