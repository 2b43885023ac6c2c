//! Delivery performance: punctuality, speed, and partners.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::analyzers::month_frame;
use crate::analyzers::types::{CategorySeries, LabeledSeries, NEGATIVE_COLOR, POSITIVE_COLOR};
use crate::analyzers::utility::{count_by, grouped_average, histogram, mean, pct, round_to, top_n};
use crate::order::OrderRecord;

/// Width of the delivery-time histogram buckets, in minutes.
pub const DELIVERY_BIN_MINUTES: f64 = 5.0;
const TOP_PARTNERS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeliveryInsights {
    /// Only orders that report punctuality are counted.
    pub on_time_split: LabeledSeries,
    /// Categories are bucket starts in minutes.
    pub delivery_time_histogram: CategorySeries,
    pub top_partners: CategorySeries,
    pub monthly_avg_delivery_minutes: CategorySeries,
    pub monthly_late_deliveries: CategorySeries,
    /// Percentage, one decimal.
    pub on_time_rate: f64,
    pub avg_delivery_minutes: f64,
    pub fastest_delivery_minutes: Option<f64>,
    pub slowest_delivery_minutes: Option<f64>,
}

#[instrument(skip(orders), fields(orders = orders.len()))]
pub fn aggregate(orders: &[OrderRecord]) -> DeliveryInsights {
    let on_time = orders.iter().filter(|o| o.on_time == Some(true)).count();
    let late = orders.iter().filter(|o| o.on_time == Some(false)).count();
    let on_time_split = LabeledSeries::fixed(&[
        ("On Time", on_time as f64, POSITIVE_COLOR),
        ("Late", late as f64, NEGATIVE_COLOR),
    ]);

    let minutes: Vec<f64> = orders.iter().filter_map(|o| o.delivery_minutes()).collect();
    let delivery_time_histogram = CategorySeries::from_counts(
        histogram(&minutes, DELIVERY_BIN_MINUTES)
            .into_iter()
            .map(|bin| (bin.start.to_string(), bin.count)),
    );

    let partners = count_by(
        orders
            .iter()
            .filter_map(|o| o.delivery_partner_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
    );

    let monthly_avg = grouped_average(
        orders
            .iter()
            .filter_map(|o| o.delivery_minutes().map(|m| (o.month_key(), m))),
    );

    let mut late_by_month: BTreeMap<String, f64> = month_frame(orders);
    for order in orders.iter().filter(|o| o.on_time == Some(false)) {
        *late_by_month.entry(order.month_key()).or_insert(0.0) += 1.0;
    }

    let insights = DeliveryInsights {
        on_time_split,
        delivery_time_histogram,
        top_partners: CategorySeries::from_counts(top_n(partners, TOP_PARTNERS))
            .with_truncated_labels(),
        monthly_avg_delivery_minutes: CategorySeries::from_pairs(monthly_avg),
        monthly_late_deliveries: CategorySeries::from_pairs(late_by_month),
        on_time_rate: round_to(pct(on_time, on_time + late), 1),
        avg_delivery_minutes: mean(&minutes),
        fastest_delivery_minutes: minutes.iter().copied().reduce(f64::min),
        slowest_delivery_minutes: minutes.iter().copied().reduce(f64::max),
    };

    debug!(
        on_time,
        late,
        timed = minutes.len(),
        "Delivery insights aggregated"
    );
    insights
}
