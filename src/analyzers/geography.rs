//! Geographic insights: where orders come from and how far they travel.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::analyzers::by_time;
use crate::analyzers::calendar::{self, WEEKDAY_NAMES};
use crate::analyzers::types::{
    CategorySeries, LabeledSeries, PointSeries, RegionHeatmap, Trendline, heat_color,
};
use crate::analyzers::utility::{
    frequency, grouped_average, linear_regression, mean, rank_desc, running_total,
    sort_desc_by_value,
};
use crate::order::OrderRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeographyInsights {
    pub city_distribution: LabeledSeries,
    /// x = distance in km, y = delivery time in minutes.
    pub distance_vs_delivery_time: PointSeries,
    pub distance_trendline: Option<Trendline>,
    pub cumulative_distance: CategorySeries,
    pub avg_distance_by_city: CategorySeries,
    /// One grid per city, busiest city first.
    pub heatmaps: Vec<RegionHeatmap>,
    pub total_distance_km: f64,
    /// Mean over orders that report a distance.
    pub avg_distance_km: f64,
}

#[instrument(skip(orders), fields(orders = orders.len()))]
pub fn aggregate(orders: &[OrderRecord]) -> GeographyInsights {
    let cities = rank_desc(frequency(orders, |o| o.city_label().to_string()));

    let mut scatter = PointSeries::default();
    for order in orders {
        if let (Some(km), Some(minutes)) = (order.customer_distance_km, order.delivery_minutes()) {
            scatter.push(km, minutes);
        }
    }
    let distance_trendline = linear_regression(&scatter.x, &scatter.y);

    let chronological = by_time(orders);
    let cumulative = running_total(chronological.iter().map(|o| o.distance()));
    let cumulative_distance = CategorySeries::from_pairs(
        chronological
            .iter()
            .map(|o| o.day_label())
            .zip(cumulative),
    );

    let mut avg_by_city = grouped_average(orders.iter().filter_map(|o| {
        o.customer_distance_km
            .map(|km| (o.city_label().to_string(), km))
    }));
    sort_desc_by_value(&mut avg_by_city);

    let distances: Vec<f64> = orders
        .iter()
        .filter_map(|o| o.customer_distance_km)
        .collect();

    let heatmaps = cities
        .iter()
        .map(|(city, _)| region_heatmap(city, orders))
        .collect();

    let insights = GeographyInsights {
        city_distribution: LabeledSeries::ranked_counts(cities),
        distance_vs_delivery_time: scatter,
        distance_trendline,
        cumulative_distance,
        avg_distance_by_city: CategorySeries::from_pairs(avg_by_city),
        heatmaps,
        total_distance_km: orders.iter().map(OrderRecord::distance).sum(),
        avg_distance_km: mean(&distances),
    };

    debug!(
        cities = insights.city_distribution.labels.len(),
        points = insights.distance_vs_delivery_time.len(),
        "Geography insights aggregated"
    );
    insights
}

/// 7x24 order density for one city, normalized against that city's own peak.
fn region_heatmap(region: &str, orders: &[OrderRecord]) -> RegionHeatmap {
    let mut counts = vec![vec![0u32; 24]; 7];
    for order in orders.iter().filter(|o| o.city_label() == region) {
        let local = order.local_time();
        counts[calendar::weekday_index(&local)][calendar::hour(&local)] += 1;
    }

    let max_count = counts.iter().flatten().copied().max().unwrap_or(0);
    let intensity: Vec<Vec<f64>> = counts
        .iter()
        .map(|row| {
            row.iter()
                .map(|c| {
                    if max_count == 0 {
                        0.0
                    } else {
                        *c as f64 / max_count as f64
                    }
                })
                .collect()
        })
        .collect();
    let colors = intensity
        .iter()
        .map(|row| row.iter().map(|v| heat_color(*v)).collect())
        .collect();

    RegionHeatmap {
        region: region.to_string(),
        days: WEEKDAY_NAMES.iter().map(|d| d.to_string()).collect(),
        hours: (0..24).map(calendar::hour_label).collect(),
        counts,
        intensity,
        colors,
        max_count,
    }
}

/// Index of the busiest cell per region, keyed by region name.
pub fn peak_cells(heatmaps: &[RegionHeatmap]) -> BTreeMap<String, (usize, usize)> {
    heatmaps
        .iter()
        .filter(|h| h.max_count > 0)
        .filter_map(|h| {
            h.counts.iter().enumerate().find_map(|(day, row)| {
                row.iter()
                    .position(|c| *c == h.max_count)
                    .map(|hour| (h.region.clone(), (day, hour)))
            })
        })
        .collect()
}
