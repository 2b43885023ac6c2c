//! Customer behaviour: what gets ordered, when, and from whom.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::analyzers::by_time;
use crate::analyzers::calendar::{self, TimeBand};
use crate::analyzers::types::{
    CategorySeries, LabeledSeries, NEGATIVE_COLOR, NEUTRAL_COLOR, POSITIVE_COLOR,
};
use crate::analyzers::utility::{count_by, frequency, histogram, top_n};
use crate::order::{OrderRecord, VegFlag};

const TOP_ITEMS: usize = 10;
const TOP_LOYAL_RESTAURANTS: usize = 10;
const TOP_CUISINES: usize = 7;
/// Orders with at least this many items count towards the basket-size trend.
const LARGE_BASKET_ITEMS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerInsights {
    pub top_items: CategorySeries,
    pub veg_split: LabeledSeries,
    /// Keyed by item count, zero-filled between the smallest and largest basket.
    pub items_per_order: CategorySeries,
    pub time_of_day: CategorySeries,
    /// Restaurants ordered from more than once.
    pub restaurant_loyalty: CategorySeries,
    pub basket_size_trend: CategorySeries,
    pub cuisine_preference: LabeledSeries,
    pub total_items: usize,
    pub avg_items_per_order: f64,
}

#[instrument(skip(orders), fields(orders = orders.len()))]
pub fn aggregate(orders: &[OrderRecord]) -> CustomerInsights {
    let all_items = orders.iter().flat_map(|o| o.items.iter());

    let top_items = top_n(count_by(all_items.clone().map(|i| i.name.clone())), TOP_ITEMS);

    let veg = count_by(all_items.map(|i| i.is_veg));
    let veg_count = |flag: VegFlag| veg.get(&flag).copied().unwrap_or(0) as f64;
    let veg_split = LabeledSeries::fixed(&[
        (VegFlag::Veg.label(), veg_count(VegFlag::Veg), POSITIVE_COLOR),
        (VegFlag::NonVeg.label(), veg_count(VegFlag::NonVeg), NEGATIVE_COLOR),
        (VegFlag::Unknown.label(), veg_count(VegFlag::Unknown), NEUTRAL_COLOR),
    ]);

    let basket_sizes: Vec<f64> = orders.iter().map(|o| o.item_count() as f64).collect();
    let items_per_order = CategorySeries::from_counts(
        histogram(&basket_sizes, 1.0)
            .into_iter()
            .map(|bin| ((bin.start as i64).to_string(), bin.count)),
    );

    let mut bands = [0usize; 4];
    for order in orders {
        bands[TimeBand::from_hour(calendar::hour(&order.local_time())).index()] += 1;
    }
    let time_of_day = CategorySeries::from_counts(
        TimeBand::ALL
            .iter()
            .map(|band| (band.label(), bands[band.index()])),
    );

    let mut loyal = frequency(orders, |o| o.restaurant_name.clone());
    loyal.retain(|_, count| *count > 1);
    let restaurant_loyalty =
        CategorySeries::from_counts(top_n(loyal, TOP_LOYAL_RESTAURANTS)).with_truncated_labels();

    let basket_size_trend = CategorySeries::from_pairs(
        by_time(orders)
            .into_iter()
            .filter(|o| o.item_count() >= LARGE_BASKET_ITEMS)
            .enumerate()
            .map(|(i, o)| (o.day_label(), (i + 1) as f64)),
    );

    let cuisines = top_n(
        frequency(orders, |o| o.primary_cuisine().to_string()),
        TOP_CUISINES,
    );

    let total_items: usize = orders.iter().map(OrderRecord::item_count).sum();
    let avg_items_per_order = if orders.is_empty() {
        0.0
    } else {
        total_items as f64 / orders.len() as f64
    };

    let insights = CustomerInsights {
        top_items: CategorySeries::from_counts(top_items).with_truncated_labels(),
        veg_split,
        items_per_order,
        time_of_day,
        restaurant_loyalty,
        basket_size_trend,
        cuisine_preference: LabeledSeries::ranked_counts(cuisines),
        total_items,
        avg_items_per_order,
    };

    debug!(
        total_items,
        distinct_top_items = insights.top_items.len(),
        "Customer insights aggregated"
    );
    insights
}
