//! Restaurant preferences: who gets the orders and who gets the money.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::analyzers::month_frame;
use crate::analyzers::types::{CategorySeries, LabeledSeries};
use crate::analyzers::utility::{
    count_by, frequency, grouped_average, rank_desc, sort_desc_by_value, top_n,
};
use crate::order::OrderRecord;

const TOP_RESTAURANTS: usize = 10;
const TOP_CUISINES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RestaurantInsights {
    pub top_restaurants: CategorySeries,
    /// Every restaurant type string, most common first.
    pub type_distribution: LabeledSeries,
    pub top_by_avg_order_value: CategorySeries,
    /// Individual cuisine tokens, so a "North Indian, Chinese" restaurant
    /// counts towards both.
    pub cuisine_counts: CategorySeries,
    /// The most-ordered restaurant, if any.
    pub repeat_restaurant: Option<String>,
    /// Monthly orders from `repeat_restaurant` across every month in the data.
    pub repeat_orders: CategorySeries,
    pub distinct_restaurants: usize,
}

#[instrument(skip(orders), fields(orders = orders.len()))]
pub fn aggregate(orders: &[OrderRecord]) -> RestaurantInsights {
    let by_restaurant = rank_desc(frequency(orders, |o| o.restaurant_name.clone()));
    let distinct_restaurants = by_restaurant.len();
    let repeat_restaurant = by_restaurant.first().map(|(name, _)| name.clone());

    let types = rank_desc(frequency(orders, |o| o.restaurant_type_label().to_string()));

    let mut avg_value =
        grouped_average(orders.iter().map(|o| (o.restaurant_name.clone(), o.order_total)));
    sort_desc_by_value(&mut avg_value);
    avg_value.truncate(TOP_RESTAURANTS);

    let cuisines = top_n(
        count_by(orders.iter().flat_map(|o| o.cuisines()).map(str::to_string)),
        TOP_CUISINES,
    );

    let repeat_orders = match &repeat_restaurant {
        Some(name) => {
            let mut months = month_frame(orders);
            for order in orders.iter().filter(|o| &o.restaurant_name == name) {
                *months.entry(order.month_key()).or_insert(0.0) += 1.0;
            }
            CategorySeries::from_pairs(months)
        }
        None => CategorySeries::default(),
    };

    let mut top = by_restaurant;
    top.truncate(TOP_RESTAURANTS);

    let insights = RestaurantInsights {
        top_restaurants: CategorySeries::from_counts(top).with_truncated_labels(),
        type_distribution: LabeledSeries::ranked_counts(types),
        top_by_avg_order_value: CategorySeries::from_pairs(avg_value).with_truncated_labels(),
        cuisine_counts: CategorySeries::from_counts(cuisines),
        repeat_restaurant,
        repeat_orders,
        distinct_restaurants,
    };

    debug!(
        distinct_restaurants,
        favourite = ?insights.repeat_restaurant,
        "Restaurant insights aggregated"
    );
    insights
}
