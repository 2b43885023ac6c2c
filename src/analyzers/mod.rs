//! Page aggregators over a normalized order history.
//!
//! Each page module exposes a pure `aggregate(&[OrderRecord])` returning the
//! chart-ready series for that view. [`dashboard`] dispatches by [`dashboard::Page`].

pub mod calendar;
pub mod customer;
pub mod dashboard;
pub mod delivery;
pub mod financials;
pub mod geography;
pub mod overview;
pub mod payments;
pub mod restaurants;
pub mod time;
pub mod types;
pub mod utility;

use std::collections::{BTreeMap, BTreeSet};

use crate::order::OrderRecord;

/// Orders sorted ascending by instant. The sort is stable, so equal
/// timestamps keep their input order.
pub(crate) fn by_time(orders: &[OrderRecord]) -> Vec<&OrderRecord> {
    let mut sorted: Vec<&OrderRecord> = orders.iter().collect();
    sorted.sort_by_key(|o| o.order_time);
    sorted
}

/// Every `YYYY-MM` key present in the data, each mapped to `0.0`. Used to
/// zero-fill monthly series against the months the history actually covers.
pub(crate) fn month_frame(orders: &[OrderRecord]) -> BTreeMap<String, f64> {
    orders
        .iter()
        .map(|o| o.month_key())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|m| (m, 0.0))
        .collect()
}
