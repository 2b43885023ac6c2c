//! The order record consumed by every aggregator.
//!
//! Records are built once by [`crate::parser::parse_orders`] (or by the sample
//! generator) and never mutated afterwards. All fallback rules for missing
//! fields live in the accessors below so aggregators never re-implement them.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzers::calendar;

/// Sentinel used wherever a categorical field is absent.
pub const UNKNOWN: &str = "Unknown";

/// Tri-state vegetarian marker on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VegFlag {
    Veg,
    NonVeg,
    #[default]
    Unknown,
}

impl VegFlag {
    pub fn label(self) -> &'static str {
        match self {
            VegFlag::Veg => "Veg",
            VegFlag::NonVeg => "Non-Veg",
            VegFlag::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub name: String,
    pub is_veg: VegFlag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, is_veg: VegFlag, price: Option<f64>) -> Self {
        Self {
            name: name.into(),
            is_veg,
            price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// The four named fees reported on the financials page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeKind {
    DeliveryFee,
    PackingCharges,
    Gst,
    ServiceTax,
}

impl FeeKind {
    pub const ALL: [FeeKind; 4] = [
        FeeKind::DeliveryFee,
        FeeKind::PackingCharges,
        FeeKind::Gst,
        FeeKind::ServiceTax,
    ];

    /// Key used in the `charges` map and as the chart label.
    pub fn label(self) -> &'static str {
        match self {
            FeeKind::DeliveryFee => "Delivery Fee",
            FeeKind::PackingCharges => "Packing Charges",
            FeeKind::Gst => "GST",
            FeeKind::ServiceTax => "Service Tax",
        }
    }
}

/// One completed food-delivery transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order_time: DateTime<FixedOffset>,
    pub order_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_subtotal: Option<f64>,
    pub items: Vec<OrderItem>,
    pub restaurant_name: String,
    pub restaurant_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_time: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_time_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_partner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_applied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charges: Option<BTreeMap<String, f64>>,

    // discrete fee fields, used when `charges` is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packing_charges: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gst: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_tax: Option<f64>,
}

impl OrderRecord {
    /// A record with only the required fields set.
    pub fn new(order_time: DateTime<FixedOffset>, order_total: f64) -> Self {
        Self {
            order_time,
            order_total,
            order_subtotal: None,
            items: Vec::new(),
            restaurant_name: UNKNOWN.to_string(),
            restaurant_type: String::new(),
            restaurant_city: None,
            restaurant_coordinates: None,
            customer_distance_km: None,
            on_time: None,
            delivery_time_seconds: None,
            delivery_partner_name: None,
            payment_method: None,
            payment_gateway: None,
            coupon_applied: None,
            coupon_type: None,
            discount_amount: None,
            tip_amount: None,
            charges: None,
            delivery_fee: None,
            packing_charges: None,
            gst: None,
            service_tax: None,
        }
    }

    /// Wall-clock time in the timestamp's own offset.
    pub fn local_time(&self) -> NaiveDateTime {
        self.order_time.naive_local()
    }

    pub fn month_key(&self) -> String {
        calendar::month_key(&self.local_time())
    }

    /// `YYYY-MM-DD` of the local date, used as the x-axis of cumulative series.
    pub fn day_label(&self) -> String {
        calendar::day_label(&self.local_time())
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Full restaurant type string, trimmed.
    pub fn restaurant_type_label(&self) -> &str {
        non_empty_or_unknown(&self.restaurant_type)
    }

    /// Every comma-separated cuisine token, trimmed, skipping empties.
    pub fn cuisines(&self) -> impl Iterator<Item = &str> {
        self.restaurant_type
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// First comma-separated token of `restaurant_type`.
    pub fn primary_cuisine(&self) -> &str {
        self.cuisines().next().unwrap_or(UNKNOWN)
    }

    pub fn city_label(&self) -> &str {
        label_or_unknown(self.restaurant_city.as_deref())
    }

    pub fn payment_method_label(&self) -> &str {
        label_or_unknown(self.payment_method.as_deref())
    }

    pub fn payment_gateway_label(&self) -> &str {
        label_or_unknown(self.payment_gateway.as_deref())
    }

    pub fn coupon_type_label(&self) -> &str {
        label_or_unknown(self.coupon_type.as_deref())
    }

    pub fn delivery_minutes(&self) -> Option<f64> {
        self.delivery_time_seconds.map(|s| s / 60.0)
    }

    pub fn discount(&self) -> f64 {
        self.discount_amount.unwrap_or(0.0)
    }

    pub fn tip(&self) -> f64 {
        self.tip_amount.unwrap_or(0.0)
    }

    pub fn distance(&self) -> f64 {
        self.customer_distance_km.unwrap_or(0.0)
    }

    /// Explicit flag when present, otherwise inferred from a coupon type or
    /// a positive discount.
    pub fn used_coupon(&self) -> bool {
        match self.coupon_applied {
            Some(applied) => applied,
            None => self.coupon_type.is_some() || self.discount() > 0.0,
        }
    }

    /// Looks up a named charge, ignoring ASCII case when no exact key exists.
    pub fn charge(&self, name: &str) -> Option<f64> {
        let charges = self.charges.as_ref()?;
        charges.get(name).copied().or_else(|| {
            charges
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| *v)
        })
    }

    /// Amount of one fee for this order. A non-empty `charges` map is
    /// authoritative; otherwise the discrete field is used.
    pub fn fee(&self, kind: FeeKind) -> f64 {
        if self.charges.as_ref().is_some_and(|c| !c.is_empty()) {
            return self.charge(kind.label()).unwrap_or(0.0);
        }
        let discrete = match kind {
            FeeKind::DeliveryFee => self.delivery_fee,
            FeeKind::PackingCharges => self.packing_charges,
            FeeKind::Gst => self.gst,
            FeeKind::ServiceTax => self.service_tax,
        };
        discrete.unwrap_or(0.0)
    }

    pub fn total_fees(&self) -> f64 {
        FeeKind::ALL.iter().map(|k| self.fee(*k)).sum()
    }

    /// Pre-fee food cost: the subtotal, else the sum of priced items, else
    /// the total minus fees.
    pub fn food_cost(&self) -> f64 {
        if let Some(subtotal) = self.order_subtotal {
            return subtotal;
        }
        let priced: Vec<f64> = self.items.iter().filter_map(|i| i.price).collect();
        if !priced.is_empty() {
            return priced.iter().sum();
        }
        (self.order_total - self.total_fees()).max(0.0)
    }
}

fn non_empty_or_unknown(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() { UNKNOWN } else { trimmed }
}

fn label_or_unknown(value: Option<&str>) -> &str {
    value.map(non_empty_or_unknown).unwrap_or(UNKNOWN)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_primary_cuisine_takes_first_token() {
        let mut o = at("2024-03-01T12:00:00+05:30");
        o.restaurant_type = " North Indian , Chinese,Biryani".to_string();
        assert_eq!(o.primary_cuisine(), "North Indian");
        assert_eq!(o.cuisines().collect::<Vec<_>>(), ["North Indian", "Chinese", "Biryani"]);

        o.restaurant_type = "  ".to_string();
        assert_eq!(o.primary_cuisine(), UNKNOWN);
        assert_eq!(o.restaurant_type_label(), UNKNOWN);
    }

    #[test]
    fn test_fee_prefers_charges_map_per_order() {
        let mut with_map = order("2024-03-01T12:00:00Z", 300.0);
        with_map.charges = Some(BTreeMap::from([("GST".to_string(), 12.5)]));
        with_map.delivery_fee = Some(40.0);
        assert_eq!(with_map.fee(FeeKind::Gst), 12.5);
        // map present but without the key: discrete field is not consulted
        assert_eq!(with_map.fee(FeeKind::DeliveryFee), 0.0);

        let mut discrete = order("2024-03-01T12:00:00Z", 300.0);
        discrete.delivery_fee = Some(40.0);
        assert_eq!(discrete.fee(FeeKind::DeliveryFee), 40.0);
        assert_eq!(discrete.fee(FeeKind::Gst), 0.0);
    }

    #[test]
    fn test_charge_lookup_ignores_case() {
        let mut o = order("2024-03-01T12:00:00Z", 100.0);
        o.charges = Some(BTreeMap::from([("delivery fee".to_string(), 25.0)]));
        assert_eq!(o.charge("Delivery Fee"), Some(25.0));
        assert_eq!(o.charge("GST"), None);
    }

    #[test]
    fn test_used_coupon_inference() {
        let mut o = order("2024-03-01T12:00:00Z", 100.0);
        assert!(!o.used_coupon());
        o.discount_amount = Some(20.0);
        assert!(o.used_coupon());
        o.coupon_applied = Some(false);
        assert!(!o.used_coupon());
    }

    #[test]
    fn test_food_cost_fallbacks() {
        let mut o = order("2024-03-01T12:00:00Z", 250.0);
        o.delivery_fee = Some(30.0);
        assert_eq!(o.food_cost(), 220.0);

        o.items = vec![
            OrderItem::new("Dosa", VegFlag::Veg, Some(120.0)),
            OrderItem::new("Coffee", VegFlag::Veg, None),
        ];
        assert_eq!(o.food_cost(), 120.0);

        o.order_subtotal = Some(200.0);
        assert_eq!(o.food_cost(), 200.0);
    }

    #[test]
    fn test_local_time_uses_record_offset() {
        let o = at("2024-03-31T23:30:00-02:00");
        assert_eq!(o.month_key(), "2024-03");
        assert_eq!(o.day_label(), "2024-03-31");
    }
}
