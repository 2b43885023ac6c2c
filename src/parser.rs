//! JSON parser and normalizer for order history payloads.
//!
//! This is the only place that deals with the loose shape of source data.
//! Field names are accepted in snake_case or camelCase, numbers may arrive as
//! strings, and optional fields of the wrong type are dropped. The one field
//! that must be valid is `order_time`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{InsightsError, Result};
use crate::order::{Coordinates, OrderItem, OrderRecord, UNKNOWN, VegFlag};

/// Timestamp layouts tried after RFC 3339. Values without an offset are read as UTC.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Epoch values above this are taken as milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Decodes a JSON payload of order records.
///
/// The payload is either an array of records or an object with an `orders`
/// array.
///
/// # Errors
///
/// Returns [`InsightsError::Json`] for malformed JSON, [`InsightsError::Payload`]
/// when no record array is found, and the order-time errors for the first
/// record whose timestamp is missing or unreadable.
pub fn parse_orders(bytes: &[u8]) -> Result<Vec<OrderRecord>> {
    let payload: Value = serde_json::from_slice(bytes)?;

    let records = match &payload {
        Value::Array(records) => records,
        Value::Object(obj) => match obj.get("orders") {
            Some(Value::Array(records)) => records,
            _ => {
                return Err(InsightsError::Payload(
                    "object payload has no 'orders' array".to_string(),
                ));
            }
        },
        other => {
            return Err(InsightsError::Payload(format!(
                "expected an array of orders, found {}",
                value_kind(other)
            )));
        }
    };

    let orders = records
        .iter()
        .enumerate()
        .map(|(index, record)| normalize_record(index, record))
        .collect::<Result<Vec<_>>>()?;

    debug!(records = orders.len(), "Order payload parsed");
    Ok(orders)
}

/// Normalizes one raw record.
pub fn normalize_record(index: usize, record: &Value) -> Result<OrderRecord> {
    let Value::Object(obj) = record else {
        return Err(InsightsError::Payload(format!(
            "record {index} is {}, not an object",
            value_kind(record)
        )));
    };

    let order_time = match field(obj, &["order_time", "orderTime"]) {
        None => return Err(InsightsError::MissingOrderTime { index }),
        Some(raw) => parse_order_time(raw).ok_or_else(|| InsightsError::InvalidOrderTime {
            index,
            value: raw.as_str().map(str::to_string).unwrap_or_else(|| raw.to_string()),
        })?,
    };

    let mut order = OrderRecord::new(
        order_time,
        amount(obj, &["order_total", "orderTotal"]).unwrap_or(0.0),
    );

    order.order_subtotal = amount(obj, &["order_subtotal", "orderSubtotal"]);
    order.items = field(obj, &["items", "order_items", "orderItems"])
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_item).collect())
        .unwrap_or_default();
    order.restaurant_name =
        text(obj, &["restaurant_name", "restaurantName"]).unwrap_or_else(|| UNKNOWN.to_string());
    order.restaurant_type = text(obj, &["restaurant_type", "restaurantType"]).unwrap_or_default();
    order.restaurant_city = text(obj, &["restaurant_city", "restaurantCity"]);
    order.restaurant_coordinates =
        field(obj, &["restaurant_coordinates", "restaurantCoordinates"])
            .and_then(parse_coordinates);
    order.customer_distance_km = amount(obj, &["customer_distance_km", "customerDistanceKm"]);
    order.on_time = field(obj, &["on_time", "onTime"]).and_then(as_bool);
    order.delivery_time_seconds = amount(obj, &["delivery_time_seconds", "deliveryTimeSeconds"]);
    order.delivery_partner_name = text(obj, &["delivery_partner_name", "deliveryPartnerName"]);
    order.payment_method = text(obj, &["payment_method", "paymentMethod"]);
    order.payment_gateway = text(obj, &["payment_gateway", "paymentGateway"]);
    order.coupon_applied = field(obj, &["coupon_applied", "couponApplied"]).and_then(as_bool);
    order.coupon_type = text(obj, &["coupon_type", "couponType"]);
    order.discount_amount = amount(obj, &["discount_amount", "discountAmount"]);
    order.tip_amount = amount(obj, &["tip_amount", "tipAmount"]);
    order.charges = field(obj, &["charges"]).and_then(parse_charges);
    order.delivery_fee = amount(obj, &["delivery_fee", "deliveryFee"]);
    order.packing_charges = amount(obj, &["packing_charges", "packingCharges"]);
    order.gst = amount(obj, &["gst", "GST"]);
    order.service_tax = amount(obj, &["service_tax", "serviceTax"]);

    Ok(order)
}

/// Reads an order timestamp from an RFC 3339 string, a naive date-time or
/// date string, or a Unix epoch number (seconds or milliseconds).
pub fn parse_order_time(raw: &Value) -> Option<DateTime<FixedOffset>> {
    match raw {
        Value::String(s) => parse_timestamp(s.trim()),
        Value::Number(n) => {
            let epoch = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            let parsed = if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(epoch)
            } else {
                DateTime::from_timestamp(epoch, 0)
            };
            parsed.map(|dt| dt.fixed_offset())
        }
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// First non-null value among `names`.
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

fn text(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    field(obj, names).and_then(as_text)
}

/// Non-negative finite number; anything else is treated as absent.
fn amount(obj: &Map<String, Value>, names: &[&str]) -> Option<f64> {
    field(obj, names).and_then(as_amount)
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_amount(v: &Value) -> Option<f64> {
    as_number(v).filter(|n| n.is_finite() && *n >= 0.0)
}

fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_veg_flag(v: &Value) -> VegFlag {
    if let Value::String(s) = v {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        return match normalized.as_str() {
            "veg" | "vegetarian" | "true" | "yes" | "1" => VegFlag::Veg,
            "non-veg" | "nonveg" | "non-vegetarian" | "false" | "no" | "0" => VegFlag::NonVeg,
            _ => VegFlag::Unknown,
        };
    }
    match as_bool(v) {
        Some(true) => VegFlag::Veg,
        Some(false) => VegFlag::NonVeg,
        None => VegFlag::Unknown,
    }
}

fn parse_item(v: &Value) -> Option<OrderItem> {
    match v {
        Value::String(name) if !name.trim().is_empty() => {
            Some(OrderItem::new(name.trim(), VegFlag::Unknown, None))
        }
        Value::Object(obj) => {
            let name = text(obj, &["name", "item_name", "itemName"])?;
            let is_veg = field(obj, &["is_veg", "isVeg", "veg"])
                .map(as_veg_flag)
                .unwrap_or_default();
            let price = amount(obj, &["price", "item_price", "itemPrice"]);
            Some(OrderItem::new(name, is_veg, price))
        }
        _ => None,
    }
}

fn parse_coordinates(v: &Value) -> Option<Coordinates> {
    let (lat, lng) = match v {
        Value::Object(obj) => (
            field(obj, &["lat", "latitude"]).and_then(as_number)?,
            field(obj, &["lng", "lon", "longitude"]).and_then(as_number)?,
        ),
        Value::String(s) => {
            let (lat, lng) = s.split_once(',')?;
            (lat.trim().parse().ok()?, lng.trim().parse().ok()?)
        }
        Value::Array(pair) if pair.len() == 2 => (as_number(&pair[0])?, as_number(&pair[1])?),
        _ => return None,
    };

    let valid = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
    valid.then_some(Coordinates { lat, lng })
}

fn parse_charges(v: &Value) -> Option<BTreeMap<String, f64>> {
    let obj = v.as_object()?;
    let charges: BTreeMap<String, f64> = obj
        .iter()
        .filter_map(|(name, amount)| as_amount(amount).map(|a| (name.trim().to_string(), a)))
        .collect();
    Some(charges)
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_parse_empty_array() {
        let orders = parse_orders(b"[]").unwrap();
        assert!(orders.is_empty());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        let result = parse_orders(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(InsightsError::Json(_))));
    }

    #[test]
    fn test_parse_rejects_non_array_payload() {
        let result = parse_orders(br#""orders""#);
        assert!(matches!(result, Err(InsightsError::Payload(_))));

        let wrapped = parse_orders(br#"{"orders": [{"order_time": "2024-01-01T10:00:00Z"}]}"#);
        assert_eq!(wrapped.unwrap().len(), 1);
    }

    #[test]
    fn test_snake_and_camel_case_fields() {
        let payload = json!([
            {
                "order_time": "2024-02-10T20:15:00+05:30",
                "order_total": 412.5,
                "restaurant_name": "Meghana Foods",
                "restaurant_type": "Biryani, Andhra",
                "items": [{"name": "Chicken Biryani", "is_veg": "non-veg", "price": 340}],
                "on_time": true
            },
            {
                "orderTime": "2024-02-11 13:00:00",
                "orderTotal": "199",
                "restaurantName": "Vidyarthi Bhavan",
                "items": [{"name": "Masala Dosa", "isVeg": 1}, "Filter Coffee"],
                "onTime": "false",
                "deliveryTimeSeconds": 1500
            }
        ]);
        let orders = parse_orders(payload.to_string().as_bytes()).unwrap();

        let first = &orders[0];
        assert_eq!(first.order_total, 412.5);
        assert_eq!(first.local_time().hour(), 20);
        assert_eq!(first.items[0].is_veg, VegFlag::NonVeg);
        assert_eq!(first.items[0].price, Some(340.0));
        assert_eq!(first.on_time, Some(true));

        let second = &orders[1];
        assert_eq!(second.order_total, 199.0);
        assert_eq!(second.restaurant_name, "Vidyarthi Bhavan");
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items[0].is_veg, VegFlag::Veg);
        assert_eq!(second.items[1].name, "Filter Coffee");
        assert_eq!(second.on_time, Some(false));
        assert_eq!(second.delivery_time_seconds, Some(1500.0));
        assert_eq!(second.restaurant_type, "");
    }

    #[test]
    fn test_missing_optional_fields_degrade() {
        let payload = json!([{
            "order_time": "2024-02-10T20:15:00Z",
            "order_total": -5,
            "customer_distance_km": "far",
            "on_time": "maybe",
            "restaurant_coordinates": "12.97, 77.59",
            "charges": {"GST": 10.5, "Delivery Fee": "30", "Note": "n/a"}
        }]);
        let orders = parse_orders(payload.to_string().as_bytes()).unwrap();
        let o = &orders[0];
        assert_eq!(o.order_total, 0.0);
        assert_eq!(o.restaurant_name, UNKNOWN);
        assert_eq!(o.customer_distance_km, None);
        assert_eq!(o.on_time, None);
        assert!(o.items.is_empty());
        assert_eq!(
            o.restaurant_coordinates,
            Some(Coordinates { lat: 12.97, lng: 77.59 })
        );
        let charges = o.charges.as_ref().unwrap();
        assert_eq!(charges.len(), 2);
        assert_eq!(charges["Delivery Fee"], 30.0);
    }

    #[test]
    fn test_order_time_errors_name_the_record() {
        let payload = json!([
            {"order_time": "2024-01-01T10:00:00Z"},
            {"order_time": "last tuesday"}
        ]);
        match parse_orders(payload.to_string().as_bytes()) {
            Err(InsightsError::InvalidOrderTime { index, value }) => {
                assert_eq!(index, 1);
                assert_eq!(value, "last tuesday");
            }
            other => panic!("expected InvalidOrderTime, got {:?}", other),
        }

        let payload = json!([{"order_total": 10}]);
        assert!(matches!(
            parse_orders(payload.to_string().as_bytes()),
            Err(InsightsError::MissingOrderTime { index: 0 })
        ));
    }

    #[test]
    fn test_order_time_formats() {
        let date_only = parse_order_time(&json!("2024-03-05")).unwrap();
        assert_eq!(date_only.day(), 5);
        assert_eq!(date_only.hour(), 0);

        let epoch_secs = parse_order_time(&json!(1_700_000_000)).unwrap();
        let epoch_millis = parse_order_time(&json!(1_700_000_000_000i64)).unwrap();
        assert_eq!(epoch_secs, epoch_millis);

        assert!(parse_order_time(&json!(true)).is_none());
        assert!(parse_order_time(&json!("2024-13-01")).is_none());
    }
}
