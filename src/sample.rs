//! Synthetic order history for demo mode.
//!
//! Output is deterministic for a given seed and anchor. Records are built in
//! the same shape the parser produces, so every page can run on them.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::debug;

use crate::analyzers::utility::round_to;
use crate::order::{Coordinates, FeeKind, OrderItem, OrderRecord, VegFlag};

pub const DEFAULT_SAMPLE_COUNT: usize = 120;
pub const DEFAULT_SAMPLE_MONTHS: u32 = 12;

/// Sample timestamps carry Indian Standard Time.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 1800;

// Sunday first; Friday to Sunday are the heavy days.
const WEEKDAY_WEIGHTS: [u32; 7] = [17, 10, 9, 10, 11, 16, 18];

// Lunch and dinner peaks with a thin late-night tail.
const HOUR_WEIGHTS: [u32; 24] = [
    2, 1, 1, 0, 0, 0, 0, 1, 3, 4, 3, 4, 9, 10, 8, 4, 3, 4, 6, 10, 12, 11, 9, 4,
];

const ON_TIME_PROBABILITY: f64 = 0.85;
const COUPON_PROBABILITY: f64 = 0.35;
const TIP_PROBABILITY: f64 = 0.30;
const SERVICE_TAX_PROBABILITY: f64 = 0.20;
const CHARGES_MAP_PROBABILITY: f64 = 0.5;
const GST_RATE: f64 = 0.05;
const SERVICE_TAX_RATE: f64 = 0.02;

struct Restaurant {
    name: &'static str,
    cuisines: &'static str,
    city: &'static str,
    lat: f64,
    lng: f64,
    menu: &'static [(&'static str, bool, f64)],
}

const RESTAURANTS: &[Restaurant] = &[
    Restaurant {
        name: "Meghana Foods",
        cuisines: "Biryani, Andhra, North Indian",
        city: "Bengaluru",
        lat: 12.9716,
        lng: 77.6412,
        menu: &[
            ("Chicken Biryani", false, 340.0),
            ("Paneer Biryani", true, 290.0),
            ("Chicken 65", false, 260.0),
            ("Raita", true, 40.0),
        ],
    },
    Restaurant {
        name: "Vidyarthi Bhavan",
        cuisines: "South Indian",
        city: "Bengaluru",
        lat: 12.9452,
        lng: 77.5714,
        menu: &[
            ("Masala Dosa", true, 90.0),
            ("Rava Vada", true, 45.0),
            ("Filter Coffee", true, 35.0),
        ],
    },
    Restaurant {
        name: "Truffles",
        cuisines: "Burgers, American, Cafe",
        city: "Bengaluru",
        lat: 12.9719,
        lng: 77.6101,
        menu: &[
            ("All American Cheese Burger", false, 280.0),
            ("Veg Burger", true, 210.0),
            ("Peri Peri Fries", true, 150.0),
            ("Cold Coffee", true, 160.0),
        ],
    },
    Restaurant {
        name: "Paradise Biryani",
        cuisines: "Biryani, Hyderabadi",
        city: "Hyderabad",
        lat: 17.4411,
        lng: 78.4983,
        menu: &[
            ("Mutton Biryani", false, 420.0),
            ("Chicken Biryani", false, 360.0),
            ("Double Ka Meetha", true, 110.0),
        ],
    },
    Restaurant {
        name: "Bademiya",
        cuisines: "Mughlai, North Indian",
        city: "Mumbai",
        lat: 18.9226,
        lng: 72.8311,
        menu: &[
            ("Chicken Seekh Kebab", false, 300.0),
            ("Baida Roti", false, 180.0),
            ("Paneer Tikka Roll", true, 190.0),
        ],
    },
    Restaurant {
        name: "Leopold Cafe",
        cuisines: "Continental, Cafe",
        city: "Mumbai",
        lat: 18.9229,
        lng: 72.8317,
        menu: &[
            ("Chicken Sizzler", false, 520.0),
            ("Veg Club Sandwich", true, 260.0),
            ("Fish and Chips", false, 480.0),
        ],
    },
    Restaurant {
        name: "Karim's",
        cuisines: "Mughlai",
        city: "Delhi",
        lat: 28.6507,
        lng: 77.2334,
        menu: &[
            ("Mutton Korma", false, 380.0),
            ("Butter Chicken", false, 420.0),
            ("Khamiri Roti", true, 25.0),
        ],
    },
    Restaurant {
        name: "Saravana Bhavan",
        cuisines: "South Indian, North Indian",
        city: "Chennai",
        lat: 13.0418,
        lng: 80.2341,
        menu: &[
            ("Ghee Roast Dosa", true, 140.0),
            ("Mini Tiffin", true, 190.0),
            ("Paneer Butter Masala", true, 240.0),
        ],
    },
    Restaurant {
        name: "Domino's Pizza",
        cuisines: "Pizza, Fast Food",
        city: "Bengaluru",
        lat: 12.9352,
        lng: 77.6245,
        menu: &[
            ("Farmhouse Pizza", true, 459.0),
            ("Pepper Barbecue Chicken", false, 499.0),
            ("Garlic Breadsticks", true, 129.0),
        ],
    },
    Restaurant {
        name: "Wow! Momo",
        cuisines: "Tibetan, Chinese, Fast Food",
        city: "Kolkata",
        lat: 22.5726,
        lng: 88.3639,
        menu: &[
            ("Chicken Steamed Momo", false, 169.0),
            ("Veg Pan Fried Momo", true, 179.0),
            ("Thukpa", false, 199.0),
        ],
    },
];

const DELIVERY_PARTNERS: &[&str] = &[
    "Ravi Kumar",
    "Suresh Naik",
    "Arjun Das",
    "Mohammed Imran",
    "Prakash Rao",
    "Vijay Singh",
];

const PAYMENT_METHODS: &[&str] = &[
    "UPI",
    "Credit Card",
    "Debit Card",
    "Wallet",
    "Net Banking",
    "Cash on Delivery",
];

const PAYMENT_GATEWAYS: &[&str] = &["Razorpay", "PayU", "PhonePe", "Paytm", "Juspay"];

const COUPON_TYPES: &[&str] = &["WELCOME50", "TRYNEW", "PARTY", "FREEDEL", "BANKOFFER"];

/// Parameters for [`generate_orders`].
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub count: usize,
    /// Fixed seed for reproducible output; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// How many months before `anchor` the orders are spread over.
    pub months: u32,
    pub anchor: DateTime<Utc>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_SAMPLE_COUNT,
            seed: None,
            months: DEFAULT_SAMPLE_MONTHS,
            anchor: Utc::now(),
        }
    }
}

impl SampleConfig {
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

fn pick<'a, T>(rng: &mut StdRng, list: &'a [T]) -> &'a T {
    &list[rng.gen_range(0..list.len())]
}

/// Index drawn proportionally to `weights`.
fn weighted_pick(rng: &mut StdRng, weights: &[u32]) -> usize {
    let total: u32 = weights.iter().sum();
    let mut roll = rng.gen_range(0..total);
    for (i, w) in weights.iter().enumerate() {
        if roll < *w {
            return i;
        }
        roll -= w;
    }
    weights.len() - 1
}

/// Generates `config.count` orders, sorted ascending by time, inside the
/// window of `config.months` before `config.anchor`.
pub fn generate_orders(config: &SampleConfig) -> Vec<OrderRecord> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let offset = FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    let anchor_local = config.anchor.with_timezone(&offset);
    let window_days = i64::from(config.months.max(1)) * 30;

    let mut orders: Vec<OrderRecord> = (0..config.count)
        .map(|_| {
            let time = order_time(&mut rng, anchor_local, window_days);
            sample_order(&mut rng, time)
        })
        .collect();
    orders.sort_by_key(|o| o.order_time);

    debug!(
        count = orders.len(),
        seed = ?config.seed,
        months = config.months,
        "Sample orders generated"
    );
    orders
}

/// A weighted weekday and hour inside the window, never after the anchor.
fn order_time(
    rng: &mut StdRng,
    anchor: DateTime<FixedOffset>,
    window_days: i64,
) -> DateTime<FixedOffset> {
    let anchor_date = anchor.date_naive();
    let weeks = (window_days / 7).max(1);
    let week_start = anchor_date
        - Duration::days(i64::from(anchor_date.weekday().num_days_from_sunday()))
        - Duration::weeks(rng.gen_range(0..weeks));

    let weekday = weighted_pick(rng, &WEEKDAY_WEIGHTS) as i64;
    let hour = weighted_pick(rng, &HOUR_WEIGHTS) as i64;
    let minute = rng.gen_range(0..60);

    let mut date: NaiveDate = week_start + Duration::days(weekday);
    let mut local = date.and_time(NaiveTime::MIN) + Duration::minutes(hour * 60 + minute);
    if local > anchor.naive_local() {
        date -= Duration::weeks(1);
        local = date.and_time(NaiveTime::MIN) + Duration::minutes(hour * 60 + minute);
    }

    let utc = local - Duration::seconds(i64::from(anchor.offset().local_minus_utc()));
    utc.and_utc().with_timezone(anchor.offset())
}

fn sample_order(rng: &mut StdRng, order_time: DateTime<FixedOffset>) -> OrderRecord {
    let restaurant = pick(rng, RESTAURANTS);

    let item_count = rng.gen_range(1..=4);
    let items: Vec<OrderItem> = (0..item_count)
        .map(|_| {
            let (name, veg, price) = *pick(rng, restaurant.menu);
            let flag = if veg { VegFlag::Veg } else { VegFlag::NonVeg };
            OrderItem::new(name, flag, Some(price))
        })
        .collect();
    let subtotal = round_to(items.iter().filter_map(|i| i.price).sum(), 2);

    let delivery_fee = f64::from(rng.gen_range(0..=60_u32));
    let packing_charges = f64::from(rng.gen_range(0..=30_u32));
    let gst = round_to(subtotal * GST_RATE, 2);
    let service_tax = if rng.gen_bool(SERVICE_TAX_PROBABILITY) {
        round_to(subtotal * SERVICE_TAX_RATE, 2)
    } else {
        0.0
    };

    let coupon = rng
        .gen_bool(COUPON_PROBABILITY)
        .then(|| *pick(rng, COUPON_TYPES));
    let discount = match coupon {
        Some(_) => f64::from(rng.gen_range(20..=150_u32)).min(subtotal),
        None => 0.0,
    };
    let tip = if rng.gen_bool(TIP_PROBABILITY) {
        f64::from(rng.gen_range(10..=50_u32))
    } else {
        0.0
    };

    let distance = round_to(rng.gen_range(0.5..12.0), 1);
    let base_minutes = f64::from(rng.gen_range(15..=60_u32));
    let delivery_seconds = ((base_minutes + distance * 1.5) * 60.0).round();

    let method = *pick(rng, PAYMENT_METHODS);
    let gateway = (method != "Cash on Delivery").then(|| pick(rng, PAYMENT_GATEWAYS).to_string());

    let fees = delivery_fee + packing_charges + gst + service_tax;
    let total = round_to((subtotal + fees - discount).max(0.0) + tip, 2);

    let mut order = OrderRecord::new(order_time, total);
    order.order_subtotal = Some(subtotal);
    order.items = items;
    order.restaurant_name = restaurant.name.to_string();
    order.restaurant_type = restaurant.cuisines.to_string();
    order.restaurant_city = Some(restaurant.city.to_string());
    order.restaurant_coordinates = Some(Coordinates {
        lat: restaurant.lat,
        lng: restaurant.lng,
    });
    order.customer_distance_km = Some(distance);
    order.on_time = Some(rng.gen_bool(ON_TIME_PROBABILITY));
    order.delivery_time_seconds = Some(delivery_seconds);
    order.delivery_partner_name = Some(pick(rng, DELIVERY_PARTNERS).to_string());
    order.payment_method = Some(method.to_string());
    order.payment_gateway = gateway;
    order.coupon_applied = Some(coupon.is_some());
    order.coupon_type = coupon.map(str::to_string);
    order.discount_amount = (discount > 0.0).then_some(discount);
    order.tip_amount = (tip > 0.0).then_some(tip);
    order.delivery_fee = Some(delivery_fee);
    order.packing_charges = Some(packing_charges);
    order.gst = Some(gst);
    order.service_tax = Some(service_tax);

    if rng.gen_bool(CHARGES_MAP_PROBABILITY) {
        let charges: BTreeMap<String, f64> = FeeKind::ALL
            .iter()
            .map(|kind| (kind.label().to_string(), order.fee(*kind)))
            .filter(|(_, amount)| *amount > 0.0)
            .collect();
        order.charges = Some(charges);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_orders;
    use chrono::{TimeZone, Timelike};

    fn seeded(count: usize, seed: u64) -> SampleConfig {
        SampleConfig {
            count,
            seed: Some(seed),
            months: 12,
            anchor: Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let a = generate_orders(&seeded(50, 42));
        let b = generate_orders(&seeded(50, 42));
        let c = generate_orders(&seeded(50, 43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_count_and_window() {
        let config = seeded(200, 7);
        let orders = generate_orders(&config);
        assert_eq!(orders.len(), 200);

        let earliest = config.anchor - Duration::days(12 * 31);
        for o in &orders {
            assert!(o.order_time <= config.anchor);
            assert!(o.order_time >= earliest);
        }
        assert!(orders.windows(2).all(|w| w[0].order_time <= w[1].order_time));
    }

    #[test]
    fn test_fields_are_populated() {
        let orders = generate_orders(&seeded(200, 11));
        for o in &orders {
            assert!(!o.items.is_empty());
            assert!(o.order_total >= 0.0);
            assert!(o.restaurant_city.is_some());
            assert!(o.delivery_time_seconds.unwrap() >= 15.0 * 60.0);
            assert!(o.items.iter().all(|i| i.is_veg != VegFlag::Unknown));
            assert!(o.discount() <= o.order_subtotal.unwrap());
            // zero-weight hours never appear
            assert!(!(3..=6).contains(&o.local_time().hour()));
        }
        assert!(orders.iter().any(|o| o.charges.is_some()));
        assert!(orders.iter().any(|o| o.charges.is_none()));
        assert!(orders.iter().any(|o| o.used_coupon()));
        assert!(orders.iter().any(|o| o.on_time == Some(false)));
    }

    #[test]
    fn test_sample_survives_the_parser() {
        let orders = generate_orders(&seeded(40, 3));
        let bytes = serde_json::to_vec(&orders).unwrap();
        let parsed = parse_orders(&bytes).unwrap();
        assert_eq!(parsed, orders);
    }

    #[test]
    fn test_zero_count() {
        assert!(generate_orders(&seeded(0, 1)).is_empty());
    }
}
