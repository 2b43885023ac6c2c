//! Payment methods, gateways, and coupon savings.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::analyzers::financials::coupon_split;
use crate::analyzers::month_frame;
use crate::analyzers::types::{CategorySeries, LabeledSeries};
use crate::analyzers::utility::{frequency, grouped_average, pct, rank_desc, sort_desc_by_value};
use crate::order::OrderRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentInsights {
    pub method_distribution: LabeledSeries,
    pub gateway_usage: CategorySeries,
    pub coupon_split: LabeledSeries,
    /// Mean discount per coupon type over orders with a positive discount.
    pub avg_discount_by_coupon: CategorySeries,
    pub monthly_savings: CategorySeries,
    pub coupon_usage_rate: f64,
    pub total_savings: f64,
}

#[instrument(skip(orders), fields(orders = orders.len()))]
pub fn aggregate(orders: &[OrderRecord]) -> PaymentInsights {
    let methods = rank_desc(frequency(orders, |o| o.payment_method_label().to_string()));
    let gateways = rank_desc(frequency(orders, |o| o.payment_gateway_label().to_string()));

    let mut avg_discount = grouped_average(
        orders
            .iter()
            .filter(|o| o.discount() > 0.0)
            .map(|o| (o.coupon_type_label().to_string(), o.discount())),
    );
    sort_desc_by_value(&mut avg_discount);

    let mut savings = month_frame(orders);
    for order in orders {
        *savings.entry(order.month_key()).or_insert(0.0) += order.discount();
    }

    let coupon_split = coupon_split(orders);
    let applied = orders.iter().filter(|o| o.used_coupon()).count();

    let insights = PaymentInsights {
        method_distribution: LabeledSeries::ranked_counts(methods),
        gateway_usage: CategorySeries::from_counts(gateways),
        coupon_split,
        avg_discount_by_coupon: CategorySeries::from_pairs(avg_discount),
        monthly_savings: CategorySeries::from_pairs(savings),
        coupon_usage_rate: pct(applied, orders.len()),
        total_savings: orders.iter().map(OrderRecord::discount).sum(),
    };

    debug!(
        methods = insights.method_distribution.labels.len(),
        coupons_applied = applied,
        "Payment insights aggregated"
    );
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::fixtures::order;

    fn paid(
        ts: &str,
        method: Option<&str>,
        coupon: Option<&str>,
        discount: Option<f64>,
    ) -> OrderRecord {
        let mut o = order(ts, 300.0);
        o.payment_method = method.map(str::to_string);
        o.payment_gateway = method.map(|_| "Razorpay".to_string());
        o.coupon_type = coupon.map(str::to_string);
        o.discount_amount = discount;
        o
    }

    #[test]
    fn test_average_discount_ignores_zero_discounts() {
        let orders = vec![
            paid("2024-01-01T12:00:00Z", Some("UPI"), Some("FLAT"), Some(100.0)),
            paid("2024-01-02T12:00:00Z", Some("UPI"), Some("FLAT"), Some(0.0)),
            paid("2024-02-03T12:00:00Z", Some("Card"), Some("BOGO"), Some(50.0)),
        ];
        let p = aggregate(&orders);
        assert_eq!(p.avg_discount_by_coupon.categories, ["FLAT", "BOGO"]);
        assert_eq!(p.avg_discount_by_coupon.values, [100.0, 50.0]);
        assert_eq!(p.monthly_savings.categories, ["2024-01", "2024-02"]);
        assert_eq!(p.monthly_savings.values, [100.0, 50.0]);
        assert_eq!(p.total_savings, 150.0);
    }

    #[test]
    fn test_method_and_gateway_distributions() {
        let orders = vec![
            paid("2024-01-01T12:00:00Z", Some("UPI"), None, None),
            paid("2024-01-02T12:00:00Z", Some("UPI"), None, None),
            paid("2024-01-03T12:00:00Z", None, None, None),
        ];
        let p = aggregate(&orders);
        assert_eq!(p.method_distribution.labels, ["UPI", "Unknown"]);
        assert_eq!(p.method_distribution.values, [2.0, 1.0]);
        assert_eq!(p.gateway_usage.categories, ["Razorpay", "Unknown"]);
        assert_eq!(p.coupon_split.values, [0.0, 3.0]);
        assert_eq!(p.coupon_usage_rate, 0.0);
    }

    #[test]
    fn test_empty_input() {
        let p = aggregate(&[]);
        assert!(p.method_distribution.labels.is_empty());
        assert!(p.gateway_usage.is_empty());
        assert!(p.avg_discount_by_coupon.is_empty());
        assert!(p.monthly_savings.is_empty());
        assert_eq!(p.coupon_usage_rate, 0.0);
    }
}
