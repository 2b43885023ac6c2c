//! Spending breakdown: fees, taxes, discounts, and tips.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::analyzers::types::{CategorySeries, LabeledSeries, NEUTRAL_COLOR, PALETTE};
use crate::order::{FeeKind, OrderRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialInsights {
    /// Delivery Fee, Packing Charges, GST, and Service Tax totals.
    pub fee_breakdown: LabeledSeries,
    /// Food cost, delivery fees, packing charges, taxes, and discounts.
    /// Discounts are a positive slice, not netted off.
    pub spend_summary: LabeledSeries,
    pub coupon_split: LabeledSeries,
    pub monthly_spend: CategorySeries,
    pub total_tips: f64,
    pub total_spend: f64,
    pub total_discounts: f64,
    pub total_fees: f64,
}

/// Applied/not-applied coupon distribution, shared with the payments page.
pub(crate) fn coupon_split(orders: &[OrderRecord]) -> LabeledSeries {
    let applied = orders.iter().filter(|o| o.used_coupon()).count();
    LabeledSeries::fixed(&[
        ("Coupon Applied", applied as f64, PALETTE[0]),
        ("No Coupon", (orders.len() - applied) as f64, NEUTRAL_COLOR),
    ])
}

#[instrument(skip(orders), fields(orders = orders.len()))]
pub fn aggregate(orders: &[OrderRecord]) -> FinancialInsights {
    let fee_total = |kind: FeeKind| orders.iter().map(|o| o.fee(kind)).sum::<f64>();

    let delivery = fee_total(FeeKind::DeliveryFee);
    let packing = fee_total(FeeKind::PackingCharges);
    let gst = fee_total(FeeKind::Gst);
    let service_tax = fee_total(FeeKind::ServiceTax);

    let fee_breakdown = LabeledSeries::ranked(
        FeeKind::ALL
            .iter()
            .zip([delivery, packing, gst, service_tax])
            .map(|(kind, total)| (kind.label(), total)),
    );

    let food_cost: f64 = orders.iter().map(OrderRecord::food_cost).sum();
    let total_discounts: f64 = orders.iter().map(OrderRecord::discount).sum();
    let spend_summary = LabeledSeries::ranked([
        ("Food Cost", food_cost),
        ("Delivery Fees", delivery),
        ("Packing Charges", packing),
        ("Taxes", gst + service_tax),
        ("Discounts", total_discounts),
    ]);

    let mut monthly: BTreeMap<String, f64> = BTreeMap::new();
    for order in orders {
        *monthly.entry(order.month_key()).or_insert(0.0) += order.order_total;
    }

    let insights = FinancialInsights {
        fee_breakdown,
        spend_summary,
        coupon_split: coupon_split(orders),
        monthly_spend: CategorySeries::from_pairs(monthly),
        total_tips: orders.iter().map(OrderRecord::tip).sum(),
        total_spend: orders.iter().map(|o| o.order_total).sum(),
        total_discounts,
        total_fees: delivery + packing + gst + service_tax,
    };

    debug!(
        total_spend = insights.total_spend,
        total_fees = insights.total_fees,
        "Financial insights aggregated"
    );
    insights
}
