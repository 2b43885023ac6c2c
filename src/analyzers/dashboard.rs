//! Dispatch from an analytics page to its aggregator, and the combined report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::analyzers::customer::{self, CustomerInsights};
use crate::analyzers::delivery::{self, DeliveryInsights};
use crate::analyzers::financials::{self, FinancialInsights};
use crate::analyzers::geography::{self, GeographyInsights};
use crate::analyzers::overview::{self, OverviewInsights};
use crate::analyzers::payments::{self, PaymentInsights};
use crate::analyzers::restaurants::{self, RestaurantInsights};
use crate::analyzers::time::{self, TimeInsights};
use crate::analyzers::types::CategorySeries;
use crate::order::OrderRecord;

/// One navigable analytics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Overview,
    Time,
    Geography,
    Customer,
    Delivery,
    Restaurants,
    Financials,
    Payments,
}

impl Page {
    pub const ALL: [Page; 8] = [
        Page::Overview,
        Page::Time,
        Page::Geography,
        Page::Customer,
        Page::Delivery,
        Page::Restaurants,
        Page::Financials,
        Page::Payments,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Page::Overview => "overview",
            Page::Time => "time",
            Page::Geography => "geography",
            Page::Customer => "customer",
            Page::Delivery => "delivery",
            Page::Restaurants => "restaurants",
            Page::Financials => "financials",
            Page::Payments => "payments",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Analytics Overview",
            Page::Time => "Time-Based Insights",
            Page::Geography => "Geographic Insights",
            Page::Customer => "Customer Behavior",
            Page::Delivery => "Delivery Insights",
            Page::Restaurants => "Restaurant Insights",
            Page::Financials => "Financial Insights",
            Page::Payments => "Payment & Coupon Insights",
        }
    }
}

/// The series bundle of one page, tagged with the page it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", content = "insights", rename_all = "lowercase")]
pub enum PageReport {
    Overview(OverviewInsights),
    Time(TimeInsights),
    Geography(GeographyInsights),
    Customer(CustomerInsights),
    Delivery(DeliveryInsights),
    Restaurants(RestaurantInsights),
    Financials(FinancialInsights),
    Payments(PaymentInsights),
}

impl PageReport {
    pub fn page(&self) -> Page {
        match self {
            PageReport::Overview(_) => Page::Overview,
            PageReport::Time(_) => Page::Time,
            PageReport::Geography(_) => Page::Geography,
            PageReport::Customer(_) => Page::Customer,
            PageReport::Delivery(_) => Page::Delivery,
            PageReport::Restaurants(_) => Page::Restaurants,
            PageReport::Financials(_) => Page::Financials,
            PageReport::Payments(_) => Page::Payments,
        }
    }

    pub fn categorical(&self) -> Vec<(&'static str, &CategorySeries)> {
        match self {
            PageReport::Overview(i) => i.categorical(),
            PageReport::Time(i) => i.categorical(),
            PageReport::Geography(i) => i.categorical(),
            PageReport::Customer(i) => i.categorical(),
            PageReport::Delivery(i) => i.categorical(),
            PageReport::Restaurants(i) => i.categorical(),
            PageReport::Financials(i) => i.categorical(),
            PageReport::Payments(i) => i.categorical(),
        }
    }
}

/// Where the aggregated orders came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Live,
    Sample,
}

/// Every requested page aggregated over one order history.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub origin: DataOrigin,
    pub order_count: usize,
    pub pages: Vec<PageReport>,
}

impl DashboardReport {
    pub fn build(origin: DataOrigin, orders: &[OrderRecord], pages: &[Page]) -> Self {
        let pages: Vec<PageReport> = pages.iter().map(|p| analyze_page(*p, orders)).collect();
        info!(
            origin = ?origin,
            orders = orders.len(),
            pages = pages.len(),
            "Dashboard report built"
        );
        Self {
            generated_at: Utc::now(),
            origin,
            order_count: orders.len(),
            pages,
        }
    }
}

pub fn analyze_page(page: Page, orders: &[OrderRecord]) -> PageReport {
    match page {
        Page::Overview => PageReport::Overview(overview::aggregate(orders)),
        Page::Time => PageReport::Time(time::aggregate(orders)),
        Page::Geography => PageReport::Geography(geography::aggregate(orders)),
        Page::Customer => PageReport::Customer(customer::aggregate(orders)),
        Page::Delivery => PageReport::Delivery(delivery::aggregate(orders)),
        Page::Restaurants => PageReport::Restaurants(restaurants::aggregate(orders)),
        Page::Financials => PageReport::Financials(financials::aggregate(orders)),
        Page::Payments => PageReport::Payments(payments::aggregate(orders)),
    }
}

pub fn analyze_all(orders: &[OrderRecord]) -> Vec<PageReport> {
    Page::ALL.iter().map(|p| analyze_page(*p, orders)).collect()
}

/// Enumerates a bundle's bar/line/area series by a stable name, for export.
pub trait NamedSeries {
    fn categorical(&self) -> Vec<(&'static str, &CategorySeries)>;
}

impl NamedSeries for OverviewInsights {
    fn categorical(&self) -> Vec<(&'static str, &CategorySeries)> {
        vec![
            ("monthly_orders", &self.monthly_orders),
            ("monthly_revenue", &self.monthly_revenue),
        ]
    }
}

impl NamedSeries for TimeInsights {
    fn categorical(&self) -> Vec<(&'static str, &CategorySeries)> {
        vec![
            ("monthly_orders", &self.monthly_orders),
            ("monthly_revenue", &self.monthly_revenue),
            ("quarterly_orders", &self.quarterly_orders),
            ("quarterly_revenue", &self.quarterly_revenue),
            ("weekday_orders", &self.weekday_orders),
            ("weekday_revenue", &self.weekday_revenue),
            ("hourly_orders", &self.hourly_orders),
            ("cumulative_orders", &self.cumulative_orders),
            ("week_of_month", &self.week_of_month),
        ]
    }
}

impl NamedSeries for GeographyInsights {
    fn categorical(&self) -> Vec<(&'static str, &CategorySeries)> {
        vec![
            ("cumulative_distance", &self.cumulative_distance),
            ("avg_distance_by_city", &self.avg_distance_by_city),
        ]
    }
}

impl NamedSeries for CustomerInsights {
    fn categorical(&self) -> Vec<(&'static str, &CategorySeries)> {
        vec![
            ("top_items", &self.top_items),
            ("items_per_order", &self.items_per_order),
            ("time_of_day", &self.time_of_day),
            ("restaurant_loyalty", &self.restaurant_loyalty),
            ("basket_size_trend", &self.basket_size_trend),
        ]
    }
}

impl NamedSeries for DeliveryInsights {
    fn categorical(&self) -> Vec<(&'static str, &CategorySeries)> {
        vec![
            ("delivery_time_histogram", &self.delivery_time_histogram),
            ("top_partners", &self.top_partners),
            ("monthly_avg_delivery_minutes", &self.monthly_avg_delivery_minutes),
            ("monthly_late_deliveries", &self.monthly_late_deliveries),
        ]
    }
}

impl NamedSeries for RestaurantInsights {
    fn categorical(&self) -> Vec<(&'static str, &CategorySeries)> {
        vec![
            ("top_restaurants", &self.top_restaurants),
            ("top_by_avg_order_value", &self.top_by_avg_order_value),
            ("cuisine_counts", &self.cuisine_counts),
            ("repeat_orders", &self.repeat_orders),
        ]
    }
}

impl NamedSeries for FinancialInsights {
    fn categorical(&self) -> Vec<(&'static str, &CategorySeries)> {
        vec![("monthly_spend", &self.monthly_spend)]
    }
}

impl NamedSeries for PaymentInsights {
    fn categorical(&self) -> Vec<(&'static str, &CategorySeries)> {
        vec![
            ("gateway_usage", &self.gateway_usage),
            ("avg_discount_by_coupon", &self.avg_discount_by_coupon),
            ("monthly_savings", &self.monthly_savings),
        ]
    }
}
