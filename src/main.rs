//! CLI entry point for Order Insights.
//!
//! Provides subcommands for building dashboard reports from an order history,
//! generating sample data, and logging a one-line summary.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use order_insights::analyzers::calendar::{WEEKDAY_NAMES, hour_label};
use order_insights::analyzers::dashboard::{Page, PageReport, analyze_page};
use order_insights::analyzers::geography::peak_cells;
use order_insights::{
    config::InsightsConfig,
    fetch::{BasicClient, BearerAuth, is_remote},
    output::{append_record, export_series_csv, write_json},
    sample::{SampleConfig, generate_orders},
    view::{DashboardView, FileOrderSource, HttpOrderSource, OrderSource},
};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "order_insights")]
#[command(about = "Analytics over a personal food-delivery order history", long_about = None)]
struct Cli {
    /// JSON config file; environment variables override its values
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate one or all dashboard pages and emit the series as JSON
    Report {
        /// URL or file path of the order history (sample data when absent)
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Pages to aggregate; repeat the flag for several (default: all)
        #[arg(short, long, value_enum)]
        page: Vec<Page>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also export every categorical series as CSV into this directory
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Seed for sample data if the source is unavailable
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate a synthetic order history in the source JSON shape
    Sample {
        /// Number of orders
        #[arg(short = 'n', long)]
        count: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Months of history before now
        #[arg(short, long)]
        months: Option<u32>,

        /// Write orders here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Log the headline numbers of an order history
    Summary {
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// CSV file to append the summary row to
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => InsightsConfig::load(path)?.with_overrides(|key| std::env::var(key).ok())?,
        None => InsightsConfig::from_env()?,
    };

    // Logging setup: colored stderr + JSON rolling log file
    let log_path = Path::new(&config.log_file_path);
    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = log_path
        .file_name()
        .unwrap_or(OsStr::new("order_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    match cli.command {
        Commands::Report {
            source,
            page,
            output,
            csv_dir,
            seed,
        } => {
            let pages = if page.is_empty() { Page::ALL.to_vec() } else { page };
            let source = source.or(config.source.clone());
            let sample = sample_config(&config).with_seed(seed.or(config.sample_seed));

            let mut view = DashboardView::new(pages, sample);
            let order_source = order_source(source.as_deref(), config.api_token.as_deref())?;
            view.load(order_source.as_deref()).await?;

            let Some(report) = view.report() else {
                anyhow::bail!("view did not settle after loading");
            };

            if let Some(dir) = csv_dir {
                for page_report in &report.pages {
                    let files = export_series_csv(&dir, page_report)?;
                    info!(
                        page = page_report.page().title(),
                        files = files.len(),
                        dir = %dir.display(),
                        "Series CSVs exported"
                    );
                }
            }

            match output {
                Some(path) => write_json(&path, &report)?,
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Sample {
            count,
            seed,
            months,
            output,
        } => {
            let mut sample = sample_config(&config)
                .with_count(count.unwrap_or(config.sample_count))
                .with_seed(seed.or(config.sample_seed));
            if let Some(months) = months {
                sample.months = months;
            }

            let orders = generate_orders(&sample);
            match output {
                Some(path) => write_json(&path, &orders)?,
                None => println!("{}", serde_json::to_string_pretty(&orders)?),
            }
        }
        Commands::Summary { source, history } => {
            let source = source.or(config.source.clone());
            let pages = vec![Page::Overview, Page::Geography];
            let mut view = DashboardView::new(pages, sample_config(&config));
            let order_source = order_source(source.as_deref(), config.api_token.as_deref())?;
            view.load(order_source.as_deref()).await?;

            let row = summarize(&view)?;
            if let Some(path) = history {
                append_record(&path, &row)?;
            }
        }
    }

    Ok(())
}

fn sample_config(config: &InsightsConfig) -> SampleConfig {
    SampleConfig {
        count: config.sample_count,
        seed: config.sample_seed,
        months: config.sample_months,
        anchor: Utc::now(),
    }
}

/// Picks HTTP or file loading from the shape of `source`.
fn order_source(
    source: Option<&str>,
    api_token: Option<&str>,
) -> Result<Option<Box<dyn OrderSource>>> {
    let Some(source) = source else {
        return Ok(None);
    };
    let boxed: Box<dyn OrderSource> = match (is_remote(source), api_token) {
        (true, Some(token)) => Box::new(HttpOrderSource::new(
            BearerAuth::new(BasicClient::new(), token)?,
            source,
        )),
        (true, None) => Box::new(HttpOrderSource::new(BasicClient::new(), source)),
        (false, _) => Box::new(FileOrderSource::new(source)),
    };
    Ok(Some(boxed))
}

#[derive(Serialize)]
struct SummaryRow {
    generated_at: String,
    origin: String,
    total_orders: usize,
    total_revenue: f64,
    avg_order_value: f64,
    on_time_rate: f64,
    avg_delivery_minutes: f64,
    total_distance_km: f64,
    top_restaurant_type: String,
    top_payment_method: String,
}

fn summarize(view: &DashboardView) -> Result<SummaryRow> {
    let orders = view.orders();
    let origin = view
        .origin()
        .map(|o| format!("{o:?}").to_lowercase())
        .unwrap_or_default();

    let PageReport::Overview(overview) = analyze_page(Page::Overview, orders) else {
        anyhow::bail!("overview page returned another bundle");
    };

    info!(
        origin = %origin,
        total_orders = overview.total_orders,
        total_revenue = overview.total_revenue,
        avg_order_value = overview.avg_order_value,
        on_time_rate = overview.on_time_rate,
        avg_delivery_minutes = overview.avg_delivery_minutes,
        distinct_restaurants = overview.distinct_restaurants,
        top_restaurant_type = overview.top_restaurant_type.as_deref().unwrap_or("-"),
        top_payment_method = overview.top_payment_method.as_deref().unwrap_or("-"),
        "Order history summary"
    );

    if let PageReport::Geography(geo) = analyze_page(Page::Geography, orders) {
        for (city, (day, hour)) in peak_cells(&geo.heatmaps) {
            info!(
                city = %city,
                day = WEEKDAY_NAMES[day],
                hour = %hour_label(hour),
                "Busiest ordering slot"
            );
        }
    }

    if overview.total_orders == 0 {
        warn!("Order history is empty");
    }

    Ok(SummaryRow {
        generated_at: Utc::now().to_rfc3339(),
        origin,
        total_orders: overview.total_orders,
        total_revenue: overview.total_revenue,
        avg_order_value: overview.avg_order_value,
        on_time_rate: overview.on_time_rate,
        avg_delivery_minutes: overview.avg_delivery_minutes,
        total_distance_km: overview.total_distance_km,
        top_restaurant_type: overview.top_restaurant_type.unwrap_or_default(),
        top_payment_method: overview.top_payment_method.unwrap_or_default(),
    })
}
