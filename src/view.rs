//! Load lifecycle of one dashboard view.
//!
//! A view starts `Idle`, enters `Loading` while its source is read, and ends
//! in `Ready` with the parsed orders or in `Fallback` with generated sample
//! orders. Nothing is cached between views.

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::analyzers::dashboard::{DashboardReport, DataOrigin, Page};
use crate::error::Result;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::order::OrderRecord;
use crate::parser::parse_orders;
use crate::sample::{SampleConfig, generate_orders};

/// Where raw order bytes come from.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    async fn load(&self) -> AnyResult<Vec<u8>>;
}

pub struct HttpOrderSource<C> {
    client: C,
    url: String,
}

impl<C: HttpClient> HttpOrderSource<C> {
    pub fn new(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> OrderSource for HttpOrderSource<C> {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn load(&self) -> AnyResult<Vec<u8>> {
        fetch_bytes(&self.client, &self.url).await
    }
}

pub struct FileOrderSource {
    path: PathBuf,
}

impl FileOrderSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl OrderSource for FileOrderSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> AnyResult<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading,
    Ready(Vec<OrderRecord>),
    /// Sample orders substituted after the source failed, with the reason.
    Fallback {
        orders: Vec<OrderRecord>,
        reason: String,
    },
}

pub struct DashboardView {
    pages: Vec<Page>,
    sample: SampleConfig,
    state: ViewState,
}

impl DashboardView {
    pub fn new(pages: Vec<Page>, sample: SampleConfig) -> Self {
        Self {
            pages,
            sample,
            state: ViewState::Idle,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Reads `source` and settles the view.
    ///
    /// A missing source, a transport failure, or a payload that is not an
    /// order array switches to sample data. A record with a bad `order_time`
    /// is returned as an error and leaves the view `Idle`.
    #[tracing::instrument(skip_all, fields(pages = self.pages.len()))]
    pub async fn load(&mut self, source: Option<&dyn OrderSource>) -> Result<()> {
        self.state = ViewState::Loading;

        let Some(source) = source else {
            self.fall_back("no order source configured".to_string());
            return Ok(());
        };

        let bytes = match source.load().await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.fall_back(format!("{}: {e:#}", source.describe()));
                return Ok(());
            }
        };

        match parse_orders(&bytes) {
            Ok(orders) => {
                info!(source = %source.describe(), orders = orders.len(), "Orders loaded");
                self.state = ViewState::Ready(orders);
                Ok(())
            }
            Err(e) if e.is_record_error() => {
                self.state = ViewState::Idle;
                Err(e)
            }
            Err(e) => {
                self.fall_back(format!("{}: {e}", source.describe()));
                Ok(())
            }
        }
    }

    fn fall_back(&mut self, reason: String) {
        let orders = generate_orders(&self.sample);
        warn!(
            reason = %reason,
            sample_orders = orders.len(),
            "Order source unavailable, showing sample data"
        );
        self.state = ViewState::Fallback { orders, reason };
    }

    /// Orders of a settled view; empty while `Idle` or `Loading`.
    pub fn orders(&self) -> &[OrderRecord] {
        match &self.state {
            ViewState::Ready(orders) | ViewState::Fallback { orders, .. } => orders,
            ViewState::Idle | ViewState::Loading => &[],
        }
    }

    pub fn origin(&self) -> Option<DataOrigin> {
        match self.state {
            ViewState::Ready(_) => Some(DataOrigin::Live),
            ViewState::Fallback { .. } => Some(DataOrigin::Sample),
            ViewState::Idle | ViewState::Loading => None,
        }
    }

    /// Aggregates every page of the view, once it has settled.
    pub fn report(&self) -> Option<DashboardReport> {
        let origin = self.origin()?;
        Some(DashboardReport::build(origin, self.orders(), &self.pages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightsError;
    use anyhow::anyhow;
    use chrono::{TimeZone, Utc};
    use std::env;

    enum FakeSource {
        Bytes(&'static str),
        Down,
    }

    #[async_trait]
    impl OrderSource for FakeSource {
        fn describe(&self) -> String {
            "fake".to_string()
        }

        async fn load(&self) -> AnyResult<Vec<u8>> {
            match self {
                FakeSource::Bytes(body) => Ok(body.as_bytes().to_vec()),
                FakeSource::Down => Err(anyhow!("connection refused")),
            }
        }
    }

    fn view() -> DashboardView {
        let sample = SampleConfig {
            count: 30,
            seed: Some(5),
            months: 3,
            anchor: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        };
        DashboardView::new(vec![Page::Overview, Page::Delivery], sample)
    }

    #[tokio::test]
    async fn test_ready_on_valid_payload() {
        let mut v = view();
        assert_eq!(v.state(), &ViewState::Idle);
        assert!(v.report().is_none());

        let source =
            FakeSource::Bytes(r#"[{"order_time": "2024-05-01T12:00:00Z", "order_total": 250}]"#);
        v.load(Some(&source)).await.unwrap();

        assert!(matches!(v.state(), ViewState::Ready(o) if o.len() == 1));
        assert_eq!(v.origin(), Some(DataOrigin::Live));
        let report = v.report().unwrap();
        assert_eq!(report.order_count, 1);
        assert_eq!(report.pages.len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_to_sample() {
        let mut v = view();
        v.load(Some(&FakeSource::Down)).await.unwrap();

        match v.state() {
            ViewState::Fallback { orders, reason } => {
                assert_eq!(orders.len(), 30);
                assert!(reason.contains("connection refused"));
            }
            other => panic!("expected fallback, got {:?}", other),
        }
        assert_eq!(v.origin(), Some(DataOrigin::Sample));
    }

    #[tokio::test]
    async fn test_wrong_shape_and_missing_source_fall_back() {
        let mut v = view();
        v.load(Some(&FakeSource::Bytes(r#"{"error": "unauthorized"}"#)))
            .await
            .unwrap();
        assert_eq!(v.origin(), Some(DataOrigin::Sample));

        let mut v = view();
        v.load(None).await.unwrap();
        assert_eq!(v.orders().len(), 30);
    }

    #[tokio::test]
    async fn test_bad_order_time_is_not_masked() {
        let mut v = view();
        let body = r#"[{"order_time": "2024-05-01T12:00:00Z"}, {"order_time": "soon"}]"#;
        let source = FakeSource::Bytes(body);
        let err = v.load(Some(&source)).await.unwrap_err();

        assert!(matches!(err, InsightsError::InvalidOrderTime { index: 1, .. }));
        assert_eq!(v.state(), &ViewState::Idle);
        assert!(v.orders().is_empty());
    }

    #[tokio::test]
    async fn test_file_source() {
        let path = env::temp_dir().join("order_insights_view_test.json");
        std::fs::write(
            &path,
            r#"[{"orderTime": "2024-05-02 19:30:00", "orderTotal": "410"}]"#,
        )
        .unwrap();

        let mut v = view();
        v.load(Some(&FileOrderSource::new(&path))).await.unwrap();
        assert_eq!(v.orders()[0].order_total, 410.0);

        std::fs::remove_file(&path).unwrap();

        let mut v = view();
        v.load(Some(&FileOrderSource::new(&path))).await.unwrap();
        assert_eq!(v.origin(), Some(DataOrigin::Sample));
    }
}
