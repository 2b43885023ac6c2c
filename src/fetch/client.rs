use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport seam for order downloads; lets auth wrappers and test doubles
/// stand in for the real client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
