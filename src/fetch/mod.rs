//! HTTP acquisition of raw order payloads.

mod basic;
mod bearer;
mod client;

pub use basic::BasicClient;
pub use bearer::BearerAuth;
pub use client::HttpClient;

use anyhow::Result;
use tracing::debug;

/// GETs `url` and returns the body. Non-2xx responses are errors.
#[tracing::instrument(skip(client))]
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    let bytes = resp.bytes().await?.to_vec();
    debug!(bytes = bytes.len(), "Order payload downloaded");
    Ok(bytes)
}

/// True when `source` should be fetched over HTTP rather than read from disk.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://api.example.com/orders"));
        assert!(is_remote("http://localhost:8080/orders.json"));
        assert!(!is_remote("data/orders.json"));
        assert!(!is_remote("httpdocs/orders.json"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_url() {
        let client = BasicClient::new();
        assert!(fetch_bytes(&client, "not a url").await.is_err());
    }
}
