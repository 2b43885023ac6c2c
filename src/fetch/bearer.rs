use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// An [`HttpClient`] wrapper that sends `Authorization: Bearer <token>` on
/// every request, for order endpoints behind a personal access token.
pub struct BearerAuth<C> {
    inner: C,
    value: HeaderValue,
}

impl<C> BearerAuth<C> {
    /// Fails when the token cannot be carried in a header.
    pub fn new(inner: C, token: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .context("API token contains characters not allowed in a header")?;
        value.set_sensitive(true);
        Ok(Self { inner, value })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for BearerAuth<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut().insert(AUTHORIZATION, self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    #[test]
    fn test_rejects_token_with_newline() {
        assert!(BearerAuth::new(BasicClient::new(), "abc\ndef").is_err());
        assert!(BearerAuth::new(BasicClient::new(), " abc123 ").is_ok());
    }
}
