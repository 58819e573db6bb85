mod basic;
mod bearer;
mod client;
#[cfg(test)]
pub(crate) mod stub;

pub use basic::BasicClient;
pub use bearer::BearerAuth;
pub use client::HttpClient;

use anyhow::{Result, bail};
use tracing::debug;

/// GETs `url` and returns the body. Non-success status codes are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("GET {url} returned status {status}");
    }

    let bytes = resp.bytes().await?;
    debug!(url, bytes = bytes.len(), "Fetched source");
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let client = BasicClient::new();
        assert!(fetch_bytes(&client, "not a url").await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let client = stub::StubClient::new(404, "Not Found");
        let err = fetch_bytes(&client, "https://example.com/missing.csv")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let client = stub::StubClient::new(200, "date,time\n");
        let bytes = fetch_bytes(&client, "https://example.com/a.csv").await.unwrap();
        assert_eq!(bytes, b"date,time\n");
    }
}
