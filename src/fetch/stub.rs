use async_trait::async_trait;
use reqwest::{Request, Response};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::HttpClient;

/// Answers every request with a fixed status and body and counts the calls.
pub struct StubClient {
    status: u16,
    body: &'static str,
    calls: AtomicUsize,
}

impl StubClient {
    pub fn new(status: u16, body: &'static str) -> Self {
        StubClient {
            status,
            body,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for StubClient {
    async fn execute(&self, _req: Request) -> reqwest::Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let resp = http::Response::builder()
            .status(self.status)
            .body(self.body)
            .expect("stub response is valid");
        Ok(Response::from(resp))
    }
}
