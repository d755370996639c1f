//! Traefik API client.
//!
//! # Responsibilities
//! - Build the router listing URL from an upstream's admin URL
//! - Fetch every page of `GET /api/http/routers`
//! - Classify failures (transport, status, decoding)
//!
//! # Design Decisions
//! - One `reqwest::Client` is shared by all upstreams (connection pooling)
//! - The timeout is enforced by the shared client, per request
//! - No retries: the next poll cycle is the retry

use std::time::Duration;

use reqwest::header::HeaderMap;
use url::Url;

use crate::upstream::types::{RemoteRouter, UpstreamError};

/// Per-request timeout for upstream calls.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Routers requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Header Traefik uses to announce the next page (`1` once exhausted).
pub const NEXT_PAGE_HEADER: &str = "x-next-page";

const MAX_PAGES: u32 = 1000;
const BODY_PREVIEW_CHARS: usize = 200;

/// Build the HTTP client shared by every upstream.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("traefik-fed/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Client for one upstream's administrative API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    routers_url: Url,
}

impl UpstreamClient {
    /// Create a client for the Traefik instance whose admin API lives at `admin_url`.
    pub fn new(http: reqwest::Client, admin_url: &str) -> Result<Self, UpstreamError> {
        let raw = format!("{}/api/http/routers", admin_url.trim_end_matches('/'));
        let routers_url = Url::parse(&raw).map_err(|source| UpstreamError::InvalidEndpoint {
            url: admin_url.to_string(),
            source,
        })?;

        Ok(Self { http, routers_url })
    }

    /// Fetch the complete router list, following pagination.
    pub async fn fetch_routers(&self) -> Result<Vec<RemoteRouter>, UpstreamError> {
        let mut routers = Vec::new();
        let mut page = 1;

        loop {
            let (batch, next) = self.fetch_page(page).await?;
            routers.extend(batch);

            match next {
                Some(next) if next > page && next <= MAX_PAGES => page = next,
                _ => break,
            }
        }

        Ok(routers)
    }

    async fn fetch_page(&self, page: u32) -> Result<(Vec<RemoteRouter>, Option<u32>), UpstreamError> {
        tracing::debug!(url = %self.routers_url, page, "Fetching routers");

        let response = self
            .http
            .get(self.routers_url.clone())
            .query(&[("page", page), ("per_page", PAGE_SIZE)])
            .send()
            .await?;

        let status = response.status();
        let next = next_page(response.headers());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::BadResponse {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let routers = serde_json::from_str(&body).map_err(|e| UpstreamError::Malformed {
            message: format!(
                "{e} (body preview: {:?})",
                body.chars().take(BODY_PREVIEW_CHARS).collect::<String>()
            ),
            body,
        })?;

        Ok((routers, next))
    }
}

fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(NEXT_PAGE_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
