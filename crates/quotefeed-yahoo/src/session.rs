//! Yahoo Finance cookie/crumb session management.
//!
//! Yahoo's unofficial endpoints require:
//! 1. Session cookies from fc.yahoo.com (held by the transport's
//!    cookie store)
//! 2. A crumb token from query1.finance.yahoo.com/v1/test/getcrumb,
//!    passed as a query parameter on data requests
//!
//! The crumb is cached with a TTL and is only re-fetched when it
//! expires or a caller invalidates it after an auth rejection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::debug;

use quotefeed_core::{
    send_with_retry, HttpClient, HttpRequest, HttpResponse, RetryConfig, SourceError,
};

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const REFERER: &str = "https://finance.yahoo.com/";

const DEFAULT_TTL_SECS: u64 = 3_600;

/// Cached Yahoo session state shared by the source adapters.
#[derive(Clone)]
pub struct YahooSession {
    http: Arc<dyn HttpClient>,
    crumb: Arc<Mutex<Option<String>>>,
    last_refresh: Arc<Mutex<Option<Instant>>>,
    refreshing: Arc<AtomicBool>,
    ttl_secs: u64,
    retry: RetryConfig,
}

impl YahooSession {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            crumb: Arc::new(Mutex::new(None)),
            last_refresh: Arc::new(Mutex::new(None)),
            refreshing: Arc::new(AtomicBool::new(false)),
            ttl_secs: DEFAULT_TTL_SECS,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn http(&self) -> &Arc<dyn HttpClient> {
        &self.http
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    fn is_valid(&self) -> bool {
        let crumb = self.crumb.lock().unwrap();
        let last_refresh = self.last_refresh.lock().unwrap();
        if crumb.is_none() {
            return false;
        }
        match *last_refresh {
            Some(last) => last.elapsed().as_secs() < self.ttl_secs,
            None => false,
        }
    }

    /// Drops the cached crumb so the next call refreshes.
    pub fn invalidate(&self) {
        *self.crumb.lock().unwrap() = None;
        *self.last_refresh.lock().unwrap() = None;
    }

    /// Current crumb, refreshing the session first if the cache is
    /// empty or past its TTL.
    pub async fn crumb(&self) -> Result<String, SourceError> {
        if self.is_valid() {
            if let Some(crumb) = self.crumb.lock().unwrap().clone() {
                return Ok(crumb);
            }
        }
        self.refresh().await?;
        self.crumb
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SourceError::unavailable("failed to obtain Yahoo crumb"))
    }

    async fn refresh(&self) -> Result<(), SourceError> {
        // Best-effort guard against concurrent refresh storms.
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            if self.is_valid() {
                return Ok(());
            }
        }
        let result = self.do_refresh().await;
        self.refreshing.store(false, Ordering::SeqCst);
        result
    }

    async fn do_refresh(&self) -> Result<(), SourceError> {
        debug!("refreshing Yahoo session");
        let cookie_request = HttpRequest::get(COOKIE_URL)
            .with_header("referer", REFERER)
            .with_timeout_ms(10_000);
        self.http.execute(cookie_request).await.map_err(|e| {
            SourceError::unavailable(format!("failed to fetch Yahoo cookie: {}", e.message()))
        })?;

        for endpoint in CRUMB_URLS {
            let crumb_request = HttpRequest::get(endpoint)
                .with_header("referer", REFERER)
                .with_timeout_ms(10_000);
            let Ok(response) = self.http.execute(crumb_request).await else {
                continue;
            };
            if !response.is_success() || response.body.is_empty() {
                continue;
            }
            let body = response.body.trim();
            // Error pages come back as HTML with a 200 status.
            if body.contains("<html") || body.contains("<!DOCTYPE") {
                continue;
            }
            if body.to_lowercase().contains("too many requests") {
                return Err(SourceError::rate_limited(
                    "Yahoo rate limited while fetching crumb",
                ));
            }
            if !body.is_empty() && body.len() < 100 && !body.contains(' ') {
                *self.crumb.lock().unwrap() = Some(body.to_owned());
                *self.last_refresh.lock().unwrap() = Some(Instant::now());
                return Ok(());
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch Yahoo crumb from all endpoints",
        ))
    }

    /// Executes a crumb-authenticated GET. The URL is built from the
    /// current crumb; a 401 or 429 invalidates the session, refreshes
    /// once, rebuilds the URL with the fresh crumb and retries once.
    pub async fn get_with_crumb(
        &self,
        build_url: impl Fn(&str) -> String,
    ) -> Result<HttpResponse, SourceError> {
        let crumb = self.crumb().await?;
        let request = HttpRequest::get(build_url(&crumb))
            .with_header("referer", REFERER)
            .with_timeout_ms(10_000);
        let response = send_with_retry(self.http.as_ref(), request, &self.retry)
            .await
            .map_err(|e| {
                SourceError::unavailable(format!("yahoo transport error: {}", e.message()))
            })?;

        if response.status == 401 || response.status == 429 {
            debug!(status = response.status, "auth rejected, refreshing session");
            self.invalidate();
            let crumb = self.crumb().await?;
            let retry_request = HttpRequest::get(build_url(&crumb))
                .with_header("referer", REFERER)
                .with_timeout_ms(10_000);
            let retry_response = self
                .http
                .execute(retry_request)
                .await
                .map_err(|e| {
                    SourceError::unavailable(format!(
                        "yahoo transport error on retry: {}",
                        e.message()
                    ))
                })?;
            if !retry_response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {} after session refresh",
                    retry_response.status
                )));
            }
            return Ok(retry_response);
        }

        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {}",
                response.status
            )));
        }
        Ok(response)
    }

    /// Executes a plain GET against a page endpoint (no crumb).
    pub async fn get_page(&self, url: &str) -> Result<HttpResponse, SourceError> {
        let request = HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_timeout_ms(10_000);
        let response = send_with_retry(self.http.as_ref(), request, &self.retry)
            .await
            .map_err(|e| {
                SourceError::unavailable(format!("yahoo transport error: {}", e.message()))
            })?;
        if response.status == 429 {
            return Err(SourceError::rate_limited("yahoo returned status 429"));
        }
        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {}",
                response.status
            )));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScriptedHttpClient;

    fn session(client: ScriptedHttpClient) -> YahooSession {
        YahooSession::new(Arc::new(client)).with_retry(RetryConfig::no_retry())
    }

    #[tokio::test]
    async fn crumb_is_cached_until_invalidated() {
        let client = ScriptedHttpClient::new()
            .on_url(COOKIE_URL, 200, "")
            .on_url(CRUMB_URLS[0], 200, "abc123");
        let session = session(client.clone());

        assert_eq!(session.crumb().await.expect("crumb"), "abc123");
        assert_eq!(session.crumb().await.expect("cached"), "abc123");
        // One cookie fetch and one crumb fetch, despite two calls.
        assert_eq!(client.request_count(), 2);

        session.invalidate();
        assert_eq!(session.crumb().await.expect("refreshed"), "abc123");
        assert_eq!(client.request_count(), 4);
    }

    #[tokio::test]
    async fn expired_ttl_triggers_refresh() {
        let client = ScriptedHttpClient::new()
            .on_url(COOKIE_URL, 200, "")
            .on_url(CRUMB_URLS[0], 200, "abc123");
        let session = session(client.clone()).with_ttl_secs(0);

        session.crumb().await.expect("first");
        session.crumb().await.expect("second");
        // TTL of zero means every call refreshes.
        assert_eq!(client.request_count(), 4);
    }

    #[tokio::test]
    async fn html_crumb_bodies_fall_through_to_next_endpoint() {
        let client = ScriptedHttpClient::new()
            .on_url(COOKIE_URL, 200, "")
            .on_url(CRUMB_URLS[0], 200, "<!DOCTYPE html><html>consent</html>")
            .on_url(CRUMB_URLS[1], 200, "zxy987");
        let session = session(client);
        assert_eq!(session.crumb().await.expect("crumb"), "zxy987");
    }

    #[tokio::test]
    async fn auth_rejection_refreshes_once_and_retries() {
        let client = ScriptedHttpClient::new()
            .on_url(COOKIE_URL, 200, "")
            .on_url(CRUMB_URLS[0], 200, "crumb-1")
            .on_url_once("https://data.test/q?crumb=crumb-1", 401, "")
            .on_url("https://data.test/q?crumb=crumb-1", 200, "payload");
        let session = session(client.clone());

        let response = session
            .get_with_crumb(|crumb| format!("https://data.test/q?crumb={crumb}"))
            .await
            .expect("should recover after refresh");
        assert_eq!(response.body, "payload");
        // cookie + crumb, 401 data call, cookie + crumb again, retried data call.
        assert_eq!(client.request_count(), 6);
    }
}
