//! Scripted HTTP client for offline adapter tests.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use quotefeed_core::{HttpClient, HttpError, HttpRequest, HttpResponse};

#[derive(Clone, Default)]
pub(crate) struct ScriptedHttpClient {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    responses: HashMap<String, HttpResponse>,
    one_shots: HashMap<String, Vec<HttpResponse>>,
    requests: Vec<HttpRequest>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the response returned for every request to `url`.
    pub fn on_url(self, url: &str, status: u16, body: &str) -> Self {
        self.inner.lock().unwrap().responses.insert(
            url.to_owned(),
            HttpResponse {
                status,
                body: body.to_owned(),
            },
        );
        self
    }

    /// Registers a response consumed by the next request to `url`,
    /// taking precedence over [`ScriptedHttpClient::on_url`] entries.
    pub fn on_url_once(self, url: &str, status: u16, body: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .one_shots
            .entry(url.to_owned())
            .or_default()
            .push(HttpResponse {
                status,
                body: body.to_owned(),
            });
        self
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(request.clone());
        let response = match inner.one_shots.get_mut(&request.url) {
            Some(queue) if !queue.is_empty() => Ok(queue.remove(0)),
            _ => match inner.responses.get(&request.url) {
                Some(response) => Ok(response.clone()),
                None => Err(HttpError::non_retryable(format!(
                    "no scripted response for {}",
                    request.url
                ))),
            },
        };
        Box::pin(async move { response })
    }
}
