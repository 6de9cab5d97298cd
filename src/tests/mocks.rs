//! Mock implementations for testing

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

use crate::client::{ApiRequest, HttpResponse, Transport};
use crate::error::Result;
use crate::notify::{Navigator, Notifier};

type Handler = Box<dyn Fn(&ApiRequest) -> Result<HttpResponse> + Send + Sync>;

/// Transport that answers from a handler and records every request it sees
pub struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<ApiRequest>>,
    /// Delay applied to requests whose path ends with `slow_path`
    slow_path: Option<(String, Duration)>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            slow_path: None,
        }
    }

    /// Hold responses for `path` for `delay` (use with a paused clock)
    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.slow_path = Some((path.to_string(), delay));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request.clone());
        if let Some((path, delay)) = &self.slow_path {
            if request.path.ends_with(path.as_str()) {
                tokio::time::sleep(*delay).await;
            }
        }
        (self.handler)(request)
    }
}

/// Notifier that remembers what it displayed
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Navigator that remembers where it was sent
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().push(route.to_string());
    }
}
