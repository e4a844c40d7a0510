//! Scripted transport for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{FetchRequest, FetchResponse, HttpTransport};
use crate::error::TransportError;

#[derive(Default)]
pub(crate) struct FakeTransport {
    routes: HashMap<String, Result<FetchResponse, TransportError>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Ok(FetchResponse {
                status,
                body: body.to_string(),
                local_ip: None,
            }),
        );
        self
    }

    pub fn failing(mut self, url: &str, err: TransportError) -> Self {
        self.routes.insert(url.to_string(), Err(err));
        self
    }

    pub fn requested_urls(&self) -> Vec<String> {
        match self.requests.lock() {
            Ok(requests) => requests.iter().map(|r| r.url.clone()).collect(),
            Err(poisoned) => poisoned.into_inner().iter().map(|r| r.url.clone()).collect(),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.routes
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Other(format!("no route for {}", request.url))))
    }
}
