//! Mock API server helpers
//!
//! The mock server runs on its own tokio runtime while the blocking client
//! under test is driven from the test thread.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use deepomatic_api::{Client, ClientConfig, HttpRetry};
use deepomatic_core::{Deadline, RetryPolicy, WaitOptions, WaitPolicy};

pub const API_KEY: &str = "test-api-key";
pub const APP_ID: &str = "test-app";

/// Mock server and the runtime hosting it
pub struct TestServer {
    // Dropped before the runtime
    server: MockServer,
    runtime: Runtime,
}

impl TestServer {
    pub fn start() -> Self {
        let runtime = Runtime::new().expect("failed to build tokio runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Absolute URL of an API path, as returned in `next` links
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/v0.7{}", self.server.uri(), path)
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn received(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// Client with a fast transport retry
    pub fn client(&self) -> Client {
        self.client_with(Some(fast_retry()))
    }

    pub fn client_with(&self, retry: Option<HttpRetry>) -> Client {
        let config = ClientConfig::builder()
            .host(self.uri())
            .api_key(API_KEY)
            .app_id(APP_ID)
            .version("0.7")
            .http_retry(retry)
            .build()
            .expect("valid test configuration");
        Client::new(config).expect("client builds")
    }
}

/// Transport retry waiting 10ms between attempts, for up to 300ms
pub fn fast_retry() -> HttpRetry {
    HttpRetry::new(RetryPolicy::new(
        WaitPolicy::fixed(Duration::from_millis(10)),
        Deadline::after(Duration::from_millis(300)),
    ))
}

/// Task polling every 10ms under the given deadline
pub fn fast_wait(timeout: Duration) -> WaitOptions {
    WaitOptions::new(Deadline::after(timeout)).with_wait(WaitPolicy::fixed(Duration::from_millis(10)))
}

pub fn task_json(id: u64, status: &str) -> Value {
    match status {
        "success" => json!({"id": id, "status": status, "data": {"outputs": [id]}}),
        "error" => json!({"id": id, "status": status, "error": "inference failed"}),
        _ => json!({"id": id, "status": status}),
    }
}

pub fn page_json(results: Vec<Value>, next: Option<String>) -> Value {
    json!({
        "count": results.len(),
        "next": next,
        "previous": null,
        "results": results,
    })
}

/// `GET <api_path>` answering `body` with status 200
pub fn get_json(api_path: &str, body: Value) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/v0.7{}", api_path)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
}

/// `GET <api_path>` answering an empty response with `status`
pub fn get_status(api_path: &str, status: u16) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/v0.7{}", api_path)))
        .respond_with(ResponseTemplate::new(status))
}

/// `GET /tasks/<id>/` answering the task with `status`
pub fn task_mock(id: u64, status: &str) -> Mock {
    get_json(&format!("/tasks/{}/", id), task_json(id, status))
}
