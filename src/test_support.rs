//! In-memory transport used by unit tests.

use crate::connection::{HttpMethod, HttpResponse, Transport};
use crate::error::{ApiError, ApiResult};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Clone, Debug)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub token: Option<String>,
    pub params: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<ApiResult<HttpResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn respond_json(&self, status: u16, body: serde_json::Value) {
        self.respond(status, &body.to_string());
    }

    pub fn fail(&self, err: ApiError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Transport for FakeTransport {
    fn send(
        &self,
        method: &HttpMethod,
        url: &str,
        token: Option<&str>,
        params: &[(String, String)],
    ) -> ApiResult<HttpResponse> {
        let body = match method {
            HttpMethod::Put(body) | HttpMethod::Post(body) => Some(body.clone()),
            HttpMethod::Get | HttpMethod::Delete => None,
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.as_str().to_string(),
            url: url.to_string(),
            token: token.map(String::from),
            params: params.to_vec(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Connection("no response queued".to_string())))
    }
}

/// Logs a user with the given backend role string in through `transport`.
pub(crate) fn session_for(transport: &std::sync::Arc<FakeTransport>, role: &str) -> crate::Session {
    transport.respond_json(
        200,
        serde_json::json!({
            "token": "test-token",
            "user": { "id": 42, "username": "tester", "role": role }
        }),
    );
    crate::Session::login(transport.clone(), "http://hub/api", "tester", "secret").unwrap()
}
