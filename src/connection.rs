use crate::error::{ApiError, ApiResult};
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use std::time::Duration;
use std_semaphore::Semaphore;

/// The maximum number of simultaneous HTTP requests allowed.
///
/// Used with a process-wide semaphore so pages refreshing in parallel threads cannot flood
/// the backend.
const SIMULTANEOUS_REQUESTS_LIMIT: isize = 8;

/// HTTP request methods used by the SmartHub API. Bodies travel with the variant.
#[derive(Clone, Debug, PartialEq)]
pub enum HttpMethod {
    Get,
    Put(serde_json::Value),
    Post(serde_json::Value),
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put(_) => "PUT",
            HttpMethod::Post(_) => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Raw response handed back by a [`Transport`].
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The boundary between the client and the network.
///
/// `Err` is reserved for failures that produced no HTTP response at all. Non-success statuses are
/// returned as `Ok(HttpResponse)` and classified by [`send_http_request`].
pub trait Transport: Send + Sync {
    fn send(
        &self,
        method: &HttpMethod,
        url: &str,
        token: Option<&str>,
        params: &[(String, String)],
    ) -> ApiResult<HttpResponse>;
}

lazy_static! {
    static ref SEMAPHORE: Semaphore = Semaphore::new(SIMULTANEOUS_REQUESTS_LIMIT);
}

/// [`Transport`] backed by the blocking `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(ReqwestTransport { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        method: &HttpMethod,
        url: &str,
        token: Option<&str>,
        params: &[(String, String)],
    ) -> ApiResult<HttpResponse> {
        let _guard = SEMAPHORE.access();

        let request_builder = match method {
            HttpMethod::Get => self.client.get(url).query(params),
            HttpMethod::Put(body) => self.client.put(url).json(body),
            HttpMethod::Post(body) => self.client.post(url).json(body),
            HttpMethod::Delete => self.client.delete(url).query(params),
        };
        let request_builder = match token {
            Some(token) => request_builder.bearer_auth(token),
            None => request_builder,
        };

        let response = request_builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }
}

/// Sends a single request and classifies the outcome.
///
/// There is no retry: every call, mutating or not, is one attempt whose result is reported
/// straight back to the caller.
///
/// Returns:
/// - `Ok(String)`: the response body of a 2xx answer (possibly empty).
/// - `Err(ApiError)`: connection failure, or the status mapped through [`ApiError::from_status`].
pub fn send_http_request(
    transport: &dyn Transport,
    method: HttpMethod,
    url: &str,
    token: Option<&str>,
    params: Vec<(String, String)>,
) -> ApiResult<String> {
    log::debug!("{} {}", method.as_str(), url);
    let response = transport.send(&method, url, token, &params).map_err(|e| {
        log::warn!("{} {} failed: {}", method.as_str(), url, e);
        e
    })?;

    if response.is_success() {
        Ok(response.body)
    } else {
        log::warn!("{} {} answered {}", method.as_str(), url, response.status);
        Err(ApiError::from_status(response.status, &response.body))
    }
}

/// Decodes a JSON response body into a typed DTO.
pub fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to decode response: {}", e);
        ApiError::Decode(e.to_string())
    })
}
