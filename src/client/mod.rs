// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! REST plumbing shared by the catalog, job and user APIs.
//!
//! A [`Transport`] moves one JSON request to the service and back. The
//! [`RestClient`] on top of it attaches credentials and maps HTTP status
//! codes onto the crate's error taxonomy.

pub mod http;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthProvider;
use crate::error::{ApiError, Error, Result};

pub use http::{HttpClientConfig, HttpTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A request against the service, relative to its base URL.
///
/// Path segments are kept unencoded; the transport is responsible for
/// percent-encoding them.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub authorization: Option<String>,
    /// Whether the transport may resend the request on failure.
    pub retryable: bool,
}

impl ApiRequest {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
            authorization: None,
            retryable: method == Method::Get,
        }
    }

    pub fn get<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Get, segments)
    }

    pub fn post<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Post, segments)
    }

    pub fn put<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Put, segments)
    }

    pub fn delete<I: IntoIterator<Item = S>, S: Into<String>>(segments: I) -> Self {
        Self::new(Method::Delete, segments)
    }

    pub fn with_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.segments
            .extend(segments.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sends the request at most once, even if it is a `GET`.
    pub fn without_retry(mut self) -> Self {
        self.retryable = false;
        self
    }

    /// Slash-joined path, for logging.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Looks up a query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status code and decoded JSON body (`Null` when empty).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Sends one request and returns the response, whatever its status.
///
/// Implementations fail only for transport-level problems; application
/// errors travel in the returned status code.
pub trait Transport: Send + Sync + fmt::Debug {
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Authenticated JSON client over a [`Transport`].
#[derive(Debug, Clone)]
pub struct RestClient {
    transport: Arc<dyn Transport>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
}

impl RestClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            auth_provider: None,
        }
    }

    /// Sets the authentication provider.
    pub fn with_auth(mut self, auth_provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(auth_provider);
        self
    }

    /// Sends a request and returns the body of a successful response.
    pub fn send(&self, mut request: ApiRequest) -> Result<Value> {
        if let Some(auth) = &self.auth_provider {
            request.authorization = Some(auth.get_auth_header()?);
        }
        let method = request.method;
        let path = request.path();
        let response = self.transport.execute(request)?;
        debug!(%method, %path, status = response.status, "response received");
        check_status(response)
    }

    /// Sends a request and decodes the body into `T`.
    pub fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let body = self.send(request)?;
        Ok(serde_json::from_value(body)?)
    }
}

fn check_status(response: ApiResponse) -> Result<Value> {
    let ApiResponse { status, body } = response;
    if (200..300).contains(&status) {
        return Ok(body);
    }
    let error = ApiError::from_body(status, body);
    Err(match status {
        401 => Error::Authentication(error),
        403 => Error::PermissionDenied(error),
        404 => Error::NotFound(error),
        409 => Error::Conflict(error),
        _ => Error::Api(error),
    })
}


#[cfg(test)]
mod tests {
    use super::mock::ScriptedTransport;
    use super::*;
    use crate::auth::PersonalAccessToken;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get(["api", "v3", "catalog", "by-path"])
            .with_segments(["my space", "a/b"])
            .with_query("offset", 10)
            .with_body(json!({"k": 1}));
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path(), "api/v3/catalog/by-path/my space/a/b");
        assert_eq!(request.segments.len(), 6);
        assert_eq!(request.query_param("offset"), Some("10"));
        assert_eq!(request.query_param("limit"), None);
        assert_eq!(request.body, Some(json!({"k": 1})));
        assert!(request.retryable);
        assert!(!request.without_retry().retryable);
        assert!(!ApiRequest::post(["x"]).retryable);
    }

    #[test]
    fn test_status_mapping() {
        let cases: [(u16, fn(&Error) -> bool); 5] = [
            (401, |e| matches!(e, Error::Authentication(_))),
            (403, |e| matches!(e, Error::PermissionDenied(_))),
            (404, |e| matches!(e, Error::NotFound(_))),
            (409, |e| matches!(e, Error::Conflict(_))),
            (500, |e| matches!(e, Error::Api(_))),
        ];
        for (status, check) in cases {
            let (client, _) = ScriptedTransport::new()
                .respond(status, json!({"errorMessage": "nope"}))
                .into_client();
            let error = client.send(ApiRequest::get(["x"])).unwrap_err();
            assert!(check(&error), "status {status} mapped to {error:?}");
            assert_eq!(error.api_error().unwrap().message, "nope");
        }
    }

    #[test]
    fn test_auth_header_attached() {
        let (client, transport) = ScriptedTransport::new()
            .respond(200, json!({"ok": true}))
            .into_client();
        let client = client.with_auth(Arc::new(PersonalAccessToken::new("pat").unwrap()));
        let body = client.send(ApiRequest::get(["x"])).unwrap();
        assert_eq!(body, json!({"ok": true}));
        assert_eq!(
            transport.requests()[0].authorization.as_deref(),
            Some("Bearer pat")
        );
    }

    #[test]
    fn test_transport_error_passes_through() {
        let (client, _) = ScriptedTransport::new()
            .fail(Error::network("connection reset"))
            .into_client();
        assert!(matches!(
            client.send(ApiRequest::get(["x"])),
            Err(Error::Network(_))
        ));
    }
}
