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

//! HTTP transport for the Dremio REST API.

use std::time::Duration;

use reqwest::{header, Client, Response};
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::{instrument, warn};
use url::Url;

use super::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::{Error, Result};

/// Configuration for the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpClientConfig {
    /// Request timeout duration.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Maximum number of retry attempts for read-only requests.
    pub max_retries: u32,
    /// Delay before the first retry; later retries wait proportionally longer.
    pub retry_base_delay: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            user_agent: format!("dremio-adbc-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Blocking HTTP transport.
///
/// Owns a current-thread Tokio runtime and blocks on every request, so it
/// must not be used from within another Tokio runtime. Only requests marked
/// retryable (by default every `GET`) are retried; mutations are sent
/// exactly once.
#[derive(Debug)]
pub struct HttpTransport {
    config: HttpClientConfig,
    base_url: Url,
    client: Client,
    runtime: Runtime,
}

impl HttpTransport {
    /// Creates a new HTTP transport rooted at `base_url`.
    pub fn new(base_url: Url, config: HttpClientConfig) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfiguration(format!(
                "{base_url} cannot be used as a base URL"
            )));
        }
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(Error::network)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::network)?;

        Ok(Self {
            config,
            base_url,
            client,
            runtime,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidConfiguration(format!("invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    async fn execute_with_retry(&self, request: &ApiRequest, url: &Url) -> Result<Response> {
        let max_retries = if request.retryable {
            self.config.max_retries
        } else {
            0
        };

        for retry in 0..=max_retries {
            let mut builder = self.client.request(request.method.into(), url.clone());
            if let Some(authorization) = &request.authorization {
                builder = builder.header(header::AUTHORIZATION, authorization);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            match builder.send().await {
                Ok(response) if !response.status().is_server_error() => return Ok(response),
                Ok(response) if retry < max_retries => {
                    warn!(
                        "Server error {}, retrying (attempt {}/{})",
                        response.status(),
                        retry + 1,
                        max_retries
                    );
                }
                // the caller maps the status and keeps the error body
                Ok(response) => return Ok(response),
                Err(e) if retry < max_retries => {
                    warn!(
                        "Request failed, retrying (attempt {}/{}): {}",
                        retry + 1,
                        max_retries,
                        e
                    );
                }
                Err(e) => return Err(Error::network(e)),
            }

            tokio::time::sleep(self.config.retry_base_delay * (retry + 1)).await;
        }

        Err(Error::network("retries exhausted"))
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path()))]
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request)?;
        self.runtime.block_on(async {
            let response = self.execute_with_retry(&request, &url).await?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(Error::network)?;
            let body = if text.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            };
            Ok(ApiResponse { status, body })
        })
    }
}
