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

//! Client configuration.
//!
//! Configuration is an explicit value handed to the client constructor.
//! Reading the process environment is a separate, optional step
//! ([`ClientConfig::from_env`]).

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::client::http::HttpClientConfig;
use crate::error::{Error, Result};
use crate::jobs::PollPolicy;

pub const ENV_HOSTNAME: &str = "DREMIO_HOSTNAME";
pub const ENV_USERNAME: &str = "DREMIO_USERNAME";
pub const ENV_PASSWORD: &str = "DREMIO_PASSWORD";
pub const ENV_ACCESS_TOKEN: &str = "DREMIO_PAT";

/// Rows requested per result page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// How the client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A personal access token, sent as a bearer token. No login call.
    AccessToken(String),
    /// Username and password, exchanged for a session token at connect time.
    Password { username: String, password: String },
}

impl Credentials {
    pub fn access_token(token: impl Into<String>) -> Self {
        Credentials::AccessToken(token.into())
    }

    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Password {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service, always ending with `/`.
    pub base_url: Url,
    pub credentials: Credentials,
    pub http: HttpClientConfig,
    /// Rows requested per result page.
    pub page_size: u32,
    /// Polling behaviour of `run_to_completion`.
    pub poll_policy: PollPolicy,
}

impl ClientConfig {
    fn new(hostname: impl Into<String>, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(&hostname.into())?,
            credentials,
            http: HttpClientConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            poll_policy: PollPolicy::default(),
        })
    }

    pub fn builder(hostname: impl Into<String>, credentials: Credentials) -> ClientConfigBuilder {
        ClientConfigBuilder::new(hostname, credentials)
    }

    /// Reads `DREMIO_HOSTNAME`, `DREMIO_PAT`, `DREMIO_USERNAME` and
    /// `DREMIO_PASSWORD` from the process environment.
    pub fn from_env() -> Result<ClientConfigBuilder> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`], with an arbitrary variable source.
    ///
    /// A token takes precedence over username and password.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<ClientConfigBuilder> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let hostname = var(ENV_HOSTNAME)
            .ok_or_else(|| Error::InvalidConfiguration(format!("{ENV_HOSTNAME} is not set")))?;
        let credentials = match (var(ENV_ACCESS_TOKEN), var(ENV_USERNAME), var(ENV_PASSWORD)) {
            (Some(token), _, _) => Credentials::AccessToken(token),
            (None, Some(username), Some(password)) => Credentials::Password { username, password },
            _ => {
                return Err(Error::InvalidConfiguration(format!(
                    "set {ENV_ACCESS_TOKEN}, or both {ENV_USERNAME} and {ENV_PASSWORD}"
                )))
            }
        };
        Ok(ClientConfigBuilder::new(hostname, credentials))
    }
}

fn parse_base_url(hostname: &str) -> Result<Url> {
    let hostname = hostname.trim();
    if hostname.is_empty() {
        return Err(Error::InvalidConfiguration("hostname is empty".to_string()));
    }
    // add https prefix if no scheme is given
    let base_url = if hostname.starts_with("http://") || hostname.starts_with("https://") {
        hostname.to_string()
    } else {
        format!("https://{hostname}")
    };
    let mut url = Url::parse(&base_url)?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

pub struct ClientConfigBuilder {
    hostname: String,
    credentials: Credentials,
    http: HttpClientConfig,
    page_size: u32,
    poll_policy: PollPolicy,
}

impl ClientConfigBuilder {
    fn new(hostname: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            hostname: hostname.into(),
            credentials,
            http: HttpClientConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            poll_policy: PollPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.http.connect_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.http.max_retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, base: Duration) -> Self {
        self.http.retry_base_delay = base;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        if self.page_size == 0 {
            return Err(Error::InvalidConfiguration(
                "page size must be at least 1".to_string(),
            ));
        }
        let mut config = ClientConfig::new(self.hostname, self.credentials)?;
        config.http = self.http;
        config.page_size = self.page_size;
        config.poll_policy = self.poll_policy;
        Ok(config)
    }
}
