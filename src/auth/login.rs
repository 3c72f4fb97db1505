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

//! Username/password login.

use std::fmt;

use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::AuthProvider;
use crate::client::{ApiRequest, RestClient};
use crate::error::Result;

/// Session token obtained from the login endpoint.
#[derive(Clone)]
pub struct SessionToken {
    token: String,
}

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

impl AuthProvider for SessionToken {
    fn get_auth_header(&self) -> Result<String> {
        Ok(format!("_dremio{}", self.token))
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Exchanges username and password for a session token.
///
/// A rejected login surfaces as [`crate::Error::Authentication`].
#[instrument(skip(client, password))]
pub fn login(client: &RestClient, username: &str, password: &str) -> Result<SessionToken> {
    let request = ApiRequest::post(["apiv2", "login"])
        .with_body(json!({ "userName": username, "password": password }));
    let response: LoginResponse = client.send_json(request)?;
    info!("logged in");
    Ok(SessionToken::new(response.token))
}
