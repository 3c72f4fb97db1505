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

//! Authentication providers for Dremio.
//!
//! Personal access tokens are used as-is; username and password are
//! exchanged for a session token through the login endpoint.

pub mod login;
pub mod pat;

pub use login::{login, SessionToken};
pub use pat::PersonalAccessToken;

use std::fmt::Debug;
use std::sync::Arc;

use crate::client::RestClient;
use crate::config::Credentials;
use crate::error::Result;

/// Trait for authentication providers.
pub trait AuthProvider: Send + Sync + Debug {
    /// Returns the authorization header value for HTTP requests.
    fn get_auth_header(&self) -> Result<String>;
}

/// Turns configured credentials into a provider, logging in if needed.
///
/// `client` must not carry credentials yet; it is only used for the login
/// call.
pub fn authenticate(client: &RestClient, credentials: &Credentials) -> Result<Arc<dyn AuthProvider>> {
    match credentials {
        Credentials::AccessToken(token) => Ok(Arc::new(PersonalAccessToken::new(token)?)),
        Credentials::Password { username, password } => {
            Ok(Arc::new(login(client, username, password)?))
        }
    }
}
