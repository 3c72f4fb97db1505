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

//! Personal access token authentication.

use std::fmt;

use super::AuthProvider;
use crate::error::{Error, Result};

/// Personal access token, sent as a bearer token on every request.
///
/// Tokens are created in the Dremio UI or through the user API and do not
/// need a login round trip.
#[derive(Clone)]
pub struct PersonalAccessToken {
    header: String,
}

impl PersonalAccessToken {
    /// Surrounding whitespace is dropped; a blank token is a configuration
    /// error.
    pub fn new(token: impl AsRef<str>) -> Result<Self> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            return Err(Error::InvalidConfiguration(
                "personal access token is empty".to_string(),
            ));
        }
        Ok(Self {
            header: format!("Bearer {token}"),
        })
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PersonalAccessToken(<redacted>)")
    }
}

impl AuthProvider for PersonalAccessToken {
    fn get_auth_header(&self) -> Result<String> {
        Ok(self.header.clone())
    }
}
