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

//! User accounts.

use std::fmt;

use tracing::instrument;

use crate::client::{ApiRequest, RestClient};
use crate::error::{Error, Result};
use crate::models::{NewUser, User};

const USER: [&str; 3] = ["api", "v3", "user"];

/// Identifies a user by id or by login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRef {
    ById(String),
    ByName(String),
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRef::ById(id) => write!(f, "id {id}"),
            UserRef::ByName(name) => write!(f, "name {name}"),
        }
    }
}

/// Handle on the user API.
#[derive(Debug, Clone)]
pub struct Users {
    rest: RestClient,
}

impl Users {
    pub(crate) fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    #[instrument(skip(self, user), fields(user = %user))]
    pub fn get(&self, user: &UserRef) -> Result<User> {
        let request = match user {
            UserRef::ById(id) => ApiRequest::get(USER).with_segments([non_empty(id, "id")?]),
            UserRef::ByName(name) => ApiRequest::get(USER)
                .with_segments(["by-name", non_empty(name, "name")?]),
        };
        self.rest.send_json(request)
    }

    /// Creates an account; a taken name is reported as [`Error::Conflict`].
    #[instrument(skip(self, user), fields(name = %user.name))]
    pub fn create(&self, user: &NewUser) -> Result<User> {
        non_empty(&user.name, "name")?;
        let body = serde_json::to_value(user)?;
        self.rest
            .send_json(ApiRequest::post(USER).with_body(body))
    }

    /// Saves changes to a user. Requires the version tag it was fetched with.
    #[instrument(skip(self, user), fields(id = %user.id))]
    pub fn update(&self, user: &User) -> Result<User> {
        require_tag(user)?;
        let body = serde_json::to_value(user)?;
        self.rest
            .send_json(
                ApiRequest::put(USER)
                    .with_segments([user.id.as_str()])
                    .with_body(body),
            )
            .map_err(Error::into_concurrent_modification)
    }

    /// Deletes a user if it still has the version tag of this snapshot.
    #[instrument(skip(self, user), fields(id = %user.id))]
    pub fn delete(&self, user: &User) -> Result<()> {
        let tag = require_tag(user)?;
        self.rest
            .send(
                ApiRequest::delete(USER)
                    .with_segments([user.id.as_str()])
                    .with_query("version", tag),
            )
            .map_err(Error::into_concurrent_modification)?;
        Ok(())
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("user {what} is empty")));
    }
    Ok(value)
}

fn require_tag(user: &User) -> Result<&str> {
    user.tag.as_deref().ok_or_else(|| {
        Error::InvalidArgument(format!("user {} has no version tag", user.name))
    })
}
