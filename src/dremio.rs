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

//! Entry point of the REST client.

use std::sync::Arc;

use tracing::instrument;

use crate::auth::authenticate;
use crate::catalog::Catalog;
use crate::client::{HttpTransport, RestClient, Transport};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::jobs::Jobs;
use crate::result::JobResult;
use crate::tables::Tables;
use crate::users::Users;

/// An authenticated connection to a Dremio service.
///
/// Cheap to clone; clones share the transport and credentials.
#[derive(Debug, Clone)]
pub struct Dremio {
    rest: RestClient,
    config: Arc<ClientConfig>,
}

impl Dremio {
    /// Connects over HTTP, logging in first for password credentials.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.base_url.clone(), config.http.clone())?;
        Self::connect_with(config, Arc::new(transport))
    }

    /// Connects using the `DREMIO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::connect(ClientConfig::from_env()?.build()?)
    }

    /// Connects over an arbitrary transport.
    #[instrument(skip_all, fields(base_url = %config.base_url))]
    pub fn connect_with(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let rest = RestClient::new(transport);
        let auth = authenticate(&rest, &config.credentials)?;
        Ok(Self {
            rest: rest.with_auth(auth),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.rest.clone())
    }

    pub fn jobs(&self) -> Jobs {
        Jobs::new(
            self.rest.clone(),
            self.config.page_size,
            self.config.poll_policy.clone(),
        )
    }

    pub fn users(&self) -> Users {
        Users::new(self.rest.clone())
    }

    pub fn tables(&self) -> Tables {
        Tables::new(self.jobs())
    }

    /// Runs `sql` to completion and returns all rows.
    pub fn query(&self, sql: &str) -> Result<JobResult> {
        self.jobs().run_to_completion(sql)
    }
}
