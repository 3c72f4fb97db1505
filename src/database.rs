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

//! Database implementation for the Dremio ADBC driver.

use std::sync::Arc;

use crate::client::Transport;
use crate::config::{ClientConfig, Credentials};
use crate::connection::Connection;
use crate::dremio::Dremio;
use crate::error::DremioErrorHelper;
use crate::path::CatalogPath;
use adbc_core::error::Result;
use adbc_core::options::{OptionConnection, OptionDatabase, OptionValue};
use adbc_core::Optionable;
use driverbase::error::ErrorHelper;

pub const OPTION_USERNAME: &str = "dremio.username";
pub const OPTION_PASSWORD: &str = "dremio.password";
pub const OPTION_ACCESS_TOKEN: &str = "dremio.access_token";
/// Default schema for unqualified table names, in SQL notation.
pub const OPTION_SCHEMA: &str = "dremio.schema";
pub const OPTION_PAGE_SIZE: &str = "dremio.page_size";

/// Holds connection configuration.
///
/// Options are only checked when a connection is created: the host URI and
/// either an access token or a username and password are required.
#[derive(Debug, Default)]
pub struct Database {
    uri: Option<String>,
    username: Option<String>,
    password: Option<String>,
    access_token: Option<String>,
    schema: Option<String>,
    page_size: Option<u32>,
    transport: Option<Arc<dyn Transport>>,
}

impl Database {
    /// Creates a new Database instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends all requests of this database's connections through `transport`
    /// instead of HTTP.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Returns the configured URI.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Returns the configured schema.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    fn client_config(&self) -> Result<ClientConfig> {
        let uri = self.uri.clone().ok_or_else(|| {
            DremioErrorHelper::invalid_state()
                .message("option 'uri' is not set")
                .to_adbc()
        })?;
        let credentials = match (&self.access_token, &self.username, &self.password) {
            (Some(token), _, _) => Credentials::access_token(token.clone()),
            (None, Some(username), Some(password)) => {
                Credentials::password(username.clone(), password.clone())
            }
            _ => {
                return Err(DremioErrorHelper::invalid_state()
                    .message(format!(
                        "set '{OPTION_ACCESS_TOKEN}', or '{OPTION_USERNAME}' and '{OPTION_PASSWORD}'"
                    ))
                    .to_adbc())
            }
        };
        let mut builder = ClientConfig::builder(uri, credentials);
        if let Some(page_size) = self.page_size {
            builder = builder.with_page_size(page_size);
        }
        Ok(builder.build()?)
    }

    fn default_schema(&self) -> Result<Option<CatalogPath>> {
        self.schema
            .as_deref()
            .map(CatalogPath::parse_sql)
            .transpose()
            .map_err(Into::into)
    }
}

fn string_value(key: &OptionDatabase, value: OptionValue) -> Result<String> {
    match value {
        OptionValue::String(s) => Ok(s),
        value => Err(DremioErrorHelper::set_invalid_option(key, &value).to_adbc()),
    }
}

fn page_size_value(key: &OptionDatabase, value: OptionValue) -> Result<u32> {
    let parsed = match &value {
        OptionValue::Int(n) => u32::try_from(*n).ok(),
        OptionValue::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| *n > 0)
        .ok_or_else(|| DremioErrorHelper::set_invalid_option(key, &value).to_adbc())
}

impl Optionable for Database {
    type Option = OptionDatabase;

    fn set_option(&mut self, key: Self::Option, value: OptionValue) -> Result<()> {
        match key {
            OptionDatabase::Uri => {
                self.uri = Some(string_value(&key, value)?);
                Ok(())
            }
            OptionDatabase::Username => {
                self.username = Some(string_value(&key, value)?);
                Ok(())
            }
            OptionDatabase::Password => {
                self.password = Some(string_value(&key, value)?);
                Ok(())
            }
            OptionDatabase::Other(ref s) => match s.as_str() {
                OPTION_USERNAME => {
                    self.username = Some(string_value(&key, value)?);
                    Ok(())
                }
                OPTION_PASSWORD => {
                    self.password = Some(string_value(&key, value)?);
                    Ok(())
                }
                OPTION_ACCESS_TOKEN => {
                    self.access_token = Some(string_value(&key, value)?);
                    Ok(())
                }
                OPTION_SCHEMA => {
                    let schema = string_value(&key, value)?;
                    CatalogPath::parse_sql(&schema)?;
                    self.schema = Some(schema);
                    Ok(())
                }
                OPTION_PAGE_SIZE => {
                    self.page_size = Some(page_size_value(&key, value)?);
                    Ok(())
                }
                _ => Err(DremioErrorHelper::set_unknown_option(&key).to_adbc()),
            },
            _ => Err(DremioErrorHelper::set_unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_string(&self, key: Self::Option) -> Result<String> {
        let not_set = |name: &str| {
            DremioErrorHelper::invalid_state()
                .message(format!("option '{name}' is not set"))
                .to_adbc()
        };
        match key {
            OptionDatabase::Uri => self.uri.clone().ok_or_else(|| not_set("uri")),
            OptionDatabase::Username => self.username.clone().ok_or_else(|| not_set("username")),
            OptionDatabase::Other(ref s) => match s.as_str() {
                OPTION_USERNAME => self.username.clone().ok_or_else(|| not_set(s)),
                OPTION_SCHEMA => self.schema.clone().ok_or_else(|| not_set(s)),
                OPTION_PAGE_SIZE => self
                    .page_size
                    .map(|n| n.to_string())
                    .ok_or_else(|| not_set(s)),
                // secrets are write-only
                _ => Err(DremioErrorHelper::get_unknown_option(&key).to_adbc()),
            },
            _ => Err(DremioErrorHelper::get_unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_bytes(&self, key: Self::Option) -> Result<Vec<u8>> {
        Err(DremioErrorHelper::get_unknown_option(&key).to_adbc())
    }

    fn get_option_int(&self, key: Self::Option) -> Result<i64> {
        match key {
            OptionDatabase::Other(ref s) if s == OPTION_PAGE_SIZE => {
                self.page_size.map(i64::from).ok_or_else(|| {
                    DremioErrorHelper::invalid_state()
                        .message(format!("option '{s}' is not set"))
                        .to_adbc()
                })
            }
            _ => Err(DremioErrorHelper::get_unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_double(&self, key: Self::Option) -> Result<f64> {
        Err(DremioErrorHelper::get_unknown_option(&key).to_adbc())
    }
}

impl adbc_core::Database for Database {
    type ConnectionType = Connection;

    /// Connects, logging in first when username and password are set.
    fn new_connection(&self) -> Result<Self::ConnectionType> {
        let config = self.client_config()?;
        let dremio = match &self.transport {
            Some(transport) => Dremio::connect_with(config, transport.clone())?,
            None => Dremio::connect(config)?,
        };
        Ok(Connection::new(dremio, self.default_schema()?))
    }

    fn new_connection_with_opts(
        &self,
        opts: impl IntoIterator<Item = (OptionConnection, OptionValue)>,
    ) -> Result<Self::ConnectionType> {
        let mut connection = self.new_connection()?;
        for (key, value) in opts {
            connection.set_option(key, value)?;
        }
        Ok(connection)
    }
}
