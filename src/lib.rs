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

//! Dremio client and ADBC driver for Rust
//!
//! This crate talks to the Dremio REST API. It exposes the catalog, SQL jobs,
//! users and table creation as typed, blocking calls, and puts an ADBC
//! (Arrow Database Connectivity) driver on top of the same client.
//!
//! ## Overview
//!
//! The REST client starts at [`Dremio`]:
//! - [`catalog::Catalog`] - resolve, create, update, copy and delete catalog objects
//! - [`jobs::Jobs`] - submit SQL, poll with a [`jobs::PollPolicy`], fetch results
//! - [`users::Users`] - user accounts
//! - [`tables::Tables`] - create tables from queries or record batches
//! - [`dbt::DbtProject`] - export virtual datasets as dbt models
//!
//! The driver implements the standard ADBC traits from `adbc_core`:
//! - [`Driver`] - Entry point for creating database connections
//! - [`Database`] - Holds connection configuration
//! - [`Connection`] - Authenticated session with Dremio
//! - [`Statement`] - SQL statement execution
//!
//! ## Example
//!
//! ```ignore
//! use dremio_adbc::{ClientConfig, Credentials, Dremio};
//!
//! let config = ClientConfig::builder("dremio.example.com", Credentials::access_token("..."))
//!     .with_page_size(500)
//!     .build()?;
//! let dremio = Dremio::connect(config)?;
//! let object = dremio.catalog().get_by_path("space/folder/view")?;
//! let rows = dremio.query("SELECT 1")?;
//! let batch = rows.to_record_batch()?;
//! ```

pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod connection;
pub mod database;
pub mod dbt;
pub mod dremio;
pub mod driver;
pub mod error;
pub mod jobs;
pub mod models;
pub mod path;
pub mod result;
pub mod statement;
pub mod tables;
pub mod types;
pub mod users;

pub use config::{ClientConfig, ClientConfigBuilder, Credentials};
pub use connection::Connection;
pub use database::Database;
pub use dremio::Dremio;
pub use driver::Driver;
pub use error::{ApiError, DremioErrorHelper, Error, Result};
pub use path::{CatalogPath, CatalogRef, IntoCatalogPath};
pub use statement::Statement;
