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

//! Connection implementation for the Dremio ADBC driver.

use crate::database::OPTION_SCHEMA;
use crate::dremio::Dremio;
use crate::error::DremioErrorHelper;
use crate::path::{CatalogPath, CatalogRef};
use crate::statement::Statement;
use crate::types;
use adbc_core::error::Result;
use adbc_core::options::{InfoCode, ObjectDepth, OptionConnection, OptionValue};
use adbc_core::Optionable;
use arrow_array::{ArrayRef, RecordBatch, RecordBatchIterator, RecordBatchReader, StringArray};
use arrow_schema::{ArrowError, DataType, Field, Schema};
use driverbase::error::ErrorHelper;
use std::collections::HashSet;
use std::sync::Arc;

/// An authenticated session with a Dremio service.
///
/// A Connection is created from a Database and is used to create Statements
/// for executing SQL queries.
#[derive(Debug)]
pub struct Connection {
    dremio: Dremio,
    schema: Option<CatalogPath>,
}

/// Type alias for our empty reader used in stub implementations.
type EmptyReader =
    RecordBatchIterator<std::vec::IntoIter<std::result::Result<RecordBatch, ArrowError>>>;

impl Connection {
    pub(crate) fn new(dremio: Dremio, schema: Option<CatalogPath>) -> Self {
        Self { dremio, schema }
    }

    /// The REST client this connection runs on.
    pub fn client(&self) -> &Dremio {
        &self.dremio
    }

    /// Returns the default schema for unqualified table names.
    pub fn schema(&self) -> Option<&CatalogPath> {
        self.schema.as_ref()
    }

    fn table_path(&self, db_schema: Option<&str>, table_name: &str) -> Result<CatalogPath> {
        let schema = match db_schema {
            Some(s) if !s.trim().is_empty() => Some(CatalogPath::parse_sql(s)?),
            _ => self.schema.clone(),
        };
        let table = CatalogPath::parse_sql(table_name)?;
        let segments = schema
            .iter()
            .flat_map(|s| s.segments().iter())
            .chain(table.segments().iter());
        Ok(CatalogPath::from_segments(segments)?)
    }
}

impl Optionable for Connection {
    type Option = OptionConnection;

    fn set_option(&mut self, key: Self::Option, value: OptionValue) -> Result<()> {
        match key {
            OptionConnection::AutoCommit => {
                // every statement commits on its own; accept and ignore
                Ok(())
            }
            OptionConnection::Other(ref s) if s == OPTION_SCHEMA => match value {
                OptionValue::String(schema) => {
                    self.schema = Some(CatalogPath::parse_sql(&schema)?);
                    Ok(())
                }
                value => Err(DremioErrorHelper::set_invalid_option(&key, &value).to_adbc()),
            },
            _ => Err(DremioErrorHelper::set_unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_string(&self, key: Self::Option) -> Result<String> {
        match key {
            OptionConnection::Other(ref s) if s == OPTION_SCHEMA => {
                self.schema.as_ref().map(CatalogPath::to_sql).ok_or_else(|| {
                    DremioErrorHelper::invalid_state()
                        .message(format!("option '{s}' is not set"))
                        .to_adbc()
                })
            }
            _ => Err(DremioErrorHelper::get_unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_bytes(&self, key: Self::Option) -> Result<Vec<u8>> {
        Err(DremioErrorHelper::get_unknown_option(&key).to_adbc())
    }

    fn get_option_int(&self, key: Self::Option) -> Result<i64> {
        Err(DremioErrorHelper::get_unknown_option(&key).to_adbc())
    }

    fn get_option_double(&self, key: Self::Option) -> Result<f64> {
        Err(DremioErrorHelper::get_unknown_option(&key).to_adbc())
    }
}

impl adbc_core::Connection for Connection {
    type StatementType = Statement;

    fn new_statement(&mut self) -> Result<Self::StatementType> {
        Ok(Statement::new(self.dremio.jobs(), self.schema.clone()))
    }

    fn cancel(&mut self) -> Result<()> {
        Err(DremioErrorHelper::not_implemented()
            .message("cancel - cancel the running statement instead")
            .to_adbc())
    }

    fn get_info(&self, codes: Option<HashSet<InfoCode>>) -> Result<impl RecordBatchReader + Send> {
        use driverbase::InfoBuilder;

        let mut builder = InfoBuilder::new();

        let return_all = codes.is_none();
        let codes = codes.unwrap_or_default();

        if return_all || codes.contains(&InfoCode::DriverName) {
            builder.add_string(InfoCode::DriverName as u32, "Dremio ADBC Driver");
        }
        if return_all || codes.contains(&InfoCode::DriverVersion) {
            builder.add_string(InfoCode::DriverVersion as u32, env!("CARGO_PKG_VERSION"));
        }
        if return_all || codes.contains(&InfoCode::VendorName) {
            builder.add_string(InfoCode::VendorName as u32, "Dremio");
        }

        Ok(builder.build())
    }

    fn get_objects(
        &self,
        _depth: ObjectDepth,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _table_type: Option<Vec<&str>>,
        _column_name: Option<&str>,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(
            DremioErrorHelper::not_implemented()
                .message("get_objects")
                .to_adbc(),
        )
    }

    /// Looks the table up in the catalog. `db_schema` is a dotted SQL path;
    /// the connection's default schema applies when it is absent.
    fn get_table_schema(
        &self,
        _catalog: Option<&str>,
        db_schema: Option<&str>,
        table_name: &str,
    ) -> Result<Schema> {
        let path = self.table_path(db_schema, table_name)?;
        let object = self.dremio.catalog().get(&CatalogRef::from(&path))?;
        if !object.is_dataset() {
            return Err(DremioErrorHelper::invalid_argument()
                .message(format!("{path} is a {}, not a table", object.kind()))
                .to_adbc());
        }
        Ok(types::arrow_schema(&object.fields).as_ref().clone())
    }

    fn get_table_types(&self) -> Result<impl RecordBatchReader + Send> {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "table_type",
            DataType::Utf8,
            false,
        )]));
        let table_types: ArrayRef = Arc::new(StringArray::from(vec!["TABLE", "VIEW"]));
        let batch = RecordBatch::try_new(schema.clone(), vec![table_types])
            .map_err(crate::error::Error::from)?;
        Ok(RecordBatchIterator::new(vec![Ok(batch)], schema))
    }

    fn read_partition(
        &self,
        _partition: impl AsRef<[u8]>,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(
            DremioErrorHelper::not_implemented()
                .message("read_partition")
                .to_adbc(),
        )
    }

    fn commit(&mut self) -> Result<()> {
        // Dremio is auto-commit only
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        Err(DremioErrorHelper::not_implemented()
            .message("rollback - Dremio is auto-commit only")
            .to_adbc())
    }

    fn get_statistic_names(&self) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(
            DremioErrorHelper::not_implemented()
                .message("get_statistic_names")
                .to_adbc(),
        )
    }

    fn get_statistics(
        &self,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _approximate: bool,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(
            DremioErrorHelper::not_implemented()
                .message("get_statistics")
                .to_adbc(),
        )
    }
}
