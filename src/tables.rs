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

//! Table creation through SQL jobs.
//!
//! Tables are written with `CREATE TABLE` and `INSERT INTO` statements, so
//! they land in whatever format the target source uses (Iceberg for the
//! built-in lakehouse sources).

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_schema::{DataType, TimeUnit};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::error::{ApiError, Error, Result};
use crate::jobs::Jobs;
use crate::path::{CatalogPath, IntoCatalogPath};
use crate::types;

/// Rows per `INSERT` statement unless told otherwise.
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 1000;

/// Creates tables from queries or Arrow data.
#[derive(Debug, Clone)]
pub struct Tables {
    jobs: Jobs,
}

impl Tables {
    pub(crate) fn new(jobs: Jobs) -> Self {
        Self { jobs }
    }

    /// Creates a table from the result of `sql` (`CREATE TABLE ... AS`).
    #[instrument(skip(self, path, sql))]
    pub fn create_table_from_sql(&self, path: impl IntoCatalogPath, sql: &str) -> Result<()> {
        let path = path.into_catalog_path()?;
        if sql.trim().is_empty() {
            return Err(Error::InvalidArgument("SQL text is empty".to_string()));
        }
        let statement = format!("CREATE TABLE {} AS\n{sql}", path.to_sql());
        self.run_create(&path, &statement)?;
        info!(%path, "table created from query");
        Ok(())
    }

    /// Creates a table shaped like `batch` and inserts its rows,
    /// `batch_size` rows per statement.
    ///
    /// Returns the number of rows inserted. The inserts are separate jobs;
    /// if one fails, the table and the rows inserted before stay.
    #[instrument(skip(self, path, batch), fields(rows = batch.num_rows()))]
    pub fn create_table_from_batch(
        &self,
        path: impl IntoCatalogPath,
        batch: &RecordBatch,
        batch_size: usize,
    ) -> Result<u64> {
        let path = path.into_catalog_path()?;
        if batch_size == 0 {
            return Err(Error::InvalidArgument(
                "insert batch size must be at least 1".to_string(),
            ));
        }
        let statement = create_table_statement(&path, batch)?;
        self.run_create(&path, &statement)?;

        let table = path.to_sql();
        let mut inserted = 0u64;
        let mut start = 0;
        while start < batch.num_rows() {
            let end = (start + batch_size).min(batch.num_rows());
            let rows = (start..end)
                .map(|row| row_literal(batch.columns(), row))
                .collect::<Result<Vec<_>>>()?;
            let statement = format!("INSERT INTO {table} VALUES\n{}", rows.join(",\n"));
            self.jobs.execute(&statement)?;
            inserted += (end - start) as u64;
            debug!(%path, inserted, "rows inserted");
            start = end;
        }
        info!(%path, inserted, "table created from record batch");
        Ok(inserted)
    }

    /// Runs a `CREATE TABLE` statement. An existing table is reported as
    /// [`Error::Conflict`], whether the service rejects the submission or
    /// the job fails on it.
    fn run_create(&self, path: &CatalogPath, statement: &str) -> Result<()> {
        match self.jobs.execute(statement) {
            Ok(_) => Ok(()),
            Err(Error::Conflict(e)) => Err(Error::Conflict(ApiError {
                message: format!("table {path} already exists: {}", e.message),
                ..e
            })),
            Err(Error::JobFailed { job, message }) if is_already_exists(&message) => {
                Err(Error::Conflict(ApiError {
                    status: 409,
                    message: format!("table {path} already exists: {message}"),
                    more_info: None,
                    payload: json!({"jobId": job.id, "errorMessage": message}),
                }))
            }
            Err(e) => Err(e),
        }
    }
}

fn is_already_exists(message: &str) -> bool {
    message.to_ascii_lowercase().contains("already exists")
}

fn create_table_statement(path: &CatalogPath, batch: &RecordBatch) -> Result<String> {
    let schema = batch.schema();
    if schema.fields().is_empty() {
        return Err(Error::InvalidArgument(
            "record batch has no columns".to_string(),
        ));
    }
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            if !is_insertable(field.data_type()) {
                return Err(Error::Unsupported(format!(
                    "column {} has type {}, which cannot be written as a SQL literal",
                    field.name(),
                    field.data_type()
                )));
            }
            Ok(format!(
                "{} {}",
                quote_identifier(field.name()),
                types::sql_type(field.data_type())
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "CREATE TABLE {} (\n  {}\n)",
        path.to_sql(),
        columns.join(",\n  ")
    ))
}

fn is_insertable(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
            | DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Date32
            | DataType::Date64
            | DataType::Timestamp(_, _)
    )
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn row_literal(columns: &[ArrayRef], row: usize) -> Result<String> {
    let values = columns
        .iter()
        .map(|column| sql_literal(column.as_ref(), row))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", values.join(", ")))
}

fn float_literal(value: f64) -> String {
    // NaN and infinities have no SQL literal
    if value.is_finite() {
        value.to_string()
    } else {
        "NULL".to_string()
    }
}

/// Renders one cell as a SQL literal.
fn sql_literal(column: &dyn Array, row: usize) -> Result<String> {
    if column.is_null(row) {
        return Ok("NULL".to_string());
    }
    let literal = match column.data_type() {
        DataType::Int8 => column.as_primitive::<Int8Type>().value(row).to_string(),
        DataType::Int16 => column.as_primitive::<Int16Type>().value(row).to_string(),
        DataType::Int32 => column.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => column.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::UInt8 => column.as_primitive::<UInt8Type>().value(row).to_string(),
        DataType::UInt16 => column.as_primitive::<UInt16Type>().value(row).to_string(),
        DataType::UInt32 => column.as_primitive::<UInt32Type>().value(row).to_string(),
        DataType::UInt64 => column.as_primitive::<UInt64Type>().value(row).to_string(),
        DataType::Float32 => {
            float_literal(f64::from(column.as_primitive::<Float32Type>().value(row)))
        }
        DataType::Float64 => float_literal(column.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => {
            if column.as_boolean().value(row) {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        DataType::Utf8 => quote_string(column.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => quote_string(column.as_string::<i64>().value(row)),
        DataType::Date32 => date_literal(column.as_primitive::<Date32Type>().value_as_date(row))?,
        DataType::Date64 => date_literal(column.as_primitive::<Date64Type>().value_as_date(row))?,
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => column
                    .as_primitive::<TimestampSecondType>()
                    .value_as_datetime(row),
                TimeUnit::Millisecond => column
                    .as_primitive::<TimestampMillisecondType>()
                    .value_as_datetime(row),
                TimeUnit::Microsecond => column
                    .as_primitive::<TimestampMicrosecondType>()
                    .value_as_datetime(row),
                TimeUnit::Nanosecond => column
                    .as_primitive::<TimestampNanosecondType>()
                    .value_as_datetime(row),
            };
            let datetime = datetime.ok_or_else(|| {
                Error::InvalidArgument(format!("timestamp in row {row} is out of range"))
            })?;
            format!("TIMESTAMP '{}'", datetime.format("%Y-%m-%d %H:%M:%S%.3f"))
        }
        other => {
            return Err(Error::Unsupported(format!(
                "values of type {other} cannot be written as SQL literals"
            )))
        }
    };
    Ok(literal)
}

fn date_literal(date: Option<chrono::NaiveDate>) -> Result<String> {
    let date =
        date.ok_or_else(|| Error::InvalidArgument("date is out of range".to_string()))?;
    Ok(format!("DATE '{}'", date.format("%Y-%m-%d")))
}
