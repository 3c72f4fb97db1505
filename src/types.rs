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

//! Mapping between Dremio SQL types and Arrow types.

use std::sync::Arc;

use arrow_schema::{DataType, Field as ArrowField, Schema, SchemaRef, TimeUnit};

use crate::models::{Field, FieldType};

/// Arrow type used to hold values of a Dremio column type.
///
/// Decimals are read as `Float64` since the REST API returns them as JSON
/// numbers. Types without a direct equivalent are kept as text.
pub fn arrow_type(field_type: &FieldType) -> DataType {
    match field_type.name.to_ascii_uppercase().as_str() {
        "BIGINT" => DataType::Int64,
        "INTEGER" | "INT" | "SMALLINT" | "TINYINT" => DataType::Int32,
        "DOUBLE" | "DECIMAL" => DataType::Float64,
        "FLOAT" => DataType::Float32,
        "BOOLEAN" => DataType::Boolean,
        "DATE" => DataType::Date32,
        "TIMESTAMP" => DataType::Timestamp(TimeUnit::Millisecond, None),
        _ => DataType::Utf8,
    }
}

/// Arrow schema for a list of Dremio fields. Every column is nullable.
pub fn arrow_schema(fields: &[Field]) -> SchemaRef {
    Arc::new(Schema::new(
        fields
            .iter()
            .map(|field| ArrowField::new(&field.name, arrow_type(&field.data_type), true))
            .collect::<Vec<_>>(),
    ))
}

/// SQL column type used when creating a table from Arrow data.
pub fn sql_type(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => "BIGINT",
        DataType::Float16 | DataType::Float32 | DataType::Float64 => "DOUBLE",
        DataType::Boolean => "BOOLEAN",
        DataType::Date32 | DataType::Date64 => "DATE",
        DataType::Timestamp(_, _) => "TIMESTAMP",
        _ => "VARCHAR",
    }
}
