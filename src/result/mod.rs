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

//! Query results.
//!
//! Results are paged on the wire. [`ResultPager`] fetches one page per
//! iteration step, and [`JobResult`] holds a fully materialized result that
//! can be converted into an Arrow [`RecordBatch`] without further requests.

use std::fmt;

use arrow_array::RecordBatch;
use arrow_json::ReaderBuilder;
use arrow_schema::SchemaRef;
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::{ApiRequest, RestClient};
use crate::error::{Error, Result};
use crate::jobs::JobId;
use crate::models::{ResultPage, SchemaField};
use crate::types;

/// Rows shown by the `Display` implementation of [`JobResult`].
const DISPLAY_ROWS: usize = 10;

/// Lazily fetches the pages of a job result, in order.
///
/// The schema of the first page is authoritative; a later page whose column
/// names or types differ ends the iteration with [`Error::SchemaMismatch`]. Iteration also
/// stops after the first error.
#[derive(Debug)]
pub struct ResultPager {
    rest: RestClient,
    job_id: JobId,
    page_size: u32,
    offset: u64,
    schema: Option<Vec<SchemaField>>,
    done: bool,
}

impl ResultPager {
    pub(crate) fn new(rest: RestClient, job_id: JobId, page_size: u32) -> Self {
        Self {
            rest,
            job_id,
            page_size: page_size.max(1),
            offset: 0,
            schema: None,
            done: false,
        }
    }

    /// Offset of the next page.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn fetch_page(&mut self) -> Result<ResultPage> {
        let request = ApiRequest::get(["api", "v3", "job", self.job_id.as_str(), "results"])
            .with_query("offset", self.offset)
            .with_query("limit", self.page_size);
        let page: ResultPage = self.rest.send_json(request)?;
        debug!(
            job_id = %self.job_id,
            offset = self.offset,
            rows = page.rows.len(),
            total = page.row_count,
            "result page fetched"
        );

        match &self.schema {
            None => self.schema = Some(page.schema.clone()),
            Some(expected) if *expected != page.schema => {
                return Err(Error::SchemaMismatch {
                    offset: self.offset,
                    expected: expected.iter().map(ToString::to_string).collect(),
                    found: page.column_signatures(),
                })
            }
            Some(_) => {}
        }

        self.offset += page.rows.len() as u64;
        if page.rows.is_empty() || self.offset >= page.row_count {
            self.done = true;
        }
        Ok(page)
    }

    /// Fetches all remaining pages into one result.
    pub fn materialize(mut self) -> Result<JobResult> {
        let mut schema = None;
        let mut rows = Vec::new();
        for page in &mut self {
            let page = page?;
            if schema.is_none() {
                schema = Some(page.schema);
            }
            rows.extend(page.rows);
        }
        Ok(JobResult {
            job_id: self.job_id,
            schema: schema.unwrap_or_default(),
            rows,
        })
    }
}

impl Iterator for ResultPager {
    type Item = Result<ResultPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let page = self.fetch_page();
        if page.is_err() {
            self.done = true;
        }
        Some(page)
    }
}

/// A fully fetched query result.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    job_id: JobId,
    schema: Vec<SchemaField>,
    rows: Vec<Map<String, Value>>,
}

impl JobResult {
    pub fn new(job_id: JobId, schema: Vec<SchemaField>, rows: Vec<Map<String, Value>>) -> Self {
        Self {
            job_id,
            schema,
            rows,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn schema(&self) -> &[SchemaField] {
        &self.schema
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Map<String, Value>> {
        self.rows.get(index)
    }

    /// Values of one column, `Null` where a row omits it.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        if !self.schema.iter().any(|field| field.name == name) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|row| row.get(name).unwrap_or(&Value::Null))
                .collect(),
        )
    }

    /// The rows as a JSON array of objects.
    pub fn to_json(&self) -> Value {
        Value::Array(self.rows.iter().cloned().map(Value::Object).collect())
    }

    /// Arrow schema of [`JobResult::to_record_batch`].
    pub fn arrow_schema(&self) -> SchemaRef {
        types::arrow_schema(&self.schema)
    }

    /// Converts the rows into a single record batch.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = self.arrow_schema();
        let mut decoder = ReaderBuilder::new(schema.clone())
            .with_batch_size(self.rows.len().max(1))
            .with_coerce_primitive(true)
            .build_decoder()?;
        decoder.serialize(&self.rows)?;
        Ok(decoder
            .flush()?
            .unwrap_or_else(|| RecordBatch::new_empty(schema)))
    }

    /// Renders the first `limit` rows as an aligned text table.
    pub fn preview_table(&self, limit: usize) -> String {
        let headers = self.column_names();
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(limit)
            .map(|row| {
                headers
                    .iter()
                    .map(|name| render_cell(row.get(*name)))
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, headers.iter().copied(), &widths);
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, separator.iter().map(String::as_str), &widths);
        for row in &cells {
            push_line(&mut out, row.iter().map(String::as_str), &widths);
        }
        if self.rows.len() > limit {
            out.push_str(&format!("({} more rows)\n", self.rows.len() - limit));
        }
        out
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.preview_table(DISPLAY_ROWS))
    }
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}
