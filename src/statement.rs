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

//! Statement implementation for the Dremio ADBC driver.

use crate::error::DremioErrorHelper;
use crate::jobs::{AbortSignal, JobId, Jobs};
use crate::models::{Job, SqlRequest};
use crate::path::CatalogPath;
use adbc_core::error::Result;
use adbc_core::options::{OptionStatement, OptionValue};
use adbc_core::Optionable;
use arrow_array::{RecordBatchIterator, RecordBatchReader};
use arrow_schema::Schema;
use driverbase::error::ErrorHelper;
use tracing::debug;

/// A SQL statement run as a Dremio job.
///
/// A Statement is created from a Connection. Each execution submits one job,
/// waits for it with the client's poll policy and fetches the whole result.
#[derive(Debug)]
pub struct Statement {
    jobs: Jobs,
    context: Option<CatalogPath>,
    query: Option<String>,
    abort: AbortSignal,
    last_job: Option<JobId>,
}

impl Statement {
    pub(crate) fn new(jobs: Jobs, context: Option<CatalogPath>) -> Self {
        Self {
            jobs,
            context,
            query: None,
            abort: AbortSignal::new(),
            last_job: None,
        }
    }

    /// Returns the current SQL query.
    pub fn sql_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The job started by the most recent execution.
    pub fn last_job(&self) -> Option<&JobId> {
        self.last_job.as_ref()
    }

    fn request(&self) -> Result<SqlRequest> {
        let query = self.query.as_deref().ok_or_else(|| {
            DremioErrorHelper::invalid_state()
                .message("no SQL query set")
                .to_adbc()
        })?;
        let request = SqlRequest::new(query);
        Ok(match &self.context {
            Some(context) => request.with_context(context.clone()),
            None => request,
        })
    }

    /// Submits the query and waits for a terminal state.
    fn run(&mut self) -> Result<Job> {
        let request = self.request()?;
        self.abort = AbortSignal::new();
        let job_id = self.jobs.submit(&request)?;
        self.last_job = Some(job_id.clone());
        let job = self
            .jobs
            .wait(&job_id, self.jobs.policy(), Some(&self.abort))?;
        debug!(%job_id, rows = ?job.row_count, "statement finished");
        Ok(job)
    }
}

impl Optionable for Statement {
    type Option = OptionStatement;

    fn set_option(&mut self, key: Self::Option, _value: OptionValue) -> Result<()> {
        Err(DremioErrorHelper::set_unknown_option(&key).to_adbc())
    }

    fn get_option_string(&self, key: Self::Option) -> Result<String> {
        Err(DremioErrorHelper::get_unknown_option(&key).to_adbc())
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

impl adbc_core::Statement for Statement {
    fn set_sql_query(&mut self, query: impl AsRef<str>) -> Result<()> {
        self.query = Some(query.as_ref().to_string());
        Ok(())
    }

    fn set_substrait_plan(&mut self, _plan: impl AsRef<[u8]>) -> Result<()> {
        Err(DremioErrorHelper::not_implemented()
            .message("Substrait plans")
            .to_adbc())
    }

    fn prepare(&mut self) -> Result<()> {
        Err(DremioErrorHelper::not_implemented()
            .message("prepare")
            .to_adbc())
    }

    fn get_parameter_schema(&self) -> Result<Schema> {
        Err(DremioErrorHelper::not_implemented()
            .message("get_parameter_schema")
            .to_adbc())
    }

    fn bind(&mut self, _batch: arrow_array::RecordBatch) -> Result<()> {
        Err(DremioErrorHelper::not_implemented()
            .message("bind parameters")
            .to_adbc())
    }

    fn bind_stream(&mut self, _stream: Box<dyn RecordBatchReader + Send>) -> Result<()> {
        Err(DremioErrorHelper::not_implemented()
            .message("bind_stream")
            .to_adbc())
    }

    /// Runs the query and returns its rows as a single record batch.
    fn execute(&mut self) -> Result<impl RecordBatchReader + Send> {
        let job = self.run()?;
        let result = self.jobs.results(&job.id).materialize()?;
        let batch = result.to_record_batch()?;
        let schema = batch.schema();
        Ok(RecordBatchIterator::new(vec![Ok(batch)], schema))
    }

    /// Runs a statement and returns the row count the service reports.
    fn execute_update(&mut self) -> Result<Option<i64>> {
        let job = self.run()?;
        Ok(job.row_count.and_then(|n| i64::try_from(n).ok()))
    }

    fn execute_schema(&mut self) -> Result<Schema> {
        Err(DremioErrorHelper::not_implemented()
            .message("execute_schema")
            .to_adbc())
    }

    fn execute_partitions(&mut self) -> Result<adbc_core::PartitionedResult> {
        Err(DremioErrorHelper::not_implemented()
            .message("execute_partitions")
            .to_adbc())
    }

    /// Stops a wait in progress and asks the service to cancel the last job.
    fn cancel(&mut self) -> Result<()> {
        self.abort.abort();
        if let Some(job_id) = self.last_job.take() {
            self.jobs.cancel(&job_id)?;
        }
        Ok(())
    }
}
