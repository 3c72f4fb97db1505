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

//! SQL job orchestration.
//!
//! A job is owned by the service: [`Jobs::submit`] starts it and returns
//! immediately, [`Jobs::poll`] takes one status snapshot, and [`Jobs::wait`]
//! polls with backoff until the job reaches a terminal state. Job state only
//! advances through polling.

pub mod poll;

pub use poll::{AbortSignal, Clock, ManualClock, PollPolicy, SystemClock};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::client::{ApiRequest, RestClient};
use crate::error::{Error, Result};
use crate::models::{Job, JobState, SqlRequest};
use crate::result::{JobResult, ResultPager};

/// Identifier of a server-side job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    id: JobId,
}

/// Submits queries and follows them to completion.
#[derive(Debug, Clone)]
pub struct Jobs {
    rest: RestClient,
    page_size: u32,
    policy: PollPolicy,
    clock: Arc<dyn Clock>,
}

impl Jobs {
    pub(crate) fn new(rest: RestClient, page_size: u32, policy: PollPolicy) -> Self {
        Self {
            rest,
            page_size,
            policy,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source used by waits.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The policy used by [`Jobs::run_to_completion`].
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Starts a query and returns its id without waiting.
    #[instrument(skip(self, request), fields(sql_len = request.sql.len()))]
    pub fn submit(&self, request: &SqlRequest) -> Result<JobId> {
        if request.sql.trim().is_empty() {
            return Err(Error::InvalidArgument("SQL text is empty".to_string()));
        }
        let body = serde_json::to_value(request)?;
        let response: SubmitResponse = self
            .rest
            .send_json(ApiRequest::post(["api", "v3", "sql"]).with_body(body))?;
        debug!(job_id = %response.id, "job submitted");
        Ok(response.id)
    }

    /// Fetches the current status of a job. One request, never retried.
    pub fn poll(&self, job_id: &JobId) -> Result<Job> {
        let mut job: Job = self.rest.send_json(
            ApiRequest::get(["api", "v3", "job", job_id.as_str()]).without_retry(),
        )?;
        job.id = job_id.clone();
        Ok(job)
    }

    /// Asks the service to cancel a job.
    ///
    /// A job that completes first stays completed; check with [`Jobs::poll`].
    #[instrument(skip(self))]
    pub fn cancel(&self, job_id: &JobId) -> Result<()> {
        self.rest
            .send(ApiRequest::post(["api", "v3", "job", job_id.as_str(), "cancel"]))?;
        Ok(())
    }

    /// Polls until the job reaches a terminal state.
    ///
    /// A completed job is returned; a failed or cancelled one becomes
    /// [`Error::JobFailed`] or [`Error::JobCancelled`]. The wait ends with
    /// [`Error::Timeout`] when the policy's deadline or attempt limit is
    /// reached, and with [`Error::Aborted`] when `abort` fires. Neither of
    /// those cancels the remote job.
    #[instrument(skip(self, policy, abort))]
    pub fn wait(
        &self,
        job_id: &JobId,
        policy: &PollPolicy,
        abort: Option<&AbortSignal>,
    ) -> Result<Job> {
        let clock = self.clock.as_ref();
        let started = clock.now();
        let mut delay = policy.initial_delay;
        let mut attempts = 0u32;
        let mut last_state: Option<JobState> = None;

        loop {
            if abort.is_some_and(AbortSignal::is_aborted) {
                return Err(Error::Aborted {
                    job_id: job_id.clone(),
                });
            }

            let job = self.poll(job_id)?;
            attempts += 1;
            let mut state = job.state();
            if let Some(previous) = last_state {
                if !previous.can_transition_to(state) {
                    warn!(
                        %job_id,
                        remote_state = %job.remote_state,
                        "ignoring backward job state transition from {previous} to {state}"
                    );
                    state = previous;
                }
            }
            last_state = Some(state);
            debug!(%job_id, %state, attempts, "job polled");

            match state {
                JobState::Completed => return Ok(job),
                JobState::Failed => {
                    return Err(Error::JobFailed {
                        message: job.failure_message(),
                        job: Box::new(job),
                    })
                }
                JobState::Cancelled => {
                    return Err(Error::JobCancelled {
                        reason: job.cancellation_message(),
                        job: Box::new(job),
                    })
                }
                JobState::Pending | JobState::Running => {}
            }

            let elapsed = clock.now().saturating_duration_since(started);
            let timeout = || Error::Timeout {
                job_id: job_id.clone(),
                elapsed,
                attempts,
            };
            if policy.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(timeout());
            }
            let sleep_for = match policy.deadline {
                Some(deadline) if elapsed >= deadline => return Err(timeout()),
                Some(deadline) => delay.min(deadline - elapsed),
                None => delay,
            };

            if !poll::sleep_unless_aborted(clock, sleep_for, abort) {
                return Err(Error::Aborted {
                    job_id: job_id.clone(),
                });
            }
            delay = policy.next_delay(delay);
        }
    }

    /// Pages through the result of a completed job.
    pub fn results(&self, job_id: &JobId) -> ResultPager {
        ResultPager::new(self.rest.clone(), job_id.clone(), self.page_size)
    }

    /// Runs `sql` with the client's poll policy and collects the full result.
    pub fn run_to_completion(&self, sql: &str) -> Result<JobResult> {
        self.run_to_completion_with(&SqlRequest::new(sql), &self.policy, None)
    }

    /// Submits `request`, waits under `policy` and collects the result.
    pub fn run_to_completion_with(
        &self,
        request: &SqlRequest,
        policy: &PollPolicy,
        abort: Option<&AbortSignal>,
    ) -> Result<JobResult> {
        let job_id = self.submit(request)?;
        let job = self.wait(&job_id, policy, abort)?;
        let result = self.results(&job_id).materialize()?;
        if let Some(expected) = job.row_count {
            if expected != result.len() as u64 {
                warn!(
                    %job_id,
                    expected,
                    fetched = result.len(),
                    "fetched row count differs from job row count"
                );
            }
        }
        Ok(result)
    }

    /// Runs a statement that returns no rows and reports the affected count,
    /// when the service provides one.
    pub fn execute(&self, sql: &str) -> Result<Option<u64>> {
        let job_id = self.submit(&SqlRequest::new(sql))?;
        let job = self.wait(&job_id, &self.policy, None)?;
        Ok(job.row_count)
    }
}
