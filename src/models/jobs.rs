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

//! Job submission, status and result payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::Field;
use crate::jobs::JobId;
use crate::path::CatalogPath;

/// A column of a result page. Same shape as a dataset field.
pub type SchemaField = Field;

/// Body of a query submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlRequest {
    pub sql: String,
    /// Default schema for unqualified names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<CatalogPath>,
}

impl SqlRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: CatalogPath) -> Self {
        self.context = Some(context);
        self
    }
}

/// Normalised job lifecycle state.
///
/// `Completed`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    /// Maps a remote state name. Unknown names count as running, so that a
    /// newer server state never ends a wait early.
    pub fn from_remote(state: &str) -> Self {
        match state {
            "NOT_SUBMITTED" | "STARTING" | "PLANNING" | "QUEUED" | "ENQUEUED"
            | "METADATA_RETRIEVAL" | "ENGINE_START" | "EXECUTION_PLANNING" | "PENDING" => {
                JobState::Pending
            }
            "COMPLETED" => JobState::Completed,
            "FAILED" => JobState::Failed,
            "CANCELED" | "CANCELLED" => JobState::Cancelled,
            _ => JobState::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    /// Whether a job observed in `self` may later be observed in `next`.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match self {
            JobState::Pending => true,
            JobState::Running => next != JobState::Pending,
            terminal => *terminal == next,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Status snapshot of a job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Filled in from the request; the status payload does not carry it.
    #[serde(default)]
    pub id: JobId,
    #[serde(rename = "jobState")]
    pub remote_state: String,
    #[serde(default)]
    pub row_count: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    pub fn state(&self) -> JobState {
        JobState::from_remote(&self.remote_state)
    }

    /// Failure description, falling back to a generic one.
    pub fn failure_message(&self) -> String {
        self.error_message
            .as_deref()
            .filter(|message| !message.is_empty())
            .unwrap_or("job failed without an error message")
            .to_string()
    }

    pub fn cancellation_message(&self) -> String {
        self.cancellation_reason
            .as_deref()
            .filter(|reason| !reason.is_empty())
            .unwrap_or("no reason given")
            .to_string()
    }
}

/// One page of a job's result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    /// Total rows in the result, not in this page.
    pub row_count: u64,
    #[serde(default)]
    pub schema: Vec<SchemaField>,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

impl ResultPage {
    /// Columns as `name TYPE`, in order.
    pub fn column_signatures(&self) -> Vec<String> {
        self.schema.iter().map(ToString::to_string).collect()
    }
}
