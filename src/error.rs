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

//! Error types for the Dremio client and ADBC driver.
//!
//! The SDK reports failures through [`Error`], which keeps local validation
//! errors, remote application errors and transport failures apart. The ADBC
//! layer converts these into `adbc_core` errors, and uses the driverbase
//! error framework for option handling.

use std::fmt;
use std::time::Duration;

use adbc_core::error::Status;
use driverbase::error::ErrorHelper;
use serde_json::Value;
use thiserror::Error;

use crate::jobs::JobId;
use crate::models::Job;
use crate::path::CatalogPath;

/// Error helper for Dremio driver errors.
///
/// This type implements the driverbase `ErrorHelper` trait to provide
/// consistent error formatting with the driver name prefix.
#[derive(Clone)]
pub struct DremioErrorHelper;

impl ErrorHelper for DremioErrorHelper {
    const NAME: &'static str = "Dremio";
}

/// Diagnostic payload of a non-success response from the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// The `errorMessage` reported by the service, or the raw body.
    pub message: String,
    /// The `moreInfo` field, when present.
    pub more_info: Option<String>,
    /// The full response body as returned by the service.
    pub payload: Value,
}

impl ApiError {
    /// Builds an `ApiError` from a status code and a decoded response body.
    pub fn from_body(status: u16, payload: Value) -> Self {
        let message = match &payload {
            Value::Object(map) => map
                .get("errorMessage")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| payload.to_string()),
            Value::String(s) => s.clone(),
            Value::Null => String::from("no response body"),
            other => other.to_string(),
        };
        let more_info = payload
            .get("moreInfo")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            status,
            message,
            more_info,
            payload,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.status)?;
        if let Some(more_info) = &self.more_info {
            write!(f, ": {more_info}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Not found: {0}")]
    NotFound(ApiError),

    #[error("Conflict: {0}")]
    Conflict(ApiError),

    #[error("Concurrent modification, re-fetch and retry: {0}")]
    ConcurrentModification(ApiError),

    #[error("Authentication failed: {0}")]
    Authentication(ApiError),

    #[error("Permission denied: {0}")]
    PermissionDenied(ApiError),

    #[error("API error: {0}")]
    Api(ApiError),

    /// The job ended in `FAILED`; `job` is the final status snapshot.
    #[error("Job {} failed: {message}", .job.id)]
    JobFailed { job: Box<Job>, message: String },

    #[error("Job {} was cancelled: {reason}", .job.id)]
    JobCancelled { job: Box<Job>, reason: String },

    #[error("Job {job_id} did not finish within {elapsed:?} ({attempts} polls)")]
    Timeout {
        job_id: JobId,
        elapsed: Duration,
        attempts: u32,
    },

    #[error("Stopped waiting for job {job_id}; the remote job was not cancelled")]
    Aborted { job_id: JobId },

    #[error("Result page at offset {offset} has schema {found:?}, expected {expected:?}")]
    SchemaMismatch {
        offset: u64,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Deleting {failed} failed after {} deletion(s): {source}", .deleted.len())]
    PartialDelete {
        deleted: Vec<CatalogPath>,
        failed: CatalogPath,
        #[source]
        source: Box<Error>,
    },

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Wraps a transport-level failure.
    pub fn network(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Network(err.into())
    }

    /// The remote diagnostic payload, if this error came from the service.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::NotFound(e)
            | Error::Conflict(e)
            | Error::ConcurrentModification(e)
            | Error::Authentication(e)
            | Error::PermissionDenied(e)
            | Error::Api(e) => Some(e),
            Error::PartialDelete { source, .. } => source.api_error(),
            _ => None,
        }
    }

    /// Returns true if the remote reported that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Maps a remote conflict onto a version-tag mismatch.
    ///
    /// Updates and tag-checked deletes report a stale tag as a conflict.
    pub(crate) fn into_concurrent_modification(self) -> Self {
        match self {
            Error::Conflict(e) => Error::ConcurrentModification(e),
            other => other,
        }
    }

    fn adbc_status(&self) -> Status {
        match self {
            Error::InvalidPath(_) | Error::InvalidArgument(_) | Error::InvalidConfiguration(_) => {
                Status::InvalidArguments
            }
            Error::NotFound(_) => Status::NotFound,
            Error::Conflict(_) => Status::AlreadyExists,
            Error::ConcurrentModification(_) | Error::PartialDelete { .. } => {
                Status::InvalidState
            }
            Error::Authentication(_) => Status::Unauthenticated,
            Error::PermissionDenied(_) => Status::Unauthorized,
            Error::JobCancelled { .. } | Error::Aborted { .. } => Status::Cancelled,
            Error::Timeout { .. } => Status::Timeout,
            Error::SchemaMismatch { .. } | Error::Serialization(_) | Error::Arrow(_) => {
                Status::InvalidData
            }
            Error::Unsupported(_) => Status::NotImplemented,
            Error::Network(_) | Error::UrlParse(_) | Error::Io(_) => Status::IO,
            Error::Api(_) | Error::JobFailed { .. } | Error::Yaml(_) => Status::Internal,
        }
    }

    /// Converts into an ADBC error carrying the driver name prefix.
    pub fn to_adbc(&self) -> adbc_core::error::Error {
        adbc_core::error::Error::with_message_and_status(
            format!("[{}] {self}", DremioErrorHelper::NAME),
            self.adbc_status(),
        )
    }
}

impl From<Error> for adbc_core::error::Error {
    fn from(error: Error) -> Self {
        error.to_adbc()
    }
}

/// A convenient alias for Results with Dremio errors.
pub type Result<T> = std::result::Result<T, Error>;
