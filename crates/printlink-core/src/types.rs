// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: the job state model, backend kinds and identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// MIME type used when the caller does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

/// Title used when the caller does not name one.
pub const DEFAULT_TITLE: &str = "A print job";

/// Backend-specific print settings, passed through to the backend verbatim.
///
/// For the local spooler these become job attributes; for the cloud backend
/// they are serialised into the `ticket` form field.
pub type JobOptions = Map<String, Value>;

/// Identifier assigned to a job by the backend that accepted it.
///
/// The spooler hands out integers and the cloud backend opaque strings, so
/// both are carried as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i32> for JobId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle states of a print job, shared by both backends.
///
/// The wire form is the upper-snake keyword (`IN_PROGRESS`), which is also
/// the vocabulary the cloud backend reports in `semanticState`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Built locally, not (yet) accepted by a backend.
    #[default]
    Draft,
    /// Accepted but held by the backend.
    Held,
    /// Accepted and waiting for the printer.
    Queued,
    /// Being printed.
    InProgress,
    /// Stopped by the printer (paper out, jam, ...).
    Stopped,
    /// Printed.
    Done,
    /// Cancelled or failed permanently.
    Aborted,
}

impl JobState {
    /// Every state, in lifecycle order.
    pub const ALL: [JobState; 7] = [
        JobState::Draft,
        JobState::Held,
        JobState::Queued,
        JobState::InProgress,
        JobState::Stopped,
        JobState::Done,
        JobState::Aborted,
    ];

    /// Wire keyword for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Held => "HELD",
            Self::Queued => "QUEUED",
            Self::InProgress => "IN_PROGRESS",
            Self::Stopped => "STOPPED",
            Self::Done => "DONE",
            Self::Aborted => "ABORTED",
        }
    }

    /// Whether the backend will never move the job out of this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a backend reports a state outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job state '{0}'")]
pub struct UnknownJobState(pub String);

impl FromStr for JobState {
    type Err = UnknownJobState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownJobState(s.to_owned()))
    }
}

/// The two print backends a job can be submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Local or network print spooler spoken to over IPP.
    Spooler,
    /// Cloud print submission HTTP API.
    Cloud,
}

impl BackendKind {
    /// Options a job starts with when the caller supplies none.
    pub fn default_options(&self) -> JobOptions {
        match self {
            Self::Spooler => JobOptions::new(),
            Self::Cloud => {
                let mut ticket = JobOptions::new();
                ticket.insert("version".into(), Value::from("1.0"));
                ticket.insert("print".into(), Value::Object(Map::new()));
                ticket
            }
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spooler => f.write_str("spooler"),
            Self::Cloud => f.write_str("cloud"),
        }
    }
}

/// The individual steps of a submission, used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStep {
    CreateJob,
    StartDocument,
    WriteData,
    FinishDocument,
    CloudPost,
}

impl fmt::Display for SubmissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateJob => "create-job",
            Self::StartDocument => "start-document",
            Self::WriteData => "write-data",
            Self::FinishDocument => "finish-document",
            Self::CloudPost => "cloud-post",
        };
        f.write_str(name)
    }
}

/// Classification of errors for caller-side retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Network blip or busy backend; a fresh job may succeed.
    Transient,
    /// Someone must act first (accept the printer, fix credentials).
    UserAction,
    /// Retrying cannot help (malformed response, API misuse).
    Permanent,
}
