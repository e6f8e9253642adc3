// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A single print job submission and its normalised outcome.
//
// A job is built by the caller in the DRAFT state and mutated by exactly one
// successful submission. After that only `state` may change (status polling
// refines it); everything else is exposed read-only.

use chrono::{DateTime, Utc};
use serde::Serialize;

use printlink_core::error::{PrintError, Result};
use printlink_core::types::{
    BackendKind, DEFAULT_CONTENT_TYPE, DEFAULT_TITLE, JobId, JobOptions, JobState,
};

use crate::printer::Printer;

/// One submission unit: content, metadata and backend options for a printer.
#[derive(Debug, Clone)]
pub struct PrintJob<'p> {
    printer: &'p Printer,
    content: Vec<u8>,
    content_type: String,
    title: String,
    options: JobOptions,
    pub(crate) job_id: Option<JobId>,
    pub(crate) submitted: bool,
    pub(crate) state: JobState,
    pub(crate) last_message: String,
    pub(crate) last_success: Option<bool>,
    pub(crate) raw_response: Option<String>,
    pub(crate) last_http_status: Option<u16>,
    created_at: DateTime<Utc>,
    pub(crate) submitted_at: Option<DateTime<Utc>>,
}

impl<'p> PrintJob<'p> {
    /// Create a draft job with the default title, content type and the
    /// backend's default options.
    pub fn new(printer: &'p Printer, content: impl Into<Vec<u8>>) -> Self {
        Self {
            printer,
            content: content.into(),
            content_type: DEFAULT_CONTENT_TYPE.into(),
            title: DEFAULT_TITLE.into(),
            options: printer.backend().default_options(),
            job_id: None,
            submitted: false,
            state: JobState::Draft,
            last_message: String::new(),
            last_success: None,
            raw_response: None,
            last_http_status: None,
            created_at: Utc::now(),
            submitted_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Replace the options. An empty map keeps the backend default.
    pub fn with_options(mut self, options: JobOptions) -> Self {
        if !options.is_empty() {
            self.options = options;
        }
        self
    }

    pub fn printer(&self) -> &'p Printer {
        self.printer
    }

    /// The backend this job is bound to, fixed by its printer.
    pub fn backend(&self) -> BackendKind {
        self.printer.backend()
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Identifier assigned by the backend, if one was handed out.
    ///
    /// The spooler assigns it at job creation, so it stays set for inspection
    /// even when the document was later refused.
    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Refine the state after submission, e.g. from a status poll.
    pub fn set_state(&mut self, state: JobState) {
        self.state = state;
    }

    /// Message the cloud backend attached to its last response.
    pub fn last_message(&self) -> &str {
        &self.last_message
    }

    /// `success` flag of the last cloud response, if one was decoded.
    pub fn last_success(&self) -> Option<bool> {
        self.last_success
    }

    /// Body of the last HTTP 200 cloud response.
    pub fn raw_response(&self) -> Option<&str> {
        self.raw_response.as_deref()
    }

    /// HTTP status of the last cloud submission.
    pub fn last_http_status(&self) -> Option<u16> {
        self.last_http_status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Record a successful hand-off to the backend.
    pub(crate) fn mark_submitted(&mut self, state: JobState) {
        self.submitted = true;
        self.state = state;
        self.submitted_at = Some(Utc::now());
    }

    /// Snapshot of the fields a caller inspects after a submission.
    pub(crate) fn outcome(&self, accepted: bool) -> SubmissionOutcome {
        SubmissionOutcome {
            backend: self.backend(),
            accepted,
            job_id: self.job_id.clone(),
            state: self.state,
            message: self.last_message.clone(),
            http_status: self.last_http_status,
        }
    }
}

/// Normalised result of one submission, identical in shape for both backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub backend: BackendKind,
    /// Did the backend accept and queue the job.
    pub accepted: bool,
    pub job_id: Option<JobId>,
    pub state: JobState,
    /// Diagnostic text from the backend; empty when it gave none.
    pub message: String,
    /// HTTP status of the exchange (cloud backend only).
    pub http_status: Option<u16>,
}

impl SubmissionOutcome {
    /// Turn a declined submission into [`PrintError::BackendRejected`].
    pub fn into_accepted(self) -> Result<Self> {
        if self.accepted {
            Ok(self)
        } else {
            let message = match (self.message.is_empty(), self.http_status) {
                (true, Some(status)) if status != 200 => format!("HTTP status {status}"),
                _ => self.message,
            };
            Err(PrintError::BackendRejected { message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printlink_core::config::{CloudConfig, SpoolerConfig};
    use serde_json::{Value, json};

    use crate::server::PrintServer;

    fn spooler_printer() -> Printer {
        Printer::new(PrintServer::spooler(SpoolerConfig::default()), "office")
    }

    fn cloud_printer() -> Printer {
        Printer::new(PrintServer::cloud(CloudConfig::default()), "cloud-printer-1")
    }

    #[test]
    fn new_job_is_a_draft_with_defaults() {
        let printer = spooler_printer();
        let job = PrintJob::new(&printer, b"%PDF-1.7".to_vec());
        assert_eq!(job.state(), JobState::Draft);
        assert!(!job.is_submitted());
        assert!(job.job_id().is_none());
        assert_eq!(job.title(), "A print job");
        assert_eq!(job.content_type(), "application/pdf");
        assert!(job.last_success().is_none());
    }

    #[test]
    fn options_default_per_backend() {
        let spooler = spooler_printer();
        let cloud = cloud_printer();
        assert!(PrintJob::new(&spooler, Vec::new()).options().is_empty());
        assert_eq!(
            Value::Object(PrintJob::new(&cloud, Vec::new()).options().clone()),
            json!({ "version": "1.0", "print": {} })
        );
    }

    #[test]
    fn empty_options_keep_backend_default() {
        let cloud = cloud_printer();
        let job = PrintJob::new(&cloud, Vec::new()).with_options(JobOptions::new());
        assert_eq!(job.options().get("version"), Some(&json!("1.0")));
    }

    #[test]
    fn explicit_options_pass_through() {
        let printer = spooler_printer();
        let mut options = JobOptions::new();
        options.insert("copies".into(), json!(2));
        let job = PrintJob::new(&printer, Vec::new()).with_options(options.clone());
        assert_eq!(job.options(), &options);
    }

    #[test]
    fn declined_outcome_becomes_backend_rejected() {
        let outcome = SubmissionOutcome {
            backend: BackendKind::Cloud,
            accepted: false,
            job_id: None,
            state: JobState::Draft,
            message: String::new(),
            http_status: Some(403),
        };
        match outcome.into_accepted() {
            Err(PrintError::BackendRejected { message }) => assert_eq!(message, "HTTP status 403"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn accepted_outcome_passes_through() {
        let outcome = SubmissionOutcome {
            backend: BackendKind::Spooler,
            accepted: true,
            job_id: Some(JobId::from("J1")),
            state: JobState::Queued,
            message: String::new(),
            http_status: None,
        };
        assert_eq!(outcome.clone().into_accepted().unwrap(), outcome);
    }
}
