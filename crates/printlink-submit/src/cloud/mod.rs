// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cloud print backend.
//
// Submission is one multipart POST to `{base}/submit`. The backend answers
// with a JSON document whose `success` flag says whether the job was queued.

pub mod http;
pub mod response;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use printlink_core::config::CloudConfig;
use printlink_core::error::{PrintError, Result};

use crate::adapter::Deadline;
use crate::job::{PrintJob, SubmissionOutcome};

pub use self::http::HttpSession;
pub use self::response::{SubmitReply, decode_lenient, decode_submit_reply};

/// Filename declared on the content part.
///
/// Deliberately extension-less so nothing along the way infers a content
/// type from it; the declared MIME type is the job's own.
pub const CONTENT_FILE_NAME: &str = "content";

/// Form fields of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitForm {
    pub printer_id: String,
    pub title: String,
    /// Job options serialised as JSON text.
    pub ticket: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

/// Status and body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    /// Reason phrase for `status`, when known.
    pub reason: String,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `{base}/{path}?{params}` with the parameters form-encoded.
pub fn endpoint_with_params(
    config: &CloudConfig,
    path: &str,
    params: &[(&str, &str)],
) -> Result<String> {
    reqwest::Url::parse_with_params(&config.endpoint(path), params)
        .map(|url| url.to_string())
        .map_err(|e| PrintError::InvalidConfig(format!("cloud endpoint '{path}': {e}")))
}

/// Pass a 2xx reply through; anything else is a refusal by the backend.
pub(crate) fn expect_success(reply: HttpReply) -> Result<HttpReply> {
    if reply.is_success() {
        Ok(reply)
    } else {
        Err(PrintError::BackendRejected {
            message: format!("HTTP {} {}", reply.status, reply.reason)
                .trim_end()
                .to_owned(),
        })
    }
}

/// An authorised HTTP session with the cloud print API.
#[async_trait]
pub trait CloudSession: Send + Sync {
    /// POST `form` as `multipart/form-data` to `url`.
    async fn post_form(&self, url: &str, form: SubmitForm) -> Result<HttpReply>;

    /// GET `url`.
    async fn get(&self, url: &str) -> Result<HttpReply>;

    /// Release the session. Called only on sessions opened internally.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Submit `job` to the cloud backend in one exchange.
///
/// Transport failures propagate and leave the job untouched. Any status
/// other than 200 is a declined submission that records only the status.
/// A 200 body is decoded strictly; see [`decode_submit_reply`].
#[instrument(skip_all, fields(printer = %job.printer().id(), title = %job.title()))]
pub(crate) async fn submit(
    session: &dyn CloudSession,
    config: &CloudConfig,
    job: &mut PrintJob<'_>,
    deadline: Deadline,
) -> Result<SubmissionOutcome> {
    let form = SubmitForm {
        printer_id: job.printer().id().to_owned(),
        title: job.title().to_owned(),
        ticket: serde_json::to_string(job.options())?,
        content: job.content().to_vec(),
        content_type: job.content_type().to_owned(),
    };
    let url = config.endpoint("submit");

    let reply = match deadline.bound(session.post_form(&url, form)).await {
        Some(reply) => reply?,
        None => {
            return Err(PrintError::Transport(format!(
                "POST {url} timed out after {}",
                deadline.describe()
            )));
        }
    };

    job.last_http_status = Some(reply.status);
    if reply.status != 200 {
        warn!(status = reply.status, "cloud backend did not accept the submission");
        return Ok(job.outcome(false));
    }

    job.raw_response = Some(String::from_utf8_lossy(&reply.body).into_owned());

    match decode_submit_reply(&reply.body)? {
        SubmitReply::Accepted {
            job_id,
            state,
            message,
        } => {
            info!(job_id = %job_id, state = %state, "cloud backend accepted job");
            job.last_success = Some(true);
            job.job_id = Some(job_id);
            job.last_message = message;
            job.mark_submitted(state);
            Ok(job.outcome(true))
        }
        SubmitReply::Declined { message } => {
            warn!(message = %message, "cloud backend declined job");
            job.last_success = Some(false);
            job.last_message = message;
            Ok(job.outcome(false))
        }
    }
}
