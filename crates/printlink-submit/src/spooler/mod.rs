// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local print spooler backend.
//
// Submission is a stateful handshake on one connection:
//   1. create-job      → backend assigns the job id
//   2. start-document  → one document part for that job
//   3. write-data      → content bytes; returns a write status
//   4. finish-document → returns the spooler's result code
//
// The job id from step 1 feeds steps 2–4, so a connection must never be
// shared by two submissions at once (`&mut` enforces this).

pub mod ipp_client;

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use printlink_core::error::Result;
use printlink_core::types::{JobId, JobOptions, JobState, SubmissionStep};

use crate::adapter::Deadline;
use crate::job::{PrintJob, SubmissionOutcome};

pub use self::ipp_client::IppConnection;

/// Write status meaning the whole document was taken by the spooler.
pub const WRITE_STATUS_CONTINUE: i32 = 100;

/// Finish-document result code for a committed job.
pub const FINISH_OK: i32 = 0;

/// Finish-document result code for a job the spooler refused.
pub const FINISH_REJECTED: i32 = 1;

/// Flat attribute-name → value view of a spooler printer.
pub type SpoolerAttributes = HashMap<String, String>;

/// An open connection to a print spooler.
#[async_trait]
pub trait SpoolerConnection: Send {
    /// Create a job record on `printer` and return the id the spooler assigned.
    async fn create_job(&mut self, printer: &str, title: &str, options: &JobOptions)
    -> Result<JobId>;

    /// Begin the document transfer for `job_id`.
    async fn start_document(
        &mut self,
        printer: &str,
        job_id: &JobId,
        title: &str,
        content_type: &str,
        document_count: u32,
    ) -> Result<()>;

    /// Write document bytes, returning the spooler's write status.
    async fn write_request_data(&mut self, data: &[u8]) -> Result<i32>;

    /// Commit the document, returning the spooler's result code.
    async fn finish_document(&mut self, printer: &str) -> Result<i32>;

    /// Current attributes of `printer`.
    async fn printer_attributes(&mut self, printer: &str) -> Result<SpoolerAttributes>;

    /// Names of every printer the spooler knows.
    async fn printers(&mut self) -> Result<Vec<String>>;

    /// Resume a stopped printer and let it accept jobs.
    async fn enable_printer(&mut self, printer: &str) -> Result<()>;

    /// Release the connection. Called only on connections opened internally.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Run the four-step spooler handshake for `job`.
///
/// Errors from any step surface tagged with that step and nothing is retried.
/// A finish code other than [`FINISH_OK`] is a declined job, not an error:
/// the outcome reports `accepted == false` and the job id stays set.
#[instrument(skip_all, fields(printer = %job.printer().id(), title = %job.title()))]
pub(crate) async fn submit(
    conn: &mut dyn SpoolerConnection,
    job: &mut PrintJob<'_>,
    deadline: Deadline,
) -> Result<SubmissionOutcome> {
    let printer = job.printer().id();

    let job_id = deadline
        .step(
            SubmissionStep::CreateJob,
            conn.create_job(printer, job.title(), job.options()),
        )
        .await?;
    info!(job_id = %job_id, "spooler created job");
    job.job_id = Some(job_id.clone());

    deadline
        .step(
            SubmissionStep::StartDocument,
            conn.start_document(printer, &job_id, job.title(), job.content_type(), 1),
        )
        .await?;

    let write_status = deadline
        .step(SubmissionStep::WriteData, conn.write_request_data(job.content()))
        .await?;

    let finish_code = deadline
        .step(SubmissionStep::FinishDocument, conn.finish_document(printer))
        .await?;

    if finish_code == FINISH_OK {
        let state = if write_status == WRITE_STATUS_CONTINUE {
            JobState::Queued
        } else {
            warn!(write_status, "document accepted with an incomplete write");
            JobState::Draft
        };
        job.mark_submitted(state);
        info!(job_id = %job_id, state = %state, "spooler accepted job");
    } else {
        warn!(job_id = %job_id, finish_code, "spooler refused the document");
    }

    Ok(job.outcome(job.submitted))
}
