// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job submission adapter.
//
// Dispatches a job to the submission protocol of its backend and returns the
// normalised outcome. Two entry points differ only in connection ownership:
//
//   - `submit`      opens a connection from the job's print server and always
//                   closes it before returning.
//   - `submit_with` runs on a caller-owned connection and never closes it.
//
// Nothing is retried here; see `retry` for caller-side helpers.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, instrument, warn};

use printlink_core::config::SubmitConfig;
use printlink_core::error::{PrintError, Result};
use printlink_core::types::SubmissionStep;

use crate::job::{PrintJob, SubmissionOutcome};
use crate::server::{BackendConnection, PrintServer};
use crate::{cloud, spooler};

/// Submits print jobs to whichever backend their printer lives on.
#[derive(Debug, Clone, Default)]
pub struct SubmissionAdapter {
    timeout: Option<Duration>,
}

impl SubmissionAdapter {
    /// An adapter that leaves all timing to the transport.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SubmitConfig) -> Self {
        Self {
            timeout: config.timeout(),
        }
    }

    /// Bound every submission by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Submit `job` on a connection opened for the purpose.
    ///
    /// The connection is closed before returning whether or not the
    /// submission succeeded.
    #[instrument(skip_all, fields(backend = %job.backend(), printer = %job.printer().id()))]
    pub async fn submit(&self, job: &mut PrintJob<'_>) -> Result<SubmissionOutcome> {
        if job.is_submitted() {
            return Err(PrintError::AlreadySubmitted);
        }

        let mut conn = job.printer().server().open_connection().await?;
        let result = self.submit_with(job, conn.as_backend()).await;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "closing backend connection failed");
        }
        result
    }

    /// Submit `job` on a caller-owned connection.
    ///
    /// The connection must be for the job's backend; it is left open.
    pub async fn submit_with(
        &self,
        job: &mut PrintJob<'_>,
        conn: BackendConnection<'_>,
    ) -> Result<SubmissionOutcome> {
        if job.is_submitted() {
            return Err(PrintError::AlreadySubmitted);
        }

        let deadline = Deadline::start(self.timeout);
        let outcome = match (conn, job.printer().server()) {
            (BackendConnection::Spooler(conn), PrintServer::Spooler(_)) => {
                spooler::submit(conn, job, deadline).await?
            }
            (BackendConnection::Cloud(session), PrintServer::Cloud(config)) => {
                cloud::submit(session, config, job, deadline).await?
            }
            (conn, server) => {
                return Err(PrintError::BackendMismatch {
                    job: server.kind(),
                    connection: conn.kind(),
                });
            }
        };

        info!(
            backend = %outcome.backend,
            accepted = outcome.accepted,
            state = %outcome.state,
            "submission finished"
        );
        Ok(outcome)
    }
}

/// Absolute deadline for one submission, shared by its steps.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    budget: Option<Duration>,
    at: Option<Instant>,
}

impl Deadline {
    pub(crate) fn start(budget: Option<Duration>) -> Self {
        Self {
            budget,
            at: budget.map(|b| Instant::now() + b),
        }
    }

    /// Run `fut`, returning `None` if the deadline passes first.
    pub(crate) async fn bound<F: Future>(&self, fut: F) -> Option<F::Output> {
        match self.at {
            Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
            None => Some(fut.await),
        }
    }

    /// Run one spooler step within the remaining budget, tagging any failure
    /// with `step`.
    pub(crate) async fn step<T>(
        &self,
        step: SubmissionStep,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match self.bound(fut).await {
            Some(result) => result.map_err(|e| e.at_step(step)),
            None => Err(PrintError::ProtocolStep {
                step,
                detail: format!("timed out after {}", self.describe()),
            }),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self.budget {
            Some(budget) => format!("{}ms", budget.as_millis()),
            None => "no deadline".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unbounded_deadline_always_completes() {
        let deadline = Deadline::start(None);
        assert_eq!(deadline.bound(async { 7 }).await, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_step_is_tagged() {
        let deadline = Deadline::start(Some(Duration::from_millis(50)));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, PrintError>(())
        };
        match deadline.step(SubmissionStep::WriteData, slow).await {
            Err(PrintError::ProtocolStep { step, detail }) => {
                assert_eq!(step, SubmissionStep::WriteData);
                assert!(detail.contains("50ms"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn step_errors_are_tagged() {
        let deadline = Deadline::start(Some(Duration::from_secs(5)));
        let failing = async { Err::<(), _>(PrintError::Ipp("client-error-not-found".into())) };
        let err = deadline
            .step(SubmissionStep::CreateJob, failing)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PrintError::ProtocolStep {
                step: SubmissionStep::CreateJob,
                ..
            }
        ));
    }

    #[test]
    fn adapter_takes_timeout_from_config() {
        let adapter = SubmissionAdapter::from_config(&SubmitConfig {
            timeout_secs: Some(12),
        });
        assert_eq!(adapter.timeout(), Some(Duration::from_secs(12)));
        assert_eq!(SubmissionAdapter::new().timeout(), None);
    }
}
