// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Printlink.

use thiserror::Error;

use crate::types::{BackendKind, SubmissionStep};

/// Top-level error type for all Printlink operations.
///
/// A backend that answers but declines a job is not an error: submission
/// reports that through `SubmissionOutcome::accepted`. Only callers that ask
/// for it (`into_accepted`) see [`PrintError::BackendRejected`].
#[derive(Debug, Error)]
pub enum PrintError {
    // -- Submission errors --
    #[error("could not connect to {backend} backend: {detail}")]
    Connection { backend: BackendKind, detail: String },

    #[error("spooler step {step} failed: {detail}")]
    ProtocolStep { step: SubmissionStep, detail: String },

    #[error("HTTP transport failed: {0}")]
    Transport(String),

    #[error("backend rejected the job: {}", reason_or_default(.message))]
    BackendRejected { message: String },

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    // -- Printer / server capability errors --
    #[error("IPP request failed: {0}")]
    Ipp(String),

    #[error("job targets the {job} backend but the connection is for {connection}")]
    BackendMismatch {
        job: BackendKind,
        connection: BackendKind,
    },

    #[error("job was already submitted")]
    AlreadySubmitted,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrintError {
    /// Tag an error raised while running a spooler step with that step.
    ///
    /// Errors that already name a step keep their original tag.
    pub fn at_step(self, step: SubmissionStep) -> Self {
        match self {
            tagged @ PrintError::ProtocolStep { .. } => tagged,
            other => PrintError::ProtocolStep {
                step,
                detail: other.to_string(),
            },
        }
    }
}

fn reason_or_default(message: &str) -> &str {
    if message.is_empty() { "no reason given" } else { message }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintError>;
