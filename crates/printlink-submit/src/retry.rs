// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resubmission advice for callers.
//
// The adapter never retries on its own. A caller holding a failed
// submission asks `should_retry` whether a fresh job is worth sending and,
// if so, how long to back off first.

use std::time::Duration;

use tracing::{debug, info, warn};

use printlink_core::error::PrintError;
use printlink_core::types::{ErrorClass, SubmissionStep};

/// Backoff policy for resubmitting a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Wait before the first resubmission; doubles each attempt.
    pub base_delay: Duration,
    /// Ceiling for any single wait.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Wait before resubmission number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let doubled = base.saturating_mul(1u64 << attempt.min(16));
        let spread = jitter(base, attempt);
        Duration::from_millis(doubled.saturating_add(spread)).min(self.max_delay)
    }
}

/// What a caller should do with a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    /// Resubmitting cannot help, or a person has to act first.
    GiveUp(ErrorClass),
    Exhausted,
}

/// Sort a submission error into transient, user-action and permanent.
pub fn classify_error(err: &PrintError) -> ErrorClass {
    match err {
        PrintError::Connection { .. } => ErrorClass::Transient,
        PrintError::Transport(detail) => classify_detail(detail),
        // Once create-job has run the spooler holds a job record; sending
        // again would print twice unless someone checks the queue.
        PrintError::ProtocolStep {
            step: SubmissionStep::CreateJob | SubmissionStep::CloudPost,
            detail,
        } => classify_detail(detail),
        PrintError::ProtocolStep { .. } => ErrorClass::UserAction,
        PrintError::BackendRejected { message } => match http_status(message) {
            Some(401 | 403) => ErrorClass::UserAction,
            Some(408 | 429) | Some(500..=599) => ErrorClass::Transient,
            Some(_) => ErrorClass::Permanent,
            None => classify_detail(message),
        },
        PrintError::Ipp(detail) => classify_detail(detail),
        PrintError::MalformedResponse(_)
        | PrintError::BackendMismatch { .. }
        | PrintError::AlreadySubmitted
        | PrintError::InvalidConfig(_)
        | PrintError::Unsupported(_)
        | PrintError::Serialization(_) => ErrorClass::Permanent,
    }
}

/// Status code from an "HTTP 403 Forbidden" / "HTTP status 403" message.
fn http_status(message: &str) -> Option<u16> {
    let rest = message.strip_prefix("HTTP ")?;
    let rest = rest.strip_prefix("status ").unwrap_or(rest);
    rest.split_whitespace().next()?.parse().ok()
}

/// IPP status names show up both as keywords (`client-error-not-found`) and
/// as Rust variant names (`ClientErrorNotFound`); compare them squashed.
fn classify_detail(detail: &str) -> ErrorClass {
    let squashed: String = detail
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let mentions = |needles: &[&str]| needles.iter().any(|n| squashed.contains(n));

    if mentions(&[
        "clienterrornotauthorized",
        "clienterrorforbidden",
        "printerstopped",
        "notacceptingjobs",
    ]) {
        ErrorClass::UserAction
    } else if mentions(&[
        "clienterrordocumentformat",
        "clienterrornotfound",
        "clienterrorattributes",
        "invalid uri",
    ]) {
        ErrorClass::Permanent
    } else {
        // Network noise and server-error statuses usually clear up.
        ErrorClass::Transient
    }
}

/// Decide whether resubmission number `attempt` (0-based) should happen.
pub fn should_retry(err: &PrintError, attempt: u32, config: &RetryConfig) -> RetryDecision {
    let class = classify_error(err);
    if class != ErrorClass::Transient {
        info!(?class, error = %err, "not resubmitting");
        return RetryDecision::GiveUp(class);
    }
    if attempt >= config.max_retries {
        warn!(attempt, max = config.max_retries, "resubmission attempts used up");
        return RetryDecision::Exhausted;
    }
    let delay = config.backoff(attempt);
    debug!(attempt, delay_ms = delay.as_millis(), "resubmission scheduled");
    RetryDecision::RetryAfter(delay)
}

/// Deterministic offset in [0, base) so callers started together drift apart.
fn jitter(base_ms: u64, attempt: u32) -> u64 {
    let mut x = u64::from(attempt).wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 27;
    x % base_ms.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use printlink_core::types::BackendKind;

    fn rejected(message: &str) -> PrintError {
        PrintError::BackendRejected {
            message: message.into(),
        }
    }

    #[test]
    fn unreachable_backend_is_worth_another_go() {
        let err = PrintError::Connection {
            backend: BackendKind::Cloud,
            detail: "dns error".into(),
        };
        assert_eq!(classify_error(&err), ErrorClass::Transient);
    }

    #[test]
    fn failure_before_job_exists_is_transient() {
        let err = PrintError::ProtocolStep {
            step: SubmissionStep::CreateJob,
            detail: "Create-Job: connection reset by peer".into(),
        };
        assert_eq!(classify_error(&err), ErrorClass::Transient);
    }

    #[test]
    fn failure_after_job_exists_needs_a_person() {
        for step in [
            SubmissionStep::StartDocument,
            SubmissionStep::WriteData,
            SubmissionStep::FinishDocument,
        ] {
            let err = PrintError::ProtocolStep {
                step,
                detail: "timed out after 500ms".into(),
            };
            assert_eq!(classify_error(&err), ErrorClass::UserAction, "{step}");
        }
    }

    #[test]
    fn http_rejections_split_by_status() {
        assert_eq!(classify_error(&rejected("HTTP 403 Forbidden")), ErrorClass::UserAction);
        assert_eq!(classify_error(&rejected("HTTP status 503")), ErrorClass::Transient);
        assert_eq!(classify_error(&rejected("HTTP 404 Not Found")), ErrorClass::Permanent);
    }

    #[test]
    fn ipp_status_spellings_are_equivalent() {
        let keyword = PrintError::Ipp("status client-error-not-found".into());
        let variant = PrintError::Ipp("Get-Printer-Attributes returned status ClientErrorNotFound".into());
        let busy = PrintError::Ipp("Create-Job returned status ServerErrorBusy".into());
        assert_eq!(classify_error(&keyword), ErrorClass::Permanent);
        assert_eq!(classify_error(&variant), ErrorClass::Permanent);
        assert_eq!(classify_error(&busy), ErrorClass::Transient);
    }

    #[test]
    fn misuse_is_never_retried() {
        let config = RetryConfig::default();
        assert_eq!(
            should_retry(&PrintError::AlreadySubmitted, 0, &config),
            RetryDecision::GiveUp(ErrorClass::Permanent)
        );
        assert_eq!(
            should_retry(&PrintError::MalformedResponse("no job".into()), 0, &config),
            RetryDecision::GiveUp(ErrorClass::Permanent)
        );
    }

    #[test]
    fn attempts_run_out() {
        let config = RetryConfig {
            max_retries: 2,
            ..Default::default()
        };
        let err = PrintError::Transport("POST timed out".into());
        assert!(matches!(should_retry(&err, 1, &config), RetryDecision::RetryAfter(_)));
        assert_eq!(should_retry(&err, 2, &config), RetryDecision::Exhausted);
    }

    #[test]
    fn backoff_grows_then_hits_ceiling() {
        let config = RetryConfig::default();
        assert!(config.backoff(1) > config.backoff(0));
        assert!(config.backoff(2) > config.backoff(1));
        assert_eq!(config.backoff(40), config.max_delay);
    }
}
