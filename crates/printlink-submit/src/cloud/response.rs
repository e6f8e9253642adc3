// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoding of cloud submission responses.
//
// The backend is known to put raw control characters (newlines, tabs) inside
// JSON strings. Those are escaped first; the result is then decoded against
// a strict schema so a missing field fails closed instead of being read as
// null later on.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use printlink_core::error::{PrintError, Result};
use printlink_core::types::{JobId, JobState};

/// What a cloud backend said about a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReply {
    Accepted {
        job_id: JobId,
        state: JobState,
        message: String,
    },
    Declined {
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawReply {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    job: Option<RawJob>,
}

#[derive(Debug, Deserialize)]
struct RawJob {
    id: String,
    #[serde(rename = "semanticState")]
    semantic_state: RawSemanticState,
}

#[derive(Debug, Deserialize)]
struct RawSemanticState {
    state: RawState,
}

#[derive(Debug, Deserialize)]
struct RawState {
    #[serde(rename = "type")]
    kind: String,
}

/// Decode the body of an HTTP 200 submission response.
///
/// `success: true` requires `job.id`, `job.semanticState.state.type` (one of
/// the known job states) and `message`. `success: false` needs nothing else;
/// a `message`, if present, is kept.
pub fn decode_submit_reply(body: &[u8]) -> Result<SubmitReply> {
    let raw: RawReply = decode_lenient(body)?;

    if !raw.success {
        return Ok(SubmitReply::Declined {
            message: raw.message.unwrap_or_default(),
        });
    }

    let job = raw
        .job
        .ok_or_else(|| PrintError::MalformedResponse("accepted response without `job`".into()))?;
    let message = raw.message.ok_or_else(|| {
        PrintError::MalformedResponse("accepted response without `message`".into())
    })?;
    let state = job
        .semantic_state
        .state
        .kind
        .parse::<JobState>()
        .map_err(|e| PrintError::MalformedResponse(e.to_string()))?;

    Ok(SubmitReply::Accepted {
        job_id: JobId::from(job.id),
        state,
        message,
    })
}

/// Decode a response body into `T`, tolerating raw control characters in
/// strings but nothing else.
pub fn decode_lenient<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(body)
        .map_err(|e| PrintError::MalformedResponse(format!("body is not UTF-8: {e}")))?;
    serde_json::from_str(&escape_control_chars(text))
        .map_err(|e| PrintError::MalformedResponse(e.to_string()))
}

/// Escape raw control characters that appear inside JSON string literals.
///
/// Characters outside strings are left alone so structural whitespace keeps
/// working; escape sequences already present are copied through untouched.
pub fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            } else if u32::from(c) < 0x20 {
                match c {
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    other => out.push_str(&format!("\\u{:04x}", other as u32)),
                }
                continue;
            }
        } else if c == '"' {
            in_string = true;
        }
        out.push(c);
    }

    out
}
