// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for decoding cloud print submit responses.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use printlink_submit::cloud::response::escape_control_chars;
use printlink_submit::cloud::decode_submit_reply;

const ACCEPTED: &str = r#"{"success":true,"job":{"id":"X1","semanticState":{"state":{"type":"IN_PROGRESS"}}},"message":"ok"}"#;

/// A reply whose message carries raw newlines and tabs, as some backends send.
fn reply_with_control_chars(lines: usize) -> String {
    let message: String = (0..lines).map(|i| format!("line {i}\n\tdetail\r")).collect();
    format!(
        r#"{{"success":true,"job":{{"id":"X1","semanticState":{{"state":{{"type":"QUEUED"}}}}}},"message":"{message}"}}"#
    )
}

fn bench_decode_submit_reply(c: &mut Criterion) {
    c.bench_function("decode_submit_reply (accepted)", |b| {
        b.iter(|| decode_submit_reply(black_box(ACCEPTED.as_bytes())))
    });

    let noisy = reply_with_control_chars(64);
    c.bench_function("decode_submit_reply (64 raw newlines)", |b| {
        b.iter(|| decode_submit_reply(black_box(noisy.as_bytes())))
    });
}

fn bench_escape_control_chars(c: &mut Criterion) {
    let noisy = reply_with_control_chars(1024);
    c.bench_function("escape_control_chars (1024 lines)", |b| {
        b.iter(|| escape_control_chars(black_box(&noisy)))
    });
}

criterion_group!(benches, bench_decode_submit_reply, bench_escape_control_chars);
criterion_main!(benches);
