// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted backend connections shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;

use printlink_core::error::{PrintError, Result};
use printlink_core::types::{JobId, JobOptions};
use printlink_submit::cloud::{CloudSession, HttpReply, SubmitForm};
use printlink_submit::spooler::{SpoolerAttributes, SpoolerConnection};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness. `RUST_LOG` filters it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A spooler that answers each handshake step from a script.
#[derive(Debug)]
pub struct ScriptedSpooler {
    pub write_status: i32,
    pub finish_code: i32,
    /// Refuse start-document with this IPP detail.
    pub fail_start: Option<String>,
    /// Stall write-data this long before answering.
    pub write_delay: Option<Duration>,
    /// Answer for Get-Printer-Attributes; `None` is an IPP-level refusal.
    pub attributes: Option<SpoolerAttributes>,
    pub printer_names: Vec<String>,
    pub calls: Vec<String>,
    pub written: Vec<u8>,
    pub last_options: Option<JobOptions>,
    pub closed: bool,
    jobs_created: u32,
}

impl ScriptedSpooler {
    pub fn new(write_status: i32, finish_code: i32) -> Self {
        Self {
            write_status,
            finish_code,
            fail_start: None,
            write_delay: None,
            attributes: None,
            printer_names: Vec::new(),
            calls: Vec::new(),
            written: Vec::new(),
            last_options: None,
            closed: false,
            jobs_created: 0,
        }
    }

    /// Write fully accepted, finish succeeds.
    pub fn accepting() -> Self {
        Self::new(100, 0)
    }
}

#[async_trait]
impl SpoolerConnection for ScriptedSpooler {
    async fn create_job(
        &mut self,
        printer: &str,
        title: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        self.jobs_created += 1;
        self.calls.push(format!("create-job {printer} {title}"));
        self.last_options = Some(options.clone());
        Ok(JobId::from(format!("J{}", self.jobs_created)))
    }

    async fn start_document(
        &mut self,
        printer: &str,
        job_id: &JobId,
        _title: &str,
        content_type: &str,
        document_count: u32,
    ) -> Result<()> {
        self.calls.push(format!(
            "start-document {printer} {job_id} {content_type} {document_count}"
        ));
        match &self.fail_start {
            Some(detail) => Err(PrintError::Ipp(detail.clone())),
            None => Ok(()),
        }
    }

    async fn write_request_data(&mut self, data: &[u8]) -> Result<i32> {
        self.calls.push(format!("write-data {}", data.len()));
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        self.written.extend_from_slice(data);
        Ok(self.write_status)
    }

    async fn finish_document(&mut self, printer: &str) -> Result<i32> {
        self.calls.push(format!("finish-document {printer}"));
        Ok(self.finish_code)
    }

    async fn printer_attributes(&mut self, printer: &str) -> Result<SpoolerAttributes> {
        self.calls.push(format!("printer-attributes {printer}"));
        self.attributes
            .clone()
            .ok_or_else(|| PrintError::Ipp("client-error-not-found".into()))
    }

    async fn printers(&mut self) -> Result<Vec<String>> {
        Ok(self.printer_names.clone())
    }

    async fn enable_printer(&mut self, printer: &str) -> Result<()> {
        self.calls.push(format!("enable {printer}"));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// A cloud session that hands out scripted replies in order.
#[derive(Debug, Default)]
pub struct ScriptedCloud {
    replies: Mutex<VecDeque<Result<HttpReply>>>,
    pub forms: Mutex<Vec<(String, SubmitForm)>>,
    pub gets: Mutex<Vec<String>>,
    pub delay: Option<Duration>,
}

impl ScriptedCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: &str) -> Self {
        self.push(Ok(http_reply(status, body)))
    }

    pub fn fail(self, err: PrintError) -> Self {
        self.push(Err(err))
    }

    fn push(self, reply: Result<HttpReply>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    fn next(&self) -> Result<HttpReply> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PrintError::Transport("no scripted reply left".into())))
    }

    pub fn form_count(&self) -> usize {
        self.forms.lock().unwrap().len()
    }

    pub fn last_form(&self) -> (String, SubmitForm) {
        self.forms.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl CloudSession for ScriptedCloud {
    async fn post_form(&self, url: &str, form: SubmitForm) -> Result<HttpReply> {
        self.forms.lock().unwrap().push((url.to_owned(), form));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next()
    }

    async fn get(&self, url: &str) -> Result<HttpReply> {
        self.gets.lock().unwrap().push(url.to_owned());
        self.next()
    }
}

pub fn http_reply(status: u16, body: &str) -> HttpReply {
    let reason = match status {
        200 => "OK",
        403 => "Forbidden",
        500 => "Internal Server Error",
        _ => "",
    };
    HttpReply {
        status,
        reason: reason.into(),
        body: body.as_bytes().to_vec(),
    }
}
