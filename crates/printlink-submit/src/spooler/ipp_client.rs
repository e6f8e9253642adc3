// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spooler connection over IPP, as spoken by CUPS.
//
// Maps the spooler handshake onto standard IPP operations:
//   - create-job      → Create-Job               (RFC 8011 §4.2.4)
//   - write-data      → buffered locally
//   - finish-document → Send-Document, last=true  (RFC 8011 §4.3.1)
//   - printers        → CUPS-Get-Printers
//   - attributes      → Get-Printer-Attributes   (RFC 8011 §4.2.5)

use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use ipp::prelude::*;
use serde_json::Value;
use tokio::net::TcpStream;
use tracing::{debug, error, info, instrument};

use printlink_core::config::SpoolerConfig;
use printlink_core::error::{PrintError, Result};
use printlink_core::types::{BackendKind, JobId, JobOptions};

use super::{FINISH_OK, FINISH_REJECTED, SpoolerAttributes, SpoolerConnection, WRITE_STATUS_CONTINUE};

/// A document between start-document and finish-document.
#[derive(Debug)]
struct PendingDocument {
    printer: String,
    job_id: i32,
    title: String,
    content_type: String,
    data: Vec<u8>,
}

/// IPP connection to a CUPS-style spooler.
///
/// Server, user and password are fixed when the connection is opened and
/// travel with every request; no process-wide state is touched. The user
/// goes out as `requesting-user-name`, and as basic auth when a password is
/// configured too.
pub struct IppConnection {
    /// `host:port` of the spooler.
    host: String,
    username: Option<String>,
    password: Option<String>,
    pending: Option<PendingDocument>,
}

impl IppConnection {
    /// Open a connection to the spooler named in `config`.
    ///
    /// IPP itself is connectionless HTTP, so opening checks that the spooler
    /// accepts TCP connections within the configured timeout.
    #[instrument(skip(config), fields(host = %config.host))]
    pub async fn open(config: &SpoolerConfig) -> Result<Self> {
        probe_host(&config.host, config.connect_timeout()).await?;
        info!("spooler connection opened");
        Ok(Self {
            host: config.host.clone(),
            username: config.username.clone().filter(|u| !u.is_empty()),
            password: config.password.clone().filter(|p| !p.is_empty()),
            pending: None,
        })
    }

    /// The `host:port` this connection talks to.
    pub fn host(&self) -> &str {
        &self.host
    }

    fn server_uri(&self) -> Result<Uri> {
        parse_uri(&format!("ipp://{}/", self.host))
    }

    fn printer_uri(&self, printer: &str) -> Result<Uri> {
        parse_uri(&format!("ipp://{}/printers/{}", self.host, printer))
    }

    fn client(&self, uri: Uri) -> AsyncIppClient {
        match (&self.username, &self.password) {
            (Some(user), Some(password)) => {
                AsyncIppClient::builder(uri).basic_auth(user, password).build()
            }
            _ => AsyncIppClient::new(uri),
        }
    }
}

#[async_trait]
impl SpoolerConnection for IppConnection {
    #[instrument(skip(self, options), fields(host = %self.host))]
    async fn create_job(
        &mut self,
        printer: &str,
        title: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        let uri = self.printer_uri(printer)?;
        let mut builder = IppOperationBuilder::create_job(uri.clone()).job_name(title);
        if let Some(user) = &self.username {
            builder = builder.attribute(IppAttribute::new(
                "requesting-user-name",
                IppValue::NameWithoutLanguage(user.clone()),
            ));
        }
        for attribute in option_attributes(options) {
            builder = builder.attribute(attribute);
        }

        debug!(options = options.len(), "sending Create-Job");
        let response = self
            .client(uri)
            .send(builder.build())
            .await
            .map_err(|e| PrintError::Transport(format!("Create-Job: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Create-Job failed");
            return Err(PrintError::Ipp(format!("Create-Job returned status {code:?}")));
        }

        let job_id = extract_job_id(response.attributes()).ok_or_else(|| {
            PrintError::Ipp("Create-Job response missing job-id attribute".into())
        })?;
        Ok(JobId::from(job_id))
    }

    async fn start_document(
        &mut self,
        printer: &str,
        job_id: &JobId,
        title: &str,
        content_type: &str,
        document_count: u32,
    ) -> Result<()> {
        if document_count != 1 {
            return Err(PrintError::Unsupported(format!(
                "{document_count} documents in one IPP job"
            )));
        }
        let job_id = job_id
            .as_str()
            .parse::<i32>()
            .map_err(|_| PrintError::Ipp(format!("'{job_id}' is not an IPP job-id")))?;

        self.pending = Some(PendingDocument {
            printer: printer.to_owned(),
            job_id,
            title: title.to_owned(),
            content_type: content_type.to_owned(),
            data: Vec::new(),
        });
        Ok(())
    }

    async fn write_request_data(&mut self, data: &[u8]) -> Result<i32> {
        let pending = self
            .pending
            .as_mut()
            .ok_or_else(|| PrintError::Ipp("write before start-document".into()))?;
        pending.data.extend_from_slice(data);
        Ok(WRITE_STATUS_CONTINUE)
    }

    #[instrument(skip(self), fields(host = %self.host))]
    async fn finish_document(&mut self, printer: &str) -> Result<i32> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| PrintError::Ipp("finish before start-document".into()))?;
        if pending.printer != printer {
            return Err(PrintError::Ipp(format!(
                "document was started on '{}', not '{printer}'",
                pending.printer
            )));
        }

        let uri = self.printer_uri(printer)?;
        info!(
            job_id = pending.job_id,
            title = %pending.title,
            mime = %pending.content_type,
            bytes = pending.data.len(),
            "sending Send-Document"
        );
        let payload = IppPayload::new(Cursor::new(pending.data));
        let mut builder = IppOperationBuilder::send_document(uri.clone(), pending.job_id, payload)
            .document_format(pending.content_type.as_str())
            .last(true);
        if let Some(user) = &self.username {
            builder = builder.user_name(user.as_str());
        }
        let operation = builder.build();

        let response = self
            .client(uri)
            .send(operation)
            .await
            .map_err(|e| {
                PrintError::Transport(format!("Send-Document({}): {e}", pending.job_id))
            })?;

        if response.header().status_code().is_success() {
            Ok(FINISH_OK)
        } else {
            let code = response.header().status_code();
            error!(status = ?code, job_id = pending.job_id, "Send-Document refused");
            Ok(FINISH_REJECTED)
        }
    }

    #[instrument(skip(self), fields(host = %self.host))]
    async fn printer_attributes(&mut self, printer: &str) -> Result<SpoolerAttributes> {
        let uri = self.printer_uri(printer)?;
        let operation = IppOperationBuilder::get_printer_attributes(uri.clone()).build();

        debug!("sending Get-Printer-Attributes");
        let response = self
            .client(uri)
            .send(operation)
            .await
            .map_err(|e| PrintError::Transport(format!("Get-Printer-Attributes: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "Get-Printer-Attributes failed");
            return Err(PrintError::Ipp(format!(
                "Get-Printer-Attributes returned status {code:?}"
            )));
        }

        let attrs = flatten_attributes(response.attributes());
        debug!(count = attrs.len(), "received printer attributes");
        Ok(attrs)
    }

    #[instrument(skip(self), fields(host = %self.host))]
    async fn printers(&mut self) -> Result<Vec<String>> {
        let uri = self.server_uri()?;
        let operation = IppOperationBuilder::cups().get_printers();

        let response = self
            .client(uri)
            .send(operation)
            .await
            .map_err(|e| PrintError::Transport(format!("CUPS-Get-Printers: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "CUPS-Get-Printers failed");
            return Err(PrintError::Ipp(format!("CUPS-Get-Printers returned status {code:?}")));
        }

        let names = printer_names(response.attributes());
        debug!(count = names.len(), "received printer list");
        Ok(names)
    }

    async fn enable_printer(&mut self, printer: &str) -> Result<()> {
        Err(PrintError::Unsupported(format!(
            "enabling spooler printer '{printer}' over IPP"
        )))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(pending) = self.pending.take() {
            debug!(job_id = pending.job_id, "dropping unfinished document on close");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn probe_host(host: &str, timeout: Duration) -> Result<()> {
    let connect_error = |detail: String| PrintError::Connection {
        backend: BackendKind::Spooler,
        detail,
    };
    tokio::time::timeout(timeout, TcpStream::connect(host))
        .await
        .map_err(|_| {
            connect_error(format!(
                "connection to {host} timed out after {}s",
                timeout.as_secs()
            ))
        })?
        .map_err(|e| connect_error(format!("connect to {host}: {e}")))?;
    Ok(())
}

fn parse_uri(uri: &str) -> Result<Uri> {
    uri.parse()
        .map_err(|e| PrintError::InvalidConfig(format!("invalid URI '{uri}': {e}")))
}

/// Convert job options into IPP job attributes.
///
/// Booleans and 32-bit integers keep their IPP types; strings go out as
/// keywords; anything else is sent as its JSON text.
fn option_attributes(options: &JobOptions) -> Vec<IppAttribute> {
    options
        .iter()
        .map(|(name, value)| IppAttribute::new(name.as_str(), option_value(value)))
        .collect()
}

fn option_value(value: &Value) -> IppValue {
    match value {
        Value::Bool(flag) => IppValue::Boolean(*flag),
        Value::Number(number) => match number.as_i64().and_then(|n| i32::try_from(n).ok()) {
            Some(n) => IppValue::Integer(n),
            None => IppValue::TextWithoutLanguage(number.to_string()),
        },
        Value::String(text) => IppValue::Keyword(text.clone()),
        other => IppValue::TextWithoutLanguage(other.to_string()),
    }
}

/// Flatten all attribute groups in an IPP response into a single map.
fn flatten_attributes(attrs: &IppAttributes) -> SpoolerAttributes {
    let mut map = HashMap::new();
    for group in attrs.groups() {
        for (name, attr) in group.attributes() {
            map.insert(name.clone(), format!("{}", attr.value()));
        }
    }
    map
}

/// Extract the `job-id` integer from a response's Job Attributes group.
fn extract_job_id(attrs: &IppAttributes) -> Option<i32> {
    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        if let Some(attr) = group.attributes().get("job-id")
            && let IppValue::Integer(id) = attr.value()
        {
            return Some(*id);
        }
    }
    None
}

/// Collect `printer-name` from every Printer Attributes group.
fn printer_names(attrs: &IppAttributes) -> Vec<String> {
    attrs
        .groups_of(DelimiterTag::PrinterAttributes)
        .filter_map(|group| group.attributes().get("printer-name"))
        .map(|attr| format!("{}", attr.value()))
        .collect()
}
