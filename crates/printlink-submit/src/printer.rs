// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A printer on a print server.
//
// Attribute schemas differ between the backends and are not unified: the
// spooler yields a flat IPP attribute map, the cloud API a JSON document.

use serde_json::Value;
use tracing::{debug, instrument};

use printlink_core::error::{PrintError, Result};
use printlink_core::types::BackendKind;

use crate::cloud;
use crate::server::{BackendConnection, PrintServer};
use crate::spooler::SpoolerAttributes;

/// A target printer, identified by name (spooler) or id (cloud).
#[derive(Debug, Clone, PartialEq)]
pub struct Printer {
    server: PrintServer,
    id: String,
}

/// Attributes of a printer in the backend's own schema.
#[derive(Debug, Clone, PartialEq)]
pub enum PrinterAttributes {
    Spooler(SpoolerAttributes),
    Cloud(Value),
}

impl Printer {
    pub fn new(server: PrintServer, id: impl Into<String>) -> Self {
        Self {
            server,
            id: id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn server(&self) -> &PrintServer {
        &self.server
    }

    pub fn backend(&self) -> BackendKind {
        self.server.kind()
    }

    /// Fetch this printer's attributes on a connection opened for the purpose.
    pub async fn attributes(&self) -> Result<PrinterAttributes> {
        let mut conn = self.server.open_connection().await?;
        let result = self.attributes_with(conn.as_backend()).await;
        conn.close_quietly().await;
        result
    }

    /// Whether the backend knows this printer; see [`check_exists_with`](Self::check_exists_with).
    pub async fn check_exists(&self) -> Result<bool> {
        let mut conn = self.server.open_connection().await?;
        let result = self.check_exists_with(conn.as_backend()).await;
        conn.close_quietly().await;
        result
    }

    /// Enable this printer on a connection opened for the purpose.
    pub async fn enable(&self) -> Result<()> {
        let mut conn = self.server.open_connection().await?;
        let result = self.enable_with(conn.as_backend()).await;
        conn.close_quietly().await;
        result
    }

    #[instrument(skip(self, conn), fields(printer = %self.id))]
    pub async fn attributes_with(&self, conn: BackendConnection<'_>) -> Result<PrinterAttributes> {
        match (conn, &self.server) {
            (BackendConnection::Spooler(conn), PrintServer::Spooler(_)) => {
                Ok(PrinterAttributes::Spooler(conn.printer_attributes(&self.id).await?))
            }
            (BackendConnection::Cloud(session), PrintServer::Cloud(config)) => {
                let url =
                    cloud::endpoint_with_params(config, "printer", &[("printerid", self.id.as_str())])?;
                let reply = session.get(&url).await?;
                Ok(PrinterAttributes::Cloud(cloud::decode_lenient(&reply.body)?))
            }
            (conn, server) => Err(mismatch(server, &conn)),
        }
    }

    /// Whether the backend knows this printer.
    ///
    /// Spooler: the printer answers Get-Printer-Attributes under its own
    /// name. An IPP-level refusal means "no"; transport failures propagate.
    ///
    /// Cloud: the `success` flag of the printer lookup. A printer that is
    /// shared with the account but not yet accepted is enabled once and
    /// looked up again.
    #[instrument(skip(self, conn), fields(printer = %self.id))]
    pub async fn check_exists_with(&self, mut conn: BackendConnection<'_>) -> Result<bool> {
        match self.attributes_with(conn.reborrow()).await {
            Ok(PrinterAttributes::Spooler(attrs)) => {
                Ok(attrs.get("printer-name").map(String::as_str) == Some(self.id.as_str()))
            }
            Ok(PrinterAttributes::Cloud(doc)) => {
                if lookup_succeeded(&doc) {
                    return Ok(true);
                }
                debug!("printer lookup failed, accepting invite and retrying");
                self.enable_with(conn.reborrow()).await?;
                match self.attributes_with(conn).await? {
                    PrinterAttributes::Cloud(doc) => Ok(lookup_succeeded(&doc)),
                    PrinterAttributes::Spooler(_) => Ok(false),
                }
            }
            Err(PrintError::Ipp(detail)) => {
                debug!(detail = %detail, "spooler does not know printer");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Enable the printer.
    ///
    /// Cloud: accept the printer's share invite. Spooler: whatever the
    /// connection supports; the IPP connection does not support this.
    #[instrument(skip(self, conn), fields(printer = %self.id))]
    pub async fn enable_with(&self, conn: BackendConnection<'_>) -> Result<()> {
        match (conn, &self.server) {
            (BackendConnection::Spooler(conn), PrintServer::Spooler(_)) => {
                conn.enable_printer(&self.id).await
            }
            (BackendConnection::Cloud(session), PrintServer::Cloud(config)) => {
                let url = cloud::endpoint_with_params(
                    config,
                    "processinvite",
                    &[("accept", "true"), ("printerid", self.id.as_str())],
                )?;
                cloud::expect_success(session.get(&url).await?)?;
                Ok(())
            }
            (conn, server) => Err(mismatch(server, &conn)),
        }
    }
}

fn lookup_succeeded(doc: &Value) -> bool {
    doc.get("success").and_then(Value::as_bool).unwrap_or(false)
}

fn mismatch(server: &PrintServer, conn: &BackendConnection<'_>) -> PrintError {
    PrintError::BackendMismatch {
        job: server.kind(),
        connection: conn.kind(),
    }
}
