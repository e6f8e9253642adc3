// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print servers and the connections opened to them.

use serde::Deserialize;
use tracing::{info, instrument, warn};

use printlink_core::config::{CloudConfig, SpoolerConfig};
use printlink_core::error::{PrintError, Result};
use printlink_core::types::BackendKind;

use crate::cloud::{self, CloudSession, HttpSession};
use crate::spooler::{IppConnection, SpoolerConnection};

/// Message reported by a successful connection test.
pub const CONNECTION_OK: &str = "Connection OK!";

/// A print backend: a spooler reached over IPP or the cloud print API.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintServer {
    Spooler(SpoolerConfig),
    Cloud(CloudConfig),
}

/// Result of [`PrintServer::test_connection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCheck {
    pub ok: bool,
    pub message: String,
}

impl ConnectionCheck {
    fn ok() -> Self {
        Self {
            ok: true,
            message: CONNECTION_OK.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

impl PrintServer {
    pub fn spooler(config: SpoolerConfig) -> Self {
        Self::Spooler(config)
    }

    pub fn cloud(config: CloudConfig) -> Self {
        Self::Cloud(config)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Spooler(config) => &config.name,
            Self::Cloud(config) => &config.name,
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Spooler(_) => BackendKind::Spooler,
            Self::Cloud(_) => BackendKind::Cloud,
        }
    }

    pub fn is_spooler(&self) -> bool {
        matches!(self, Self::Spooler(_))
    }

    pub fn is_cloud(&self) -> bool {
        matches!(self, Self::Cloud(_))
    }

    /// Open a connection with the parameters in this server's config.
    #[instrument(skip(self), fields(server = %self.name(), backend = %self.kind()))]
    pub async fn open_connection(&self) -> Result<OpenConnection> {
        match self {
            Self::Spooler(config) => Ok(OpenConnection::Spooler(IppConnection::open(config).await?)),
            Self::Cloud(config) => Ok(OpenConnection::Cloud(HttpSession::open(config)?)),
        }
    }

    /// Check that the backend can be reached. Never fails; problems are
    /// reported in the returned message.
    pub async fn test_connection(&self) -> ConnectionCheck {
        let mut conn = match self.open_connection().await {
            Ok(conn) => conn,
            Err(e) => return ConnectionCheck::failed(e.to_string()),
        };
        let check = self.test_connection_with(conn.as_backend()).await;
        conn.close_quietly().await;
        check
    }

    /// [`test_connection`](Self::test_connection) on a caller-owned connection.
    ///
    /// An open spooler connection has already proven reachability; the cloud
    /// API is asked for its printer search page.
    #[instrument(skip(self, conn), fields(server = %self.name()))]
    pub async fn test_connection_with(&self, conn: BackendConnection<'_>) -> ConnectionCheck {
        match (conn, self) {
            (BackendConnection::Spooler(_), Self::Spooler(_)) => ConnectionCheck::ok(),
            (BackendConnection::Cloud(session), Self::Cloud(config)) => {
                let url = match cloud::endpoint_with_params(
                    config,
                    "search",
                    &[("use_cdd", "true"), ("connection_status", "ALL")],
                ) {
                    Ok(url) => url,
                    Err(e) => return ConnectionCheck::failed(e.to_string()),
                };
                match session.get(&url).await {
                    Ok(reply) if reply.is_success() => ConnectionCheck::ok(),
                    Ok(reply) => ConnectionCheck::failed(reply.reason),
                    Err(e) => ConnectionCheck::failed(e.to_string()),
                }
            }
            (conn, server) => ConnectionCheck::failed(
                PrintError::BackendMismatch {
                    job: server.kind(),
                    connection: conn.kind(),
                }
                .to_string(),
            ),
        }
    }

    /// Ids of every printer on this server.
    pub async fn printers(&self) -> Result<Vec<String>> {
        let mut conn = self.open_connection().await?;
        let result = self.printers_with(conn.as_backend()).await;
        conn.close_quietly().await;
        result
    }

    /// [`printers`](Self::printers) on a caller-owned connection.
    #[instrument(skip(self, conn), fields(server = %self.name()))]
    pub async fn printers_with(&self, conn: BackendConnection<'_>) -> Result<Vec<String>> {
        let printers = match (conn, self) {
            (BackendConnection::Spooler(conn), Self::Spooler(_)) => conn.printers().await?,
            (BackendConnection::Cloud(session), Self::Cloud(config)) => {
                let url = cloud::endpoint_with_params(
                    config,
                    "search",
                    &[
                        ("use_cdd", "true"),
                        ("extra_fields", "connectionStatus"),
                        ("q", ""),
                        ("type", ""),
                        ("connection_status", "ALL"),
                    ],
                )?;
                let reply = cloud::expect_success(session.get(&url).await?)?;
                let search: SearchReply = cloud::response::decode_lenient(&reply.body)?;
                search.printers.into_iter().map(|p| p.id).collect()
            }
            (conn, server) => {
                return Err(PrintError::BackendMismatch {
                    job: server.kind(),
                    connection: conn.kind(),
                });
            }
        };
        info!(count = printers.len(), "listed printers");
        Ok(printers)
    }
}

#[derive(Debug, Deserialize)]
struct SearchReply {
    printers: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: String,
}

/// A connection this crate opened and therefore must close.
pub enum OpenConnection {
    Spooler(IppConnection),
    Cloud(HttpSession),
}

impl OpenConnection {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Spooler(_) => BackendKind::Spooler,
            Self::Cloud(_) => BackendKind::Cloud,
        }
    }

    /// Borrow as a [`BackendConnection`] for one operation.
    pub fn as_backend(&mut self) -> BackendConnection<'_> {
        match self {
            Self::Spooler(conn) => BackendConnection::Spooler(conn),
            Self::Cloud(session) => BackendConnection::Cloud(session),
        }
    }

    /// Release the connection.
    pub async fn close(mut self) -> Result<()> {
        match &mut self {
            Self::Spooler(conn) => conn.close().await,
            Self::Cloud(session) => session.close().await,
        }
    }

    pub(crate) async fn close_quietly(self) {
        if let Err(e) = self.close().await {
            warn!(error = %e, "closing backend connection failed");
        }
    }
}

/// A borrowed connection to one of the two backends.
///
/// The borrow is what makes ownership explicit: whoever opened the
/// connection keeps it and decides when to close it.
pub enum BackendConnection<'c> {
    Spooler(&'c mut dyn SpoolerConnection),
    Cloud(&'c dyn CloudSession),
}

impl BackendConnection<'_> {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Spooler(_) => BackendKind::Spooler,
            Self::Cloud(_) => BackendKind::Cloud,
        }
    }

    /// Reborrow for a nested call without giving up this handle.
    pub fn reborrow(&mut self) -> BackendConnection<'_> {
        match self {
            Self::Spooler(conn) => BackendConnection::Spooler(&mut **conn),
            Self::Cloud(session) => BackendConnection::Cloud(*session),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printlink_core::config::DEFAULT_SERVER_NAME;

    #[test]
    fn kind_follows_variant() {
        let spooler = PrintServer::spooler(SpoolerConfig::default());
        let cloud = PrintServer::cloud(CloudConfig::default());
        assert!(spooler.is_spooler() && !spooler.is_cloud());
        assert!(cloud.is_cloud() && !cloud.is_spooler());
        assert_eq!(spooler.kind(), BackendKind::Spooler);
        assert_eq!(cloud.kind(), BackendKind::Cloud);
        assert_eq!(cloud.name(), DEFAULT_SERVER_NAME);
    }

    #[tokio::test]
    async fn cloud_connection_opens_without_network() {
        let server = PrintServer::cloud(CloudConfig::default());
        let conn = server.open_connection().await.unwrap();
        assert_eq!(conn.kind(), BackendKind::Cloud);
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_spooler_fails_connection_test() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();
        drop(listener);

        let server = PrintServer::spooler(SpoolerConfig {
            host,
            connect_timeout_secs: 2,
            ..Default::default()
        });
        let check = server.test_connection().await;
        assert!(!check.ok);
        assert!(check.message.contains("could not connect to spooler backend"));
    }
}
