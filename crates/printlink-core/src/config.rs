// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend connection and submission settings.
//
// Every parameter a connection needs is carried here explicitly; nothing is
// read from process-wide state when a connection is opened.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Display name used for servers the caller did not name.
pub const DEFAULT_SERVER_NAME: &str = "A Print Server";

/// Spooler host used when none is configured.
pub const DEFAULT_SPOOLER_HOST: &str = "localhost:631";

/// Base URI of the cloud print API.
pub const DEFAULT_CLOUD_BASE_URI: &str = "https://www.google.com/cloudprint";

/// Settings for a local or network print spooler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolerConfig {
    /// Human-readable server name.
    pub name: String,
    /// `host:port` of the spooler (default `localhost:631`).
    pub host: String,
    /// User the jobs are submitted as. Empty when unset.
    pub username: Option<String>,
    /// Password for `username`, sent as HTTP basic auth.
    pub password: Option<String>,
    /// Upper bound for establishing the connection.
    pub connect_timeout_secs: u64,
}

impl SpoolerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for SpoolerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.into(),
            host: DEFAULT_SPOOLER_HOST.into(),
            username: None,
            password: None,
            connect_timeout_secs: 30,
        }
    }
}

/// Settings for the cloud print HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Human-readable server name.
    pub name: String,
    /// API base; submissions go to `{base_uri}/submit`.
    pub base_uri: String,
    /// Bearer token attached to every request. Minting it is up to the caller.
    pub access_token: Option<String>,
    /// Upper bound for establishing the TCP/TLS connection.
    pub connect_timeout_secs: u64,
}

impl CloudConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Join an API path onto the base URI.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_uri.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.into(),
            base_uri: DEFAULT_CLOUD_BASE_URI.into(),
            access_token: None,
            connect_timeout_secs: 30,
        }
    }
}

/// Settings for the submission adapter itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    /// Deadline for a whole submission. `None` leaves timing to the transport.
    pub timeout_secs: Option<u64>,
}

impl SubmitConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
