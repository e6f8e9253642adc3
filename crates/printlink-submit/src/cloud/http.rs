// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP session with the cloud print API, built on `reqwest`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, instrument};

use printlink_core::config::CloudConfig;
use printlink_core::error::{PrintError, Result};
use printlink_core::types::BackendKind;

use super::{CONTENT_FILE_NAME, CloudSession, HttpReply, SubmitForm};

/// Authorised session with the cloud print API.
///
/// The access token is attached as a bearer token to every request. Cloning
/// the session shares the underlying connection pool.
#[derive(Clone)]
pub struct HttpSession {
    client: Client,
    access_token: Option<String>,
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("authorised", &self.access_token.is_some())
            .finish()
    }
}

impl HttpSession {
    /// Build a session from `config`.
    pub fn open(config: &CloudConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| PrintError::Connection {
                backend: BackendKind::Cloud,
                detail: format!("HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn authorise(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl CloudSession for HttpSession {
    #[instrument(skip(self, form), fields(printer = %form.printer_id, bytes = form.content.len()))]
    async fn post_form(&self, url: &str, form: SubmitForm) -> Result<HttpReply> {
        let content = Part::bytes(form.content)
            .file_name(CONTENT_FILE_NAME)
            .mime_str(&form.content_type)
            .map_err(|e| {
                PrintError::InvalidConfig(format!("content type '{}': {e}", form.content_type))
            })?;
        let multipart = Form::new()
            .text("printerid", form.printer_id)
            .text("title", form.title)
            .text("ticket", form.ticket)
            .part("content", content);

        debug!("posting submission");
        let response = self
            .authorise(self.client.post(url))
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| transport_error("POST", url, e))?;
        read_reply(url, response).await
    }

    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<HttpReply> {
        let response = self
            .authorise(self.client.get(url))
            .send()
            .await
            .map_err(|e| transport_error("GET", url, e))?;
        read_reply(url, response).await
    }
}

async fn read_reply(url: &str, response: Response) -> Result<HttpReply> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error("read body of", url, e))?;
    debug!(status = status.as_u16(), bytes = body.len(), "received reply");
    Ok(HttpReply {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_owned(),
        body: body.to_vec(),
    })
}

fn transport_error(what: &str, url: &str, err: reqwest::Error) -> PrintError {
    if err.is_timeout() {
        PrintError::Transport(format!("{what} {url} timed out: {err}"))
    } else {
        PrintError::Transport(format!("{what} {url}: {err}"))
    }
}
