use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use thiserror::Error;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared client; the timeout of the first caller wins.
pub fn http_client(timeout: Duration) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Connection-level failure: no HTTP status was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// One blocking GET. Non-2xx statuses are returned, not raised.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportFailure>;
}

pub struct ReqwestTransport {
    client: &'static Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
        })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportFailure> {
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, "Mozilla/5.0")
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| TransportFailure(format!("request failed: {err}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|err| TransportFailure(format!("failed reading body: {err}")))?;
        Ok(HttpResponse { status, body })
    }
}
