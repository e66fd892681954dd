#![deny(clippy::all, clippy::pedantic)]

use std::fs;

use folio_api_types::{ADMIN_KEY_HEADER, ErrorBody};
use reqwest::header::HeaderValue;
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::args::Cli;

const FALLBACK_SERVER_ERROR: &str = "An error occurred";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("site URL is required (use --site or FOLIO_SITE_URL)")]
    MissingSite,
    #[error("admin key is required (use --key-file or FOLIO_ADMIN_KEY)")]
    MissingKey,
    #[error("failed to read key file: {0}")]
    KeyFile(std::io::Error),
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to read from stdin: {0}")]
    Stdin(std::io::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Network error. Please try again.")]
    Network(#[from] reqwest::Error),
    /// Message from the server's `{error}` body.
    #[error("{0}")]
    Server(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("{0}")]
    InvalidInput(String),
}

#[derive(Clone, Debug)]
pub struct Ctx {
    pub client: Client,
    pub base: Url,
    pub key: Option<String>,
}

impl Ctx {
    pub fn new(site: &str, key: Option<String>) -> Result<Self, CliError> {
        let base = Url::parse(site)?.join("/")?;
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self { client, base, key })
    }

    pub fn user_agent() -> &'static str {
        concat!("folio-cli/", env!("CARGO_PKG_VERSION"))
    }

    /// Fails early for commands the server would reject without a key.
    pub fn require_admin(&self) -> Result<(), CliError> {
        self.admin_header().map(|_| ())
    }

    pub fn admin_header(&self) -> Result<HeaderValue, CliError> {
        let key = self.key.as_deref().ok_or(CliError::MissingKey)?;
        HeaderValue::from_str(key).map_err(|e| CliError::InvalidInput(e.to_string()))
    }

    pub fn url(&self, path: &str) -> Result<Url, CliError> {
        self.base.join(path).map_err(CliError::Url)
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<serde_json::Value>,
    ) -> Result<T, CliError> {
        let mut url = self.url(path)?;
        if let Some(q) = query {
            url.set_query(None);
            let mut qp = url.query_pairs_mut();
            for (k, v) in q {
                qp.append_pair(k, v);
            }
        }

        let mut req = self.client.request(method, url);
        if self.key.is_some() {
            req = req.header(ADMIN_KEY_HEADER, self.admin_header()?);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }

        let resp = req.send().await?;
        Self::handle(resp).await
    }

    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, CliError> {
        let url = self.url(path)?;
        let resp = self
            .client
            .post(url)
            .header(ADMIN_KEY_HEADER, self.admin_header()?)
            .multipart(form)
            .send()
            .await?;
        Self::handle(resp).await
    }

    async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T, CliError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(server_error(&bytes));
        }
        serde_json::from_slice(&bytes).map_err(|e| CliError::Decode(e.to_string()))
    }
}

/// The server's `error` message, or a generic one when the body has none.
fn server_error(body: &[u8]) -> CliError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|body| body.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SERVER_ERROR.to_string());
    CliError::Server(message)
}

pub fn build_ctx_from_cli(cli: &Cli) -> Result<Ctx, CliError> {
    let site = cli.site.clone().ok_or(CliError::MissingSite)?;
    let key = if let Some(path) = &cli.key_file {
        Some(
            fs::read_to_string(path)
                .map_err(CliError::KeyFile)?
                .trim()
                .to_string(),
        )
    } else {
        cli.admin_key_env.clone()
    };

    Ctx::new(&site, key.filter(|k| !k.is_empty()))
}
