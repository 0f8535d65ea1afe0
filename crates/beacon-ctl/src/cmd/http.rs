//! Shared HTTP request helpers for CLI commands.

use anyhow::{bail, Context, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder};

/// Where to send requests and what to authenticate with.
pub struct Target {
    pub url: String,
    pub token: Option<String>,
}

impl Target {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }

    /// Request with the bearer header attached when a token is set.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = reqwest::Client::new().request(method, self.endpoint(path));
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }
}

/// Send and return the body text; any non-2xx status is an error carrying
/// the status line.
pub async fn send_text(request: RequestBuilder, url: &str) -> Result<String> {
    let resp = request
        .send()
        .await
        .with_context(|| format!("failed to connect to beacond at {}, is it running?", url))?;

    let status = resp.status();
    let body = resp.text().await.context("failed to read response")?;
    if !status.is_success() {
        bail!("{}", status);
    }
    Ok(body)
}
