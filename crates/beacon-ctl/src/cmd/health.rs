//! Liveness check.

use anyhow::Result;
use reqwest::Method;

use super::http::{send_text, Target};

pub async fn cmd_health(target: &Target) -> Result<()> {
    let body = send_text(
        target.request(Method::GET, "/healthz"),
        &target.endpoint("/healthz"),
    )
    .await?;
    print!("{}", body);
    Ok(())
}
