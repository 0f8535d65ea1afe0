//! Node directory commands.

use anyhow::Result;
use reqwest::{Method, RequestBuilder};

use super::http::{send_text, Target};

const NODES_PATH: &str = "/nodes/";

fn nodes_request(target: &Target, method: Method, name: &str) -> RequestBuilder {
    target
        .request(method, NODES_PATH)
        .query(&[("name", name)])
}

pub async fn cmd_register(target: &Target, name: &str) -> Result<()> {
    send_text(
        nodes_request(target, Method::PUT, name),
        &target.endpoint(NODES_PATH),
    )
    .await?;
    println!("registered {}", name);
    Ok(())
}

pub async fn cmd_lookup(target: &Target, name: &str) -> Result<()> {
    let body = send_text(
        nodes_request(target, Method::GET, name),
        &target.endpoint(NODES_PATH),
    )
    .await?;
    println!("{}", body.trim_end());
    Ok(())
}
