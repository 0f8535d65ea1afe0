//! /hooker — webhook inspector. Logs whatever is POSTed and says OK.

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::Extension;
use bytes::Bytes;

use beacon_core::RemoteAddr;

pub async fn handle_hooker(
    Extension(remote): Extension<RemoteAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> &'static str {
    tracing::info!(remote = %remote, "hooker: headers");
    for line in header_lines(&headers) {
        tracing::info!("  {}", line);
    }

    tracing::info!(bytes = body.len(), "hooker: body");
    tracing::info!("{}", String::from_utf8_lossy(&body));

    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    match pretty_json(content_type, &body) {
        Some(Ok(text)) => {
            tracing::info!("hooker: json");
            tracing::info!("{}", text);
        }
        Some(Err(e)) => tracing::warn!(error = %e, "hooker: json: unmarshal error"),
        None => {}
    }

    "200 OK\r\n"
}

/// `name: v1, v2` per header, sorted by name.
pub fn header_lines(headers: &HeaderMap) -> Vec<String> {
    let mut names: Vec<&str> = headers.keys().map(|k| k.as_str()).collect();
    names.sort_unstable();

    names
        .into_iter()
        .map(|name| {
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .map(|v| v.to_str().unwrap_or("<binary>"))
                .collect();
            format!("{}: {}", name, values.join(", "))
        })
        .collect()
}

/// Re-indented body when it was sent as `application/json`.
pub fn pretty_json(
    content_type: Option<&str>,
    body: &[u8],
) -> Option<Result<String, serde_json::Error>> {
    if content_type != Some("application/json") {
        return None;
    }
    Some(
        serde_json::from_slice::<serde_json::Value>(body)
            .and_then(|value| serde_json::to_string_pretty(&value)),
    )
}
