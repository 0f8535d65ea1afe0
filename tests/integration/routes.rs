//! The rest of the HTTP surface.

use crate::*;

#[tokio::test]
async fn test_healthz() {
    let server = start_server(None).await.unwrap();
    let resp = reqwest::get(server.url("/healthz")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "healthy\n");
}

#[tokio::test]
async fn test_hooker_accepts_json_and_garbage() {
    let server = start_server(None).await.unwrap();
    let client = reqwest::Client::new();

    for (content_type, body) in [
        ("application/json", r#"{"ref":"refs/heads/main","commits":[]}"#),
        ("application/json", "{not json"),
        ("text/plain", "hello"),
    ] {
        let resp = client
            .post(server.url("/hooker"))
            .header("content-type", content_type)
            .header("x-github-event", "push")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.unwrap(), "200 OK\r\n");
    }
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let server = start_server(Some(memory_nodes())).await.unwrap();
    let resp = reqwest::get(server.url("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.text().await.unwrap(), "404 Not Found\n");
}

#[tokio::test]
async fn test_nodes_not_mounted_without_store() {
    let server = start_server(None).await.unwrap();
    let (status, body) = lookup(&server, "edge1").await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "404 Not Found\n");
}

#[tokio::test]
async fn test_graceful_stop() {
    let server = start_server(None).await.unwrap();
    let addr = server.addr;
    server.stop().await.unwrap();

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}
