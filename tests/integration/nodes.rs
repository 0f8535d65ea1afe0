//! Directory endpoint over real HTTP, memory backend.

use crate::*;

#[tokio::test]
async fn test_register_and_lookup_over_loopback() {
    let server = start_server(Some(memory_nodes())).await.unwrap();

    assert_eq!(register(&server, "edge1").await.unwrap(), StatusCode::OK);

    let (status, body) = lookup(&server, "edge1").await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "127.0.0.1\r\n");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_forwarded_for_overrides_peer() {
    let server = start_server(Some(memory_nodes())).await.unwrap();

    let (status, _) = nodes_request(
        &server,
        Method::PUT,
        "?name=edge2",
        Some(BEARER),
        Some("203.0.113.7, 10.0.0.1"),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::OK);

    let (_, body) = lookup(&server, "edge2").await.unwrap();
    assert_eq!(body, "203.0.113.7\r\n");
}

#[tokio::test]
async fn test_overwrite_keeps_latest() {
    let server = start_server(Some(memory_nodes())).await.unwrap();

    for xff in ["198.51.100.1", "198.51.100.2"] {
        let (status, _) = nodes_request(
            &server,
            Method::PUT,
            "?name=edge1",
            Some(BEARER),
            Some(xff),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = lookup(&server, "edge1").await.unwrap();
    assert_eq!(body, "198.51.100.2\r\n");
}

#[tokio::test]
async fn test_unknown_name_is_not_found() {
    let server = start_server(Some(memory_nodes())).await.unwrap();
    let (status, body) = lookup(&server, "ghost").await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "404 Not Found\n");
}

#[tokio::test]
async fn test_auth_required_for_everything() {
    let server = start_server(Some(memory_nodes())).await.unwrap();

    for auth in [None, Some("Bearer wrong"), Some("bearer secret")] {
        for method in [Method::GET, Method::PUT, Method::POST, Method::DELETE] {
            for query in ["?name=edge1", ""] {
                let (status, body) =
                    nodes_request(&server, method.clone(), query, auth, None)
                        .await
                        .unwrap();
                assert_eq!(status, StatusCode::FORBIDDEN, "{method} {query:?} {auth:?}");
                assert_eq!(body, "403 Forbidden\n");
            }
        }
    }

    // Nothing was written by the rejected PUTs.
    let (status, _) = lookup(&server, "edge1").await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_name_is_bad_request() {
    let server = start_server(Some(memory_nodes())).await.unwrap();

    for method in [Method::GET, Method::PUT] {
        for query in ["", "?name="] {
            let (status, _) = nodes_request(&server, method.clone(), query, Some(BEARER), None)
                .await
                .unwrap();
            assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {query:?}");
        }
    }
}

#[tokio::test]
async fn test_other_methods_forbidden_with_auth() {
    let server = start_server(Some(memory_nodes())).await.unwrap();
    for method in [Method::POST, Method::DELETE, Method::PATCH] {
        let (status, _) = nodes_request(&server, method.clone(), "?name=edge1", Some(BEARER), None)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::FORBIDDEN, "{method}");
    }
}

#[tokio::test]
async fn test_concurrent_registrations() {
    let server = Arc::new(start_server(Some(memory_nodes())).await.unwrap());

    let mut tasks = Vec::new();
    for i in 0..32 {
        let server = server.clone();
        tasks.push(tokio::spawn(async move {
            nodes_request(
                &server,
                Method::PUT,
                &format!("?name=node{}", i),
                Some(BEARER),
                Some(&format!("192.0.2.{}", i)),
            )
            .await
        }));
    }
    for task in tasks {
        let (status, _) = task.await.unwrap().unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    for i in 0..32 {
        let (_, body) = lookup(&server, &format!("node{}", i)).await.unwrap();
        assert_eq!(body, format!("192.0.2.{}\r\n", i));
    }
}
