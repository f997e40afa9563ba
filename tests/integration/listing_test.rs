//! Integration tests for the item-detail client against a local stub server

use auction_watch::listing::{
    ListingClient, ListingClientConfig, ListingFetcher, ListingId, RemainingTime, TransportError,
};
use rust_decimal_macros::dec;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve one canned HTTP response; yields the request line
async fn serve_once(
    status: &'static str,
    body: &'static str,
) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let request_line = String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        let _ = tx.send(request_line);

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    (format!("http://{}/api", addr), rx)
}

fn client(base_url: String) -> ListingClient {
    ListingClient::with_config(ListingClientConfig {
        base_url,
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_listing() {
    let body = r#"{
        "itemId": 555,
        "title": "Film Camera",
        "currentPrice": 24,
        "remainingTime": "1d 4h",
        "endTime": "2024-03-20T18:30:00",
        "categoryId": 3,
        "categoryParentList": "1|Electronics|3|Cameras",
        "bidHistory": { "bidSummary": [] }
    }"#;
    let (base_url, request) = serve_once("200 OK", body).await;

    let snapshot = client(base_url).fetch(ListingId(555)).await.unwrap();

    assert_eq!(
        request.await.unwrap(),
        "GET /api/ItemDetail/GetItemDetailModelByItemId/555 HTTP/1.1"
    );
    assert_eq!(snapshot.id, ListingId(555));
    assert_eq!(snapshot.current_price, dec!(24));
    assert_eq!(
        snapshot.remaining,
        RemainingTime::Countdown(Duration::from_secs(28 * 3600))
    );
    assert_eq!(snapshot.category.unwrap().path, "Electronics > Cameras");
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let (base_url, _request) = serve_once("503 Service Unavailable", "down").await;

    let result = client(base_url).fetch(ListingId(1)).await;

    match result {
        Err(TransportError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "down");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_malformed_payload() {
    let (base_url, _request) = serve_once("200 OK", r#"{"itemId": "abc"}"#).await;

    let result = client(base_url).fetch(ListingId(1)).await;
    assert!(matches!(result, Err(TransportError::Malformed(_))));
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(format!("http://{}/api", addr)).fetch(ListingId(1)).await;
    assert!(matches!(result, Err(TransportError::Request(_))));
}
