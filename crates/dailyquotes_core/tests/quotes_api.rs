use dailyquotes_core::api::{QuotesApiClient, QuotesApiConfig};
use dailyquotes_core::feed::source::{FetchFailure, PagedSource, RandomQuoteSource};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;

/// Serves exactly one HTTP/1.1 response and reports the request line.
async fn serve_once(status: &'static str, body: &'static str) -> (Url, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = socket.read(&mut buf).await.unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buf[..read]);
        }
        let request_line = String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        let _ = tx.send(request_line);

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    (Url::parse(&format!("http://{addr}/")).unwrap(), rx)
}

fn client(base_url: Url) -> QuotesApiClient {
    QuotesApiClient::new(&QuotesApiConfig {
        base_url,
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn fetch_page_decodes_envelope_and_sends_limit_skip() {
    let body = r#"{"quotes":[{"id":11,"quote":"Stay hungry.","author":"Steve Jobs"},{"id":12,"quote":"Less is more.","author":"Mies"}],"total":1454,"skip":10,"limit":2}"#;
    let (base, request) = serve_once("200 OK", body).await;

    let page = client(base).fetch_page(2, 10).await.unwrap();
    assert_eq!(page.total, 1454);
    assert_eq!(page.quotes.len(), 2);
    assert_eq!(page.quotes[0].id, "11");
    assert_eq!(page.quotes[0].content, "Stay hungry.");
    assert_eq!(page.quotes[1].author, "Mies");

    assert_eq!(
        request.await.unwrap(),
        "GET /quotes?limit=2&skip=10 HTTP/1.1"
    );
}

#[tokio::test]
async fn fetch_random_hits_random_endpoint() {
    let body = r#"{"id":7,"quote":"Act.","author":"Someone"}"#;
    let (base, request) = serve_once("200 OK", body).await;

    let quote = client(base).fetch_random().await.unwrap();
    assert_eq!(quote.id, "7");
    assert_eq!(quote.attributed_text(), "Act.\n\n\u{2014} Someone");
    assert_eq!(request.await.unwrap(), "GET /quotes/random HTTP/1.1");
}

#[tokio::test]
async fn non_success_status_is_reported_with_code() {
    let (base, _request) = serve_once("500 Internal Server Error", "{}").await;

    let err = client(base).fetch_page(10, 0).await.unwrap_err();
    assert!(matches!(err, FetchFailure::Status { status: 500, .. }));
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() {
    let (base, _request) = serve_once("200 OK", "{\"quotes\": 42}").await;

    let err = client(base).fetch_page(10, 0).await.unwrap_err();
    assert!(matches!(err, FetchFailure::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base = Url::parse(&format!("http://{addr}/")).unwrap();
    let err = client(base).fetch_random().await.unwrap_err();
    assert!(matches!(err, FetchFailure::Transport(_)));
}
