//! Wire-level tests against a canned HTTP backend.
//!
//! The stub accepts one request per connection, records `METHOD /path`,
//! and replies from a fixed queue of responses.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use bitebot::api::{ApiClient, ApiError};
use bitebot::app::App;
use bitebot::handler;

struct StubBackend {
    url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubBackend {
    async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            let mut queue = responses.into_iter();
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let request = read_request(&mut stream).await;
                let line = request.lines().next().unwrap_or_default();
                let method_and_path =
                    line.split(' ').take(2).collect::<Vec<_>>().join(" ");
                log.lock().await.push(method_and_path);

                let (status, body) = queue.next().unwrap_or((200, "{}"));
                let reply = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self { url, requests }
    }

    async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

/// Read headers plus a `Content-Length` body, so the client finishes
/// writing before we answer.
async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let Ok(n) = stream.read(&mut chunk).await else {
            break;
        };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let body_len = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:").or_else(|| {
                l.strip_prefix("Content-Length:")
            }))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= head_end + 4 + body_len {
            break;
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

#[tokio::test]
async fn database_connection_failure_is_retried_exactly_once() {
    let stub = StubBackend::start(vec![
        (500, r#"{"detail":"Database connection failed"}"#),
        (200, r#"{"meals":[]}"#),
    ])
    .await;

    let client = ApiClient::new(&stub.url);
    let meals = client.meals_for_day("2026-08-30").await.unwrap();

    assert!(meals.is_empty());
    assert_eq!(
        stub.requests().await,
        vec![
            "GET /nutrition/meals/2026-08-30".to_string(),
            "GET /nutrition/meals/2026-08-30".to_string(),
        ]
    );
}

#[tokio::test]
async fn other_server_errors_are_not_retried() {
    let stub = StubBackend::start(vec![(500, r#"{"detail":"boom"}"#)]).await;

    let client = ApiClient::new(&stub.url);
    let err = client.meals_for_day("2026-08-30").await.unwrap_err();

    assert!(matches!(err, ApiError::ApiError { status: 500, .. }));
    assert_eq!(stub.requests().await.len(), 1);
}

#[tokio::test]
async fn failed_analysis_still_syncs_the_transcript() {
    let stub = StubBackend::start(vec![(
        200,
        r#"{"status":"success","data":{"_id":"srv-1","title":"Meal Log","messages":[]}}"#,
    )])
    .await;

    let mut app = App::new(&stub.url).unwrap();
    app.analyzing = true;
    app.details_task = Some(tokio::spawn(async {
        Err(ApiError::ApiError {
            status: 500,
            detail: "boom".to_string(),
        })
    }));

    while !app.details_task.as_ref().unwrap().is_finished() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    handler::poll_background_tasks(&mut app).await;

    assert!(!app.analyzing);
    let last = app.engine.session.messages.last().unwrap();
    assert!(last.is_error);

    // The transcript went out, and the server id replaced the temp one.
    assert_eq!(stub.requests().await, vec!["POST /api/chat/history".to_string()]);
    assert_eq!(app.engine.session.id, "srv-1");
}
