//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A one-route HTTP server that records request bodies.
pub struct MockWebhook {
    pub addr: SocketAddr,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl MockWebhook {
    pub fn url(&self) -> String {
        format!("http://{}/services/T000/B000/XXXX", self.addr)
    }

    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }

    /// Poll until at least `count` bodies arrived or `deadline` passed.
    pub async fn wait_for(&self, count: usize, deadline: Duration) -> Vec<String> {
        let start = tokio::time::Instant::now();
        loop {
            let bodies = self.bodies();
            if bodies.len() >= count || start.elapsed() >= deadline {
                return bodies;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Start a webhook answering every request with `status`.
pub async fn start_mock_webhook(status: u16) -> MockWebhook {
    start_slow_webhook(status, Duration::ZERO).await
}

/// Start a webhook that waits `delay` before answering.
pub async fn start_slow_webhook(status: u16, delay: Duration) -> MockWebhook {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let recorded = bodies.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let Some(body) = read_request_body(&mut socket).await else {
                            return;
                        };
                        recorded.lock().unwrap().push(body);
                        tokio::time::sleep(delay).await;

                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let reply = if status == 200 { "ok" } else { "invalid_payload" };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            reply.len(),
                            reply
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockWebhook { addr, bodies }
}

async fn read_request_body(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body_end = (body_start + content_length).min(buf.len());
    Some(String::from_utf8_lossy(&buf[body_start..body_end]).to_string())
}

/// An access-log line in the proxy's format.
#[allow(dead_code)]
pub fn access_line(pool: &str, upstream_status: &str) -> String {
    format!(
        concat!(
            r#"172.18.0.1 - - [19/Oct/2026:10:15:32 +0000] "GET /version HTTP/1.1" 200 57 "-" "curl/8.5.0" "#,
            r#"pool:"{pool}" release:"{pool}-v1" upstream_status:{status} upstream_addr:172.18.0.3:3000 "#,
            r#"request_time:0.004 upstream_response_time:0.004"#,
        ),
        pool = pool,
        status = upstream_status
    )
}
