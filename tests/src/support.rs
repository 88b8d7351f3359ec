//! Test doubles shared by the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mailscout_core::network::tcp::{PortProbe, TcpProbe};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

pub const SMTP_BANNER: &[u8] = b"220 MailHog SMTP\r\n";

/// A tiny mail catcher: every message accepted on the SMTP side shows up in the
/// HTTP listing.
pub struct FakeMailCatcher {
    pub smtp_port: u16,
    pub api_port: u16,
    received: Arc<AtomicUsize>,
}

impl FakeMailCatcher {
    pub async fn start() -> Self {
        let smtp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let api = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(smtp, api)
    }

    /// Both sides on consecutive ports, SMTP first, so a tiny range covers them.
    pub async fn start_adjacent() -> Self {
        let (smtp, api) = bind_adjacent().await;
        Self::serve(smtp, api)
    }

    fn serve(smtp: TcpListener, api: TcpListener) -> Self {
        let smtp_port = smtp.local_addr().unwrap().port();
        let api_port = api.local_addr().unwrap().port();
        let received = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&received);
        tokio::spawn(async move {
            while let Ok((socket, _)) = smtp.accept().await {
                tokio::spawn(smtp_session(socket, Arc::clone(&counter)));
            }
        });

        let counter = Arc::clone(&received);
        tokio::spawn(async move {
            while let Ok((socket, _)) = api.accept().await {
                tokio::spawn(http_exchange(socket, Arc::clone(&counter)));
            }
        });

        Self {
            smtp_port,
            api_port,
            received,
        }
    }

    pub fn received(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }
}

async fn bind_adjacent() -> (TcpListener, TcpListener) {
    for port in (20_000u16..40_000).step_by(7) {
        let Ok(first) = TcpListener::bind(("127.0.0.1", port)).await else {
            continue;
        };
        if let Ok(second) = TcpListener::bind(("127.0.0.1", port + 1)).await {
            return (first, second);
        }
        drop(first);
    }
    panic!("no two adjacent free ports");
}

async fn smtp_session(socket: TcpStream, received: Arc<AtomicUsize>) {
    let (read, mut write) = socket.into_split();
    let mut lines = BufReader::new(read).lines();
    if write.write_all(SMTP_BANNER).await.is_err() {
        return;
    }

    let mut in_data = false;
    while let Ok(Some(line)) = lines.next_line().await {
        let reply: &[u8] = if in_data {
            if line != "." {
                continue;
            }
            in_data = false;
            received.fetch_add(1, Ordering::SeqCst);
            b"250 Ok: queued\r\n"
        } else if line.starts_with("EHLO") {
            b"250-Hello\r\n250 PIPELINING\r\n"
        } else if line.starts_with("DATA") {
            in_data = true;
            b"354 End data with <CR><LF>.<CR><LF>\r\n"
        } else if line.starts_with("QUIT") {
            let _ = write.write_all(b"221 Bye\r\n").await;
            return;
        } else {
            b"250 Ok\r\n"
        };
        if write.write_all(reply).await.is_err() {
            return;
        }
    }
}

async fn http_exchange(mut socket: TcpStream, received: Arc<AtomicUsize>) {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&request);
    let target = head.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or("/");

    let count = received.load(Ordering::SeqCst);
    let items = vec![r#"{"ID":"msg"}"#; count].join(",");
    let (status, content_type, body) = match path {
        "/api/v2/messages" | "/api/v2/search" => (
            "200 OK",
            "application/json",
            format!(r#"{{"total":{count},"count":{count},"start":0,"items":[{items}]}}"#),
        ),
        "/api/v1/messages" => ("200 OK", "application/json", format!("[{items}]")),
        "/" => (
            "200 OK",
            "text/html",
            String::from("<html><title>MailHog</title></html>"),
        ),
        _ => ("404 Not Found", "text/plain", String::from("not found")),
    };

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// A port that nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Real TCP probe that remembers which ports it was asked about.
#[derive(Default)]
pub struct CountingProbe {
    inner: TcpProbe,
    calls: AtomicUsize,
    ports: Mutex<Vec<u16>>,
}

impl CountingProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn ports(&self) -> Vec<u16> {
        let mut ports = self.ports.lock().unwrap().clone();
        ports.sort_unstable();
        ports
    }
}

#[async_trait]
impl PortProbe for CountingProbe {
    async fn check_port(&self, host: &str, port: u16, probe_timeout: Duration) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ports.lock().unwrap().push(port);
        self.inner.check_port(host, port, probe_timeout).await
    }
}
