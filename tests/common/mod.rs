//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use cors_relay::config::RelayConfig;
use cors_relay::{HttpServer, ReqwestClient, Shutdown};

/// A canned upstream reply.
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: String,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        201 => "201 Created",
        302 => "302 Found",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Start a programmable upstream on an ephemeral port. Each connection
/// receives the reply produced by `f` for the raw request head.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]).to_string();

                        let reply = f(head).await;
                        let mut response = format!("HTTP/1.1 {}\r\n", status_line(reply.status));
                        for (name, value) in &reply.headers {
                            response.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        response.push_str(&format!(
                            "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            reply.body.len(),
                            reply.body
                        ));

                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a fixed-reply upstream.
pub async fn start_mock_upstream(
    status: u16,
    headers: Vec<(&'static str, &'static str)>,
    body: &'static str,
) -> SocketAddr {
    start_programmable_upstream(move |_| {
        let headers = headers.clone();
        async move {
            Reply {
                status,
                headers,
                body: body.to_string(),
            }
        }
    })
    .await
}

/// A running relay bound to an ephemeral port.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

/// Start the relay with `config`, using a real reqwest upstream client.
pub async fn start_relay(config: RelayConfig) -> RunningRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let client =
        ReqwestClient::from_builder(reqwest::Client::builder().no_proxy(), &config.upstream).unwrap();
    let server = HttpServer::new(config, Arc::new(client));

    let shutdown = Shutdown::new();
    let (_, config_updates) = tokio::sync::mpsc::unbounded_channel();
    let task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    RunningRelay { addr, shutdown, task }
}

/// Relay config that allows origins ending in `you.com`.
pub fn you_com_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.origin.allowed_pattern = Some(r"^https?://.*you\.com$".to_string());
    config
}

/// Caller-side client that never goes through a system proxy.
pub fn caller() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
