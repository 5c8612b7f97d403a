//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use compression_proxy::config::ProxyConfig;
use compression_proxy::http::HttpServer;
use compression_proxy::lifecycle::Shutdown;
use compression_proxy::proxy::TransformPolicy;

/// Config suitable for tests: ephemeral listener, metrics off.
pub fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;
    config
}

/// Start the proxy on an ephemeral port with the production policy.
pub async fn spawn_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (addr, shutdown)
}

/// Start the proxy on an ephemeral port with an injected delivery policy.
pub async fn spawn_proxy_with_policy(
    config: ProxyConfig,
    policy: Arc<dyn TransformPolicy>,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::with_policy(config, policy).unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (addr, shutdown)
}

async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// Start a mock origin that returns a fixed response to every request.
pub async fn start_mock_origin(
    status_line: &'static str,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let headers = headers.clone();
                    let body = body.clone();
                    tokio::spawn(async move {
                        let _ = read_request_head(&mut socket).await;

                        let mut response =
                            format!("HTTP/1.1 {}\r\nConnection: close\r\n", status_line);
                        for (name, value) in &headers {
                            response.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        response.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.write_all(&body).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock origin that records every request head it receives.
pub async fn start_capturing_origin(
    body: Vec<u8>,
) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    let body = body.clone();
                    tokio::spawn(async move {
                        let head = read_request_head(&mut socket).await;
                        let _ = tx.send(head);

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nConnection: close\r\n\
                             Content-Type: text/html\r\nContent-Length: {}\r\n\r\n",
                            body.len()
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.write_all(&body).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

/// Start a mock origin that stalls before answering.
pub async fn start_slow_origin(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = read_request_head(&mut socket).await;
                        tokio::time::sleep(delay).await;
                        let _ = socket
                            .write_all(
                                b"HTTP/1.1 200 OK\r\nConnection: close\r\n\
                                  Content-Length: 4\r\n\r\nlate",
                            )
                            .await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a cleartext HTTP/2 origin serving a fixed body.
pub async fn start_h2_origin(body: Vec<u8>, content_type: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let body = body.clone();
                    tokio::spawn(async move {
                        let mut connection = h2::server::handshake(socket).await.unwrap();
                        while let Some(Ok((_request, mut respond))) = connection.accept().await {
                            let response = http::Response::builder()
                                .status(http::StatusCode::OK)
                                .header("content-type", content_type)
                                .body(())
                                .unwrap();
                            let mut stream = respond.send_response(response, false).unwrap();
                            stream
                                .send_data(bytes::Bytes::from(body.clone()), true)
                                .unwrap();
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Gzip a fixture body.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// HTTP client that talks to the proxy without following redirects.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
