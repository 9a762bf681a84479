use std::env;

use log::{error, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::config::DEFAULT_KEEPALIVE_PORT;

const OK_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK";

/// Keep-alive HTTP responder. Platform supervisors ping this to decide the
/// process is still alive; it runs on its own task and never touches the
/// gateway loop. Any request gets a 200, the body is not inspected beyond
/// draining a first read.
pub async fn run(port: u16) {
    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("keep-alive listener failed to bind port {port}: {e}");
            return;
        }
    };
    info!("keep-alive endpoint listening on port {port}");
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                tokio::spawn(answer(stream));
            }
            Err(e) => warn!("keep-alive accept failed: {e}"),
        }
    }
}

async fn answer(mut stream: TcpStream) {
    let mut buf = [0u8; 1024];
    let _ = stream.read(&mut buf).await;
    if let Err(e) = stream.write_all(OK_RESPONSE).await {
        warn!("keep-alive response failed: {e}");
    }
    let _ = stream.shutdown().await;
}

fn port_from_env() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_KEEPALIVE_PORT)
}

/// Container health probe: connects to the local keep-alive endpoint and
/// exits 0 on a 200 response, 1 otherwise.
pub async fn healthcheck() -> i32 {
    let port = port_from_env();
    let mut stream = match TcpStream::connect(("127.0.0.1", port)).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("healthcheck connect failed: {e}");
            return 1;
        }
    };
    if let Err(e) = stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
    {
        error!("healthcheck request failed: {e}");
        return 1;
    }
    let mut response = Vec::new();
    if let Err(e) = stream.read_to_end(&mut response).await {
        error!("healthcheck read failed: {e}");
        return 1;
    }
    if response.starts_with(b"HTTP/1.1 200") {
        0
    } else {
        error!("healthcheck got a non-200 response");
        1
    }
}
