//! Local HTTP fixtures for fetch tests
//!
//! The guard refuses loopback unless told otherwise, so fixtures pair a
//! one-shot-per-connection HTTP/1.1 server with a guard that resolves
//! `fixture.test` to 127.0.0.1 and exempts the loopback class.

use crate::config::ExtractorConfig;
use crate::fetch::GuardedFetcher;
use readaloud_guard::{AddressClass, GuardConfig, StaticResolver, UrlGuard};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Hostname the fixture guard resolves to the local server
pub(crate) const FIXTURE_HOST: &str = "fixture.test";

/// Serve `handler` on an ephemeral loopback port. The handler gets the
/// request path and returns the raw response; `None` holds the connection
/// open without answering.
pub(crate) async fn serve<F>(handler: F) -> SocketAddr
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let handler = handler.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let mut read = 0;
                loop {
                    let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                    if n == 0 {
                        return;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                    if read == buf.len() {
                        return;
                    }
                }

                let head = String::from_utf8_lossy(&buf[..read]).to_string();
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                match handler(&path) {
                    Some(response) => {
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                    None => tokio::time::sleep(Duration::from_secs(120)).await,
                }
            });
        }
    });

    addr
}

/// A complete response with a Content-Length header
pub(crate) fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {}\r\nConnection: close\r\nContent-Length: {}\r\n", status, body.len());
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str("\r\n");
    out.push_str(body);
    out
}

/// A response without Content-Length; the body ends when the connection closes
pub(crate) fn unsized_response(status: &str, body: &str) -> String {
    format!("HTTP/1.1 {}\r\nConnection: close\r\nContent-Type: text/html\r\n\r\n{}", status, body)
}

/// Guard that lets `fixture.test` reach the loopback server and blocks
/// everything else as usual
pub(crate) fn fixture_guard() -> UrlGuard {
    let resolver = StaticResolver::new()
        .with_host(FIXTURE_HOST, &["127.0.0.1".parse().unwrap()])
        .with_host("intranet.test", &["10.1.1.1".parse().unwrap()]);
    let config = GuardConfig::default().allow_address_class(AddressClass::Loopback);
    UrlGuard::with_resolver(config, Arc::new(resolver))
}

/// Fetcher wired to [`fixture_guard`]
pub(crate) fn fixture_fetcher(config: ExtractorConfig) -> GuardedFetcher {
    GuardedFetcher::new(config, fixture_guard())
}

/// Base URL of a fixture server
pub(crate) fn base_url(addr: SocketAddr) -> String {
    format!("http://{}:{}", FIXTURE_HOST, addr.port())
}
