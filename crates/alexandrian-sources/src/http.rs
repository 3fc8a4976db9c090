//! Shared HTTP plumbing for the adapters.

use alexandrian_core::{AdapterFailure, SourceKind, SourcesConfig};
use std::time::Duration;

/// One client for every adapter: per-request timeout and a descriptive user agent.
pub fn build_client(config: &SourcesConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .build()
}

pub(crate) fn classify(adapter: SourceKind, err: reqwest::Error, timeout: Duration) -> AdapterFailure {
    if err.is_timeout() {
        AdapterFailure::Timeout {
            adapter,
            secs: timeout.as_secs(),
        }
    } else if err.is_decode() {
        AdapterFailure::Parse {
            adapter,
            reason: err.to_string(),
        }
    } else {
        AdapterFailure::Transport {
            adapter,
            reason: err.to_string(),
        }
    }
}

/// Body of a successful response and the final URL after redirects.
pub(crate) struct Fetched {
    pub url: String,
    pub body: String,
}

pub(crate) async fn get_text(
    adapter: SourceKind,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<Fetched, AdapterFailure> {
    let response = request
        .send()
        .await
        .map_err(|e| classify(adapter, e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AdapterFailure::Status {
            adapter,
            status: status.as_u16(),
        });
    }

    let url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|e| classify(adapter, e, timeout))?;
    Ok(Fetched { url, body })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal one-shot HTTP server for adapter tests.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `body` with `status` to every connection; returns the base URL.
    pub async fn serve(status: u16, content_type: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let body = body.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut request = Vec::new();
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let head = format!(
                        "HTTP/1.1 {status} X\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(body.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }
}
