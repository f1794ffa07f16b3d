use anyhow::{Result, bail};
use reqwest::{Client, Response};
use std::time::Duration;

/// Maximum accepted size of a remote message resource (2 MB).
pub const MAX_RESOURCE_BYTES: usize = 2 * 1024 * 1024;

/// Build a `reqwest::Client` with the given overall timeout and a 5 s connect timeout.
///
/// Falls back to the default client if the builder fails.
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(timeout)
        .user_agent(concat!("daily-start/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Read a response body, failing if it exceeds `max_bytes`.
///
/// Message resources are parsed as JSON, so a truncated body is useless;
/// oversized bodies are rejected instead of cut.
pub async fn capped_body(resp: Response, max_bytes: usize) -> Result<Vec<u8>> {
    if let Some(cl) = resp.content_length()
        && cl as usize > max_bytes
    {
        bail!(
            "response body too large: Content-Length {} exceeds limit {}",
            cl,
            max_bytes
        );
    }

    let mut buf = Vec::new();
    let mut stream = resp;
    while let Some(chunk) = stream.chunk().await? {
        if buf.len() + chunk.len() > max_bytes {
            bail!("response body too large: exceeds limit {}", max_bytes);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}
