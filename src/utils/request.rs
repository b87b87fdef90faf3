use crate::bad_request_err;
use crate::error::TimeshiftError;
use axum::http::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE, USER_AGENT};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{debug, error, info};
use std::time::Duration;

/// Connect and idle-read timeout for the single upstream attempt. Bounds
/// how long the provider may stall between bytes, never the total stream
/// duration. No retries.
const PROXY_TIMEOUT: Duration = Duration::from_secs(10);
/// Upstream bodies are re-sliced into chunks of at most this size so long
/// streams never buffer fully in memory.
const STREAM_CHUNK_SIZE: usize = 8192;
/// How much of an upstream error body is logged for diagnostics.
const BODY_PREVIEW_LIMIT: usize = 200;

pub fn create_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .http1_only()
        .connect_timeout(PROXY_TIMEOUT)
        .read_timeout(PROXY_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Catchup URLs carry provider credentials in the query string, log only the
/// part before it.
pub fn sanitized_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

fn rechunk<S>(upstream: S) -> impl Stream<Item = Result<Bytes, reqwest::Error>>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>>,
{
    upstream.flat_map(|item| match item {
        Ok(mut bytes) => {
            let mut chunks = Vec::with_capacity(bytes.len() / STREAM_CHUNK_SIZE + 1);
            while bytes.len() > STREAM_CHUNK_SIZE {
                chunks.push(Ok(bytes.split_to(STREAM_CHUNK_SIZE)));
            }
            if !bytes.is_empty() {
                chunks.push(Ok(bytes));
            }
            futures::stream::iter(chunks)
        }
        Err(err) => futures::stream::iter(vec![Err(err)]),
    })
}

/// Proxies the provider catchup stream back to the client.
///
/// Forwards the inbound `Range` header verbatim so seeking keeps working,
/// accepts only 200/206 from upstream and relays the headers the client
/// needs for partial delivery. Timeout and connection errors surface as
/// `BadRequest`, never as unhandled faults.
pub async fn proxy_catchup_stream(
    client: &reqwest::Client,
    url: &str,
    user_agent: &str,
    range: Option<&HeaderValue>,
) -> Result<Response, TimeshiftError> {
    let url_base = sanitized_url(url).to_string();
    info!("Proxying to provider: {url_base}");

    let mut request = client.get(url).header(USER_AGENT, user_agent);
    if let Some(range_header) = range {
        debug!("Forwarding Range header: {range_header:?}");
        request = request.header(RANGE, range_header.clone());
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(err) if err.is_timeout() => {
            error!("Provider timeout after {}s for {url_base}", PROXY_TIMEOUT.as_secs());
            return Err(bad_request_err!("Provider timeout"));
        }
        Err(err) => {
            error!("Provider connection error for {url_base}: {err}");
            return Err(bad_request_err!("Provider connection error"));
        }
    };

    let status = upstream.status();
    if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
        let content_type = upstream
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let body_preview = match upstream.text().await {
            Ok(text) if !text.is_empty() => text.chars().take(BODY_PREVIEW_LIMIT).collect::<String>(),
            Ok(_) => "empty".to_string(),
            Err(_) => "unreadable".to_string(),
        };
        error!("Provider error: status={}, content-type={content_type}, body={body_preview}", status.as_u16());
        return Err(bad_request_err!("Provider error: {}", status.as_u16()));
    }

    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("video/mp2t"));
    info!("Streaming started (status={}, content-type={content_type:?})", status.as_u16());

    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type);
    // relayed so client-side seeking keeps working
    for header in [CONTENT_LENGTH, CONTENT_RANGE, ACCEPT_RANGES] {
        if let Some(value) = upstream.headers().get(&header) {
            builder = builder.header(header, value.clone());
        }
    }

    let body = axum::body::Body::from_stream(rechunk(upstream.bytes_stream()));
    builder
        .body(body)
        .map_err(|err| bad_request_err!("Failed to build streaming response: {err}"))
}
