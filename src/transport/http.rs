use super::traits::{PullTransport, PushStream, PushTransport, TransportError};
use super::types::{PullResponse, PushPayload};
use crate::config::types::ServerConfig;
use crate::event::Cursor;
use async_trait::async_trait;
use futures::io::AsyncBufReadExt;
use futures::{future, Stream, StreamExt, TryStreamExt};
use std::fmt::Display;
use std::io;

pub type Result<T> = std::result::Result<T, TransportError>;

/// HTTP client for a run event server.
///
/// Serves as both transports: `fetch` polls a JSON page, `subscribe` opens
/// a long-lived newline-delimited JSON stream.
#[derive(Debug, Clone)]
pub struct HttpRunClient {
    base_url: String,
    client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl HttpRunClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        // Push sessions stay open indefinitely, only the connect is bounded
        let stream_client = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
            stream_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether the server is reachable at all
    pub async fn probe(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Health probe failed");
                false
            }
        }
    }

    /// Get the page of events after `after`.
    /// If after is None, returns events from the beginning of the run.
    pub async fn get_events(&self, run_id: &str, after: Option<&Cursor>) -> Result<PullResponse> {
        let url = format!("{}/runs/{}/events", self.base_url, run_id);
        let mut request = self.client.get(&url);
        if let Some(cursor) = after {
            request = request.query(&[("after", cursor.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let page = response.json().await?;
        Ok(page)
    }

    /// Open the event stream for a run, resuming after `cursor`
    pub async fn open_stream(&self, run_id: &str, cursor: Option<&Cursor>) -> Result<PushStream> {
        let url = format!("{}/runs/{}/events/stream", self.base_url, run_id);
        let mut request = self.stream_client.get(&url);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        tracing::debug!(run_id = %run_id, cursor = ?cursor, "Opened push stream");
        Ok(decode_ndjson(response.bytes_stream()))
    }
}

#[async_trait]
impl PullTransport for HttpRunClient {
    async fn fetch(&self, run_id: &str, after: Option<&Cursor>) -> Result<PullResponse> {
        self.get_events(run_id, after).await
    }
}

#[async_trait]
impl PushTransport for HttpRunClient {
    async fn subscribe(&self, run_id: &str, cursor: Option<&Cursor>) -> Result<PushStream> {
        self.open_stream(run_id, cursor).await
    }
}

/// Turn a byte stream of newline-delimited JSON into push payloads.
///
/// Malformed lines are skipped. A read error ends the stream, which the
/// push adapter treats as a session reset.
pub fn decode_ndjson<S, B, E>(chunks: S) -> PushStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let lines = Box::pin(chunks)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
        .into_async_read()
        .lines();

    lines
        .scan((), |_, line| {
            future::ready(match line {
                Ok(line) => Some(line),
                Err(e) => {
                    tracing::warn!(error = %e, "Push stream read failed");
                    None
                }
            })
        })
        .filter_map(|line| future::ready(decode_line(&line)))
        .boxed()
}

fn decode_line(line: &str) -> Option<PushPayload> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str(line) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::warn!(error = %e, line = %line, "Skipping malformed push payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn chunks(
        parts: Vec<&'static str>,
    ) -> impl Stream<Item = std::result::Result<Vec<u8>, String>> {
        futures::stream::iter(parts.into_iter().map(|p| Ok(p.as_bytes().to_vec())))
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let config = ServerConfig {
            url: "http://localhost:3000/".to_string(),
            timeout: Duration::from_secs(30),
        };

        let client = HttpRunClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_decode_lines_split_across_chunks() {
        let stream = decode_ndjson(chunks(vec![
            r#"{"type":"Success","messages":[],"has_more_past_"#,
            "events\":true,\"cursor\":\"1\"}\n{\"type\":\"Failure\",",
            r#""message":"gone"}"#,
            "\n",
        ]));

        let payloads: Vec<PushPayload> = stream.collect().await;
        assert_eq!(payloads.len(), 2);
        assert!(matches!(&payloads[0], PushPayload::Success(b) if b.has_more_past_events));
        assert!(matches!(&payloads[1], PushPayload::Failure(f) if f.message == "gone"));
    }

    #[tokio::test]
    async fn test_decode_skips_malformed_and_blank_lines() {
        let stream = decode_ndjson(chunks(vec![
            "not json\n\n",
            "{\"type\":\"Success\",\"has_more_past_events\":false,\"cursor\":\"2\"}",
        ]));

        // The last line has no terminator and is decoded at end of stream
        let payloads: Vec<PushPayload> = stream.collect().await;
        assert_eq!(payloads.len(), 1);
    }

    #[tokio::test]
    async fn test_read_error_ends_stream() {
        let parts: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(b"{\"type\":\"Failure\",\"message\":\"a\"}\n".to_vec()),
            Err("connection reset".to_string()),
            Ok(b"{\"type\":\"Failure\",\"message\":\"b\"}\n".to_vec()),
        ];

        let payloads: Vec<PushPayload> =
            decode_ndjson(futures::stream::iter(parts)).collect().await;
        assert_eq!(payloads.len(), 1);
    }
}
