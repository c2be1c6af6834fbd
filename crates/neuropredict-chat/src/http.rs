//! HTTP client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use neuropredict_core::ReadableInput;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::prompt::build_prompt;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("no API key configured (set GOOGLE_API_KEY)")]
    MissingCredential,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response contained no text")]
    EmptyResponse,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Outbound client for chat replies. Independent of the prediction path.
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

impl ChatClient {
    /// Create a client. `base_url` should have no trailing slash; one is
    /// trimmed if present.
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one message and return the generated text.
    pub async fn ask(
        &self,
        message: &str,
        context: Option<&ReadableInput>,
    ) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingCredential)?;
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        let prompt = build_prompt(message, context);
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: &prompt }],
            }],
        };

        info!(model = %self.model, context_fields = context.map_or(0, |c| c.len()), "sending chat request");
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let parsed: GenerateResponse = serde_json::from_slice(&bytes)?;
        parsed.into_text().ok_or(ChatError::EmptyResponse)
    }

    /// Like [`Self::ask`], but failures become a displayable message instead
    /// of an error.
    pub async fn reply(&self, message: &str, context: Option<&ReadableInput>) -> String {
        match self.ask(message, context).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "chat request failed");
                format!("Error connecting to AI Assistant: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a local port.
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Drain headers and a `content-length` body so the client sees a clean
    /// response rather than a reset.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let len: usize = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                return;
            }
        }
    }

    fn client(base_url: String, api_key: Option<&str>) -> ChatClient {
        ChatClient::new(ChatConfig {
            api_key: api_key.map(str::to_string),
            base_url,
            timeout: Duration::from_secs(5),
            ..ChatConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn client_trims_trailing_slash_and_blank_key() {
        let c = client("http://localhost:4000/".into(), Some("  "));
        assert_eq!(c.base_url, "http://localhost:4000");
        assert!(!c.is_configured());
    }

    #[tokio::test]
    async fn missing_key_becomes_message() {
        let c = client("http://127.0.0.1:1".into(), None);
        let reply = c.reply("hello", None).await;
        assert!(reply.starts_with("Error connecting to AI Assistant:"));
        assert!(reply.contains("GOOGLE_API_KEY"));
    }

    #[tokio::test]
    async fn network_failure_becomes_message() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap()
        };
        let c = client(format!("http://{addr}"), Some("key"));

        assert!(matches!(c.ask("hello", None).await, Err(ChatError::Http(_))));
        let reply = c.reply("hello", None).await;
        assert!(reply.starts_with("Error connecting to AI Assistant: HTTP request failed"));
    }

    #[tokio::test]
    async fn parses_generated_text() {
        let base = one_shot_server(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"MMSE is a "},{"text":"30-point test."}]}}]}"#,
        )
        .await;
        let c = client(base, Some("key"));
        let reply = c.ask("What is MMSE?", None).await.unwrap();
        assert_eq!(reply, "MMSE is a 30-point test.");
    }

    #[tokio::test]
    async fn server_error_carries_status() {
        let base = one_shot_server("503 Service Unavailable", r#"{"error":"overloaded"}"#).await;
        let c = client(base, Some("key"));
        match c.ask("hi", None).await {
            Err(ChatError::Server { status, body }) => {
                assert_eq!(status, 503);
                assert!(body.contains("overloaded"));
            }
            other => panic!("expected Server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_candidates_is_error() {
        let base = one_shot_server("200 OK", r#"{"candidates":[]}"#).await;
        let c = client(base, Some("key"));
        assert!(matches!(c.ask("hi", None).await, Err(ChatError::EmptyResponse)));
    }
}
