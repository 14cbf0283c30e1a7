//! HTTP client for the remote chat endpoint.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: String,
}

/// Client for the vendor assistant backend.
///
/// One `POST /chat` per user turn; no streaming, no authentication. Every
/// failure mode (transport error, non-2xx status, malformed body) is
/// reported uniformly as an error for the caller to collapse into the
/// fallback reply.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    /// Send one user turn and return the assistant's markdown reply.
    pub async fn send(&self, message: &str) -> Result<String> {
        let url = format!("{}/chat", self.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await
            .context("Failed to reach the chat endpoint")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Chat endpoint returned status {}", status));
        }

        let body = response
            .text()
            .await
            .context("Failed to read the chat response body")?;
        tracing::debug!(%status, bytes = body.len(), "chat reply received");

        let reply: ChatReply =
            serde_json::from_str(&body).context("Chat endpoint returned a malformed body")?;
        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a local port.
    async fn one_shot_server(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            // Drain the request before replying so the client never sees a
            // reset while still writing.
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if let Some(headers_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&request[..headers_end]);
                    let content_length = headers
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= headers_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len(),
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        });

        format!("http://{addr}")
    }

    fn client_for(endpoint: &str) -> ChatClient {
        ChatClient::new(endpoint, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn returns_the_response_field_verbatim() {
        let body = serde_json::json!({ "response": "Your balance is **$100**." }).to_string();
        let endpoint = one_shot_server("HTTP/1.1 200 OK", body).await;

        let reply = client_for(&endpoint).send("What is my balance?").await.unwrap();
        assert_eq!(reply, "Your balance is **$100**.");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let endpoint = one_shot_server("HTTP/1.1 500 Internal Server Error", String::new()).await;
        assert!(client_for(&endpoint).send("hi").await.is_err());
    }

    #[tokio::test]
    async fn body_without_a_response_field_is_an_error() {
        let body = serde_json::json!({ "answer": "nope" }).to_string();
        let endpoint = one_shot_server("HTTP/1.1 200 OK", body).await;
        assert!(client_for(&endpoint).send("hi").await.is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        // Bind and immediately drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(client_for(&format!("http://{addr}")).send("hi").await.is_err());
    }
}
