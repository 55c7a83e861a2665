//! Blocking OpenAI client.
//!
//! Tries the Responses endpoint first and falls back once to Chat
//! Completions. Each request is bounded by the configured timeout; there is no
//! further retry.

use std::time::Duration;

use serde_json::{Value, json};

use super::prompt::SYSTEM_MESSAGE;
use super::{AiError, AiResult};
use crate::config::AiConfig;

/// Longest slice of an error body kept in an error message.
const ERROR_BODY_LIMIT: usize = 1000;

/// The two request shapes the client knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Responses,
    ChatCompletions,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Responses => "responses",
            Self::ChatCompletions => "chat/completions",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Client for the OpenAI REST API.
pub struct OpenAiClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    model: String,
    max_output_tokens: u32,
    timeout: Duration,
}

impl OpenAiClient {
    /// `None` when the configuration carries no API key.
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        let api_key = config.api_key()?.to_string();
        let timeout = config.timeout();
        Some(Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Model answer for `prompt`: Responses first, Chat Completions on failure.
    pub fn complete(&self, prompt: &str) -> AiResult<String> {
        let responses = match self.call(Endpoint::Responses, prompt) {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };
        tracing::warn!(endpoint = %Endpoint::Responses, error = %responses, "AI endpoint failed, trying chat completions");

        match self.call(Endpoint::ChatCompletions, prompt) {
            Ok(text) => Ok(text),
            Err(chat) => {
                tracing::warn!(endpoint = %Endpoint::ChatCompletions, error = %chat, "AI endpoint failed");
                Err(AiError::AllEndpointsFailed {
                    responses: responses.to_string(),
                    chat: chat.to_string(),
                })
            }
        }
    }

    fn call(&self, endpoint: Endpoint, prompt: &str) -> AiResult<String> {
        let body = match endpoint {
            Endpoint::Responses => self.responses_body(prompt),
            Endpoint::ChatCompletions => self.chat_body(prompt),
        };
        let json = self.post(endpoint, &body)?;
        Ok(match endpoint {
            Endpoint::Responses => responses_text(&json),
            Endpoint::ChatCompletions => chat_text(&json),
        })
    }

    /// Request body for the Responses endpoint.
    pub fn responses_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "input": prompt,
            "temperature": 0.0,
            "max_output_tokens": self.max_output_tokens,
            "modalities": ["text"],
            "text": { "format": "json_object" },
        })
    }

    /// Request body for the Chat Completions endpoint.
    pub fn chat_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": 0.0,
            "max_tokens": self.max_output_tokens,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_MESSAGE },
                { "role": "user", "content": prompt },
            ],
        })
    }

    fn post(&self, endpoint: Endpoint, body: &Value) -> AiResult<Value> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        let body_str = serde_json::to_string(body).map_err(|e| AiError::Serialize {
            message: e.to_string(),
        })?;

        let mut request = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json");
        if endpoint == Endpoint::Responses {
            request = request.set("OpenAI-Beta", "assistants=v2");
        }

        let resp = request.send_string(&body_str).map_err(|e| match e {
            ureq::Error::Status(code, resp) => {
                let detail: String = resp
                    .into_string()
                    .unwrap_or_default()
                    .chars()
                    .take(ERROR_BODY_LIMIT)
                    .collect();
                AiError::Request {
                    endpoint: endpoint.to_string(),
                    message: format!("status {code}: {detail}"),
                }
            }
            ureq::Error::Transport(t) => AiError::Request {
                endpoint: endpoint.to_string(),
                message: t.to_string(),
            },
        })?;

        let resp_str = resp.into_string().map_err(|e| AiError::Request {
            endpoint: endpoint.to_string(),
            message: format!("failed to read response: {e}"),
        })?;

        serde_json::from_str(&resp_str).map_err(|e| AiError::Request {
            endpoint: endpoint.to_string(),
            message: format!("response is not JSON: {e}"),
        })
    }
}

/// Text of a Responses answer: `output_text`, else the first content part,
/// else `{}`.
pub fn responses_text(json: &Value) -> String {
    json["output_text"]
        .as_str()
        .filter(|s| !s.is_empty())
        .or_else(|| json["output"][0]["content"][0]["text"].as_str())
        .unwrap_or("{}")
        .to_string()
}

/// Text of a Chat Completions answer, or `{}`.
pub fn chat_text(json: &Value) -> String {
    json["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("{}")
        .to_string()
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// One-shot HTTP responder on a loopback port.
#[cfg(test)]
pub(crate) mod loopback {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    /// Answer one connection per `(status, body)` pair, in order. Returns the
    /// base URL and a channel yielding each raw request.
    pub fn serve(replies: Vec<(u16, String)>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in replies {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let request = read_request(&mut stream);
                let _ = tx.send(request);
                let reply = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(reply.as_bytes());
            }
        });
        (format!("http://{addr}/v1"), rx)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> OpenAiClient {
        let config = AiConfig {
            api_key: Some("sk-test".into()),
            base_url: base_url.into(),
            timeout_secs: 5,
            ..Default::default()
        };
        OpenAiClient::from_config(&config).unwrap()
    }

    #[test]
    fn no_key_no_client() {
        assert!(OpenAiClient::from_config(&AiConfig::default()).is_none());
    }

    #[test]
    fn responses_endpoint_answers() {
        let body = json!({ "output_text": "{\"demandes\": []}" }).to_string();
        let (url, requests) = loopback::serve(vec![(200, body)]);
        let text = client(&url).complete("prompt").unwrap();
        assert_eq!(text, "{\"demandes\": []}");

        let request = requests.recv().unwrap();
        assert!(request.starts_with("POST /v1/responses"));
        let lower = request.to_lowercase();
        assert!(lower.contains("authorization: bearer sk-test"));
        assert!(lower.contains("openai-beta: assistants=v2"));
        assert!(request.contains("\"max_output_tokens\":800"));
    }

    #[test]
    fn falls_back_to_chat_completions() {
        let chat = json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"demandes\": [{}]}" } }]
        })
        .to_string();
        let (url, requests) = loopback::serve(vec![
            (400, "{\"error\": \"unsupported\"}".into()),
            (200, chat),
        ]);
        let text = client(&url).complete("prompt").unwrap();
        assert_eq!(text, "{\"demandes\": [{}]}");

        assert!(requests.recv().unwrap().starts_with("POST /v1/responses"));
        let second = requests.recv().unwrap();
        assert!(second.starts_with("POST /v1/chat/completions"));
        assert!(!second.to_lowercase().contains("openai-beta"));
        assert!(second.contains(SYSTEM_MESSAGE));
    }

    #[test]
    fn both_endpoints_failing_is_an_error() {
        let (url, _requests) = loopback::serve(vec![
            (500, "{}".into()),
            (503, "overloaded".into()),
        ]);
        match client(&url).complete("prompt") {
            Err(AiError::AllEndpointsFailed { responses, chat }) => {
                assert!(responses.contains("500"));
                assert!(chat.contains("overloaded"));
            }
            other => panic!("expected AllEndpointsFailed, got {other:?}"),
        }
    }

    #[test]
    fn unreachable_server_fails_both_endpoints() {
        let result = client("http://127.0.0.1:1").complete("prompt");
        assert!(matches!(result, Err(AiError::AllEndpointsFailed { .. })));
    }

    #[test]
    fn answer_text_extraction() {
        assert_eq!(
            responses_text(&json!({ "output": [{ "content": [{ "text": "{\"a\":1}" }] }] })),
            "{\"a\":1}"
        );
        assert_eq!(responses_text(&json!({})), "{}");
        assert_eq!(chat_text(&json!({ "choices": [] })), "{}");
    }

    #[test]
    fn debug_hides_the_key() {
        let rendered = format!("{:?}", client("http://127.0.0.1:1"));
        assert!(!rendered.contains("sk-test"));
    }
}
