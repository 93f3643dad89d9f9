use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::provider::{LlmError, LlmProvider};

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The key travels in the `x-goog-api-key` header, never in the URL.
    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the request body for the Gemini generateContent API.
    ///
    /// The response is constrained to a JSON object with `anomalyDetected`
    /// and `details` fields.
    fn build_request_body(prompt: &str) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "anomalyDetected": { "type": "BOOLEAN" },
                        "details": { "type": "STRING" },
                    },
                    "propertyOrdering": ["anomalyDetected", "details"],
                },
            },
        })
    }

    /// Pull `candidates[0].content.parts[0].text` out of a raw response body.
    ///
    /// The returned text may be empty; callers decide what that means.
    fn extract_text(raw: &str) -> Result<String, LlmError> {
        if raw.is_empty() {
            return Err(LlmError::EmptyBody);
        }

        let resp: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| LlmError::MalformedBody(e.to_string()))?;

        resp["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or(LlmError::NoCandidates)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = Self::build_request_body(prompt);

        debug!("Gemini request to model={}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::HttpError(e.without_url()))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| LlmError::HttpError(e.without_url()))?;
        debug!(status, bytes = raw.len(), "Gemini response received");

        // Error bodies carry no candidates and resolve like any other
        // response without one.
        if status != 200 {
            warn!(status, body = %raw, "Gemini returned an error status");
            return Err(LlmError::NoCandidates);
        }

        Self::extract_text(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_structure() {
        let body = GeminiProvider::build_request_body("Analyze this.");

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "Analyze this.");

        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["type"], "OBJECT");
        assert_eq!(
            config["responseSchema"]["properties"]["anomalyDetected"]["type"],
            "BOOLEAN"
        );
        assert_eq!(config["responseSchema"]["properties"]["details"]["type"], "STRING");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = GeminiProvider::new(
            "k3y".into(),
            "gemini-2.0-flash".into(),
            "http://localhost:8080/".into(),
        );
        assert_eq!(
            provider.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(!provider.endpoint().contains("k3y"));
    }

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (base_url, handle)
    }

    #[tokio::test]
    async fn test_error_status_resolves_as_no_candidates() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 400 Bad Request",
            r#"{"error":{"code":400,"message":"API key not valid."}}"#,
        )
        .await;
        let provider = GeminiProvider::new("k3y".into(), "m".into(), base_url);

        let result = provider.complete("hello").await;
        assert!(matches!(result, Err(LlmError::NoCandidates)));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/m:generateContent HTTP/1.1"));
        assert!(request.to_lowercase().contains("x-goog-api-key: k3y"));
    }

    #[tokio::test]
    async fn test_success_status_returns_candidate_text() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"anomalyDetected\":false,\"details\":\"ok\"}"}]}}]}"#,
        )
        .await;
        let provider = GeminiProvider::new("k3y".into(), "m".into(), base_url);

        let text = provider.complete("hello").await.unwrap();
        assert_eq!(text, r#"{"anomalyDetected":false,"details":"ok"}"#);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        // Nothing listens on port 1, so the request fails before any response.
        let provider = GeminiProvider::new(
            "SECRETKEY123".into(),
            "m".into(),
            "http://127.0.0.1:1".into(),
        );

        let err = provider.complete("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::HttpError(_)));
        assert!(!err.to_string().contains("SECRETKEY123"));
    }

    #[test]
    fn test_extract_text_happy_path() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"anomalyDetected\":false}"}]}}]}"#;
        assert_eq!(
            GeminiProvider::extract_text(raw).unwrap(),
            r#"{"anomalyDetected":false}"#
        );
    }

    #[test]
    fn test_extract_text_empty_body() {
        assert!(matches!(
            GeminiProvider::extract_text(""),
            Err(LlmError::EmptyBody)
        ));
    }

    #[test]
    fn test_extract_text_malformed_body() {
        assert!(matches!(
            GeminiProvider::extract_text("<html>502</html>"),
            Err(LlmError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_extract_text_no_candidates() {
        assert!(matches!(
            GeminiProvider::extract_text(r#"{"candidates":[]}"#),
            Err(LlmError::NoCandidates)
        ));
        assert!(matches!(
            GeminiProvider::extract_text(r#"{"candidates":[{"content":{"parts":[]}}]}"#),
            Err(LlmError::NoCandidates)
        ));
    }

    #[test]
    fn test_extract_text_empty_candidate_text() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#;
        assert_eq!(GeminiProvider::extract_text(raw).unwrap(), "");
    }
}
