use crate::embeddings::normalize;
use crate::traits::{ChatModel, Embedder};
use crate::ModelError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const BACKEND: &str = "gemini";

/// Shared HTTP plumbing for the Generative Language REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn method_url(&self, model: &str, method: &str) -> Result<Url, ModelError> {
        let model = model.trim_start_matches("models/");
        Ok(self
            .base_url
            .join(&format!("v1beta/models/{model}:{method}"))?)
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<R, ModelError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.trim())
            .json(body)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ModelError::BackendResponse {
                backend: BACKEND.to_string(),
                details: format!("{status}: {text}"),
            });
        }

        Ok(response.json()?)
    }
}

#[derive(Debug, Clone)]
pub struct GeminiChatModel {
    client: GeminiClient,
    model: String,
}

impl GeminiChatModel {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatModel for GeminiChatModel {
    fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = self.client.method_url(&self.model, "generateContent")?;
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
        };
        let response: GenerateResponse = self.client.post(url, &body)?;
        answer_from_response(response)
    }
}

#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: GeminiClient,
    model: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    pub fn new(client: GeminiClient, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions,
        }
    }
}

impl Embedder for GeminiEmbedder {
    fn name(&self) -> String {
        format!("gemini/{}-{}", self.model, self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let url = self.client.method_url(&self.model, "embedContent")?;
        let model = format!("models/{}", self.model.trim_start_matches("models/"));
        let body = EmbedRequest {
            model: &model,
            content: RequestContent {
                role: None,
                parts: vec![RequestPart { text }],
            },
            output_dimensionality: self.dimensions,
        };
        let response: EmbedResponse = self.client.post(url, &body)?;
        let mut values = response.embedding.values;
        if values.is_empty() {
            return Err(ModelError::EmptyResponse {
                backend: BACKEND.to_string(),
            });
        }
        // truncated outputs are not unit length
        normalize(&mut values);
        Ok(values)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: RequestContent<'a>,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

fn answer_from_response(response: GenerateResponse) -> Result<String, ModelError> {
    let answer = response
        .candidates
        .into_iter()
        .find_map(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if answer.is_empty() {
        return Err(ModelError::EmptyResponse {
            backend: BACKEND.to_string(),
        });
    }
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GeminiClient {
        GeminiClient::new(base, "test-key", Duration::from_secs(5)).expect("valid base url")
    }

    #[test]
    fn method_urls_keep_base_path() -> Result<(), ModelError> {
        let plain = client("https://generativelanguage.googleapis.com");
        assert_eq!(
            plain.method_url("gemini-2.0-flash", "generateContent")?.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );

        let proxied = client("http://localhost:8080/proxy");
        assert_eq!(
            proxied.method_url("models/text-embedding-004", "embedContent")?.as_str(),
            "http://localhost:8080/proxy/v1beta/models/text-embedding-004:embedContent"
        );
        Ok(())
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = GeminiClient::new("not a url", "key", Duration::from_secs(1));
        assert!(matches!(result, Err(ModelError::Url(_))));
    }

    #[test]
    fn answer_joins_text_parts_of_first_candidate() -> Result<(), Box<dyn std::error::Error>> {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Wear "},{"text":"goggles."}],"role":"model"}}]}"#,
        )?;
        assert_eq!(answer_from_response(response)?, "Wear goggles.");
        Ok(())
    }

    #[test]
    fn blocked_prompt_without_candidates_is_empty_response(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)?;
        assert!(matches!(
            answer_from_response(response),
            Err(ModelError::EmptyResponse { .. })
        ));
        Ok(())
    }

    #[test]
    fn embed_request_uses_camel_case_fields() -> Result<(), Box<dyn std::error::Error>> {
        let body = EmbedRequest {
            model: "models/text-embedding-004",
            content: RequestContent {
                role: None,
                parts: vec![RequestPart { text: "hello" }],
            },
            output_dimensionality: 256,
        };
        let value = serde_json::to_value(&body)?;
        assert_eq!(value["outputDimensionality"], 256);
        assert_eq!(value["content"]["parts"][0]["text"], "hello");
        assert!(value["content"].get("role").is_none());
        Ok(())
    }
}
