//! Language-model provider abstraction + the Gemini `generateContent` client.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::GenerateError;
use crate::config::GeminiConfig;

/// Single completion request: system directive + user prompt.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub max_output_tokens: u32,
}

/// Low-level provider: one remote call per `complete`, no retries.
pub trait LanguageModel: Send + Sync {
    fn complete<'a>(
        &'a self,
        req: ModelRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerateError>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(cfg: &GeminiConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: cfg.model.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Req<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<PartOut<'a>>,
}

#[derive(Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
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
    parts: Vec<PartIn>,
}

#[derive(Deserialize)]
struct PartIn {
    text: Option<String>,
}

/// Join all text parts of the first candidate (responses may be multi-part).
fn extract_text(resp: Resp) -> Result<String, GenerateError> {
    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or(GenerateError::EmptyResponse("no candidates"))?;
    let parts = candidate
        .content
        .map(|c| c.parts)
        .filter(|p| !p.is_empty())
        .ok_or(GenerateError::EmptyResponse("no parts"))?;
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        return Err(GenerateError::EmptyResponse("blank text"));
    }
    Ok(text)
}

impl LanguageModel for GeminiProvider {
    fn complete<'a>(
        &'a self,
        req: ModelRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerateError>> + Send + 'a>> {
        Box::pin(async move {
            let api_key = self.api_key.as_deref().ok_or(GenerateError::MissingApiKey)?;

            let body = Req {
                system_instruction: Content {
                    role: None,
                    parts: vec![PartOut { text: req.system }],
                },
                contents: vec![Content {
                    role: Some("user"),
                    parts: vec![PartOut { text: req.prompt }],
                }],
                generation_config: GenerationConfig {
                    max_output_tokens: req.max_output_tokens,
                },
            };

            tracing::info!(model = %self.model, "calling Gemini API");
            let resp = self
                .http
                .post(self.endpoint())
                .header("x-goog-api-key", api_key)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(GenerateError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: Resp = resp.json().await?;
            extract_text(parsed)
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

/// Returns a fixed completion; used in tests and offline runs.
#[derive(Clone)]
pub struct MockModel {
    pub fixed: String,
}

impl LanguageModel for MockModel {
    fn complete<'a>(
        &'a self,
        _req: ModelRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerateError>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move {
            if out.trim().is_empty() {
                Err(GenerateError::EmptyResponse("blank text"))
            } else {
                Ok(out)
            }
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<String, GenerateError> {
        extract_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn multi_part_text_is_joined() {
        let out = parse(r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#);
        assert_eq!(out.unwrap(), "Hello world");
    }

    #[test]
    fn missing_candidates_or_parts_is_empty_response() {
        assert!(matches!(
            parse(r#"{}"#),
            Err(GenerateError::EmptyResponse("no candidates"))
        ));
        assert!(matches!(
            parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
            Err(GenerateError::EmptyResponse("no parts"))
        ));
        assert!(matches!(
            parse(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#),
            Err(GenerateError::EmptyResponse("blank text"))
        ));
    }

    #[test]
    fn request_body_uses_camel_case() {
        let body = Req {
            system_instruction: Content {
                role: None,
                parts: vec![PartOut { text: "sys" }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![PartOut { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 1024,
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(v["systemInstruction"].get("role").is_none());
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 1024);
    }
}
