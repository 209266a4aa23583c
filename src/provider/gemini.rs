//! Gemini API連携
//!
//! - generateContent: 画像（inline JPEG）+ プロンプト / テキストのみ
//! - models: 利用可能なモデル一覧

use super::{normalize_model_id, VisionProvider};
use crate::error::{InspectionError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// モデル一覧レスポンス
#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ModelEntry {
    #[serde(default)]
    name: String,
}

/// Gemini クライアント
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: &str, timeout_seconds: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| InspectionError::ApiCall(format!("HTTPクライアント初期化失敗: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: normalize_model_id(model),
        })
    }

    /// 利用可能なGeminiモデル（名前順・重複なし）
    pub async fn list_models(api_key: &str, timeout_seconds: u64) -> Result<Vec<String>> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| InspectionError::ApiCall(format!("HTTPクライアント初期化失敗: {}", e)))?;

        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = http
                .get(format!("{}/models", GEMINI_API_BASE))
                .query(&[("key", api_key)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| InspectionError::ApiCall(format!("モデル一覧取得失敗: {}", e)))?;
            let body = read_success_body(response).await?;
            let list: ModelList = serde_json::from_str(&body)
                .map_err(|e| InspectionError::ApiParse(format!("モデル一覧: {}", e)))?;

            names.extend(list.models.into_iter().map(|m| m.name));

            match list.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(filter_gemini_models(names))
    }

    async fn generate(&self, parts: Vec<Part>, response_mime_type: &str) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                response_mime_type: response_mime_type.to_string(),
            },
        };

        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);
        debug!("POST {}", url);

        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| InspectionError::ApiCall(e.to_string()))?;

        let body = read_success_body(response).await?;
        let text = response_text(&body)?;
        debug!("レスポンス長: {} chars", text.len());
        Ok(text)
    }
}

#[async_trait]
impl VisionProvider for GeminiClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn analyze_image(&self, prompt: &str, jpeg: &[u8]) -> Result<String> {
        let parts = vec![
            Part::Text { text: prompt.to_string() },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: "image/jpeg".to_string(),
                    data: STANDARD.encode(jpeg),
                },
            },
        ];
        self.generate(parts, "application/json").await
    }

    async fn summarize(&self, prompt: &str, context: &str) -> Result<String> {
        let parts = vec![
            Part::Text { text: prompt.to_string() },
            Part::Text { text: context.to_string() },
        ];
        self.generate(parts, "text/plain").await
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| InspectionError::ApiCall(format!("レスポンス読み込み失敗: {}", e)))?;

    if !status.is_success() {
        let preview: String = body.chars().take(500).collect();
        return Err(InspectionError::ApiCall(format!("HTTP {}: {}", status, preview)));
    }
    Ok(body)
}

/// generateContent のレスポンスから本文を取り出す（複数partは連結）
fn response_text(body: &str) -> Result<String> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| InspectionError::ApiParse(e.to_string()))?;

    let text: String = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(InspectionError::ApiParse("Empty response".into()));
    }
    Ok(text)
}

fn filter_gemini_models(names: Vec<String>) -> Vec<String> {
    let mut models: Vec<String> = names
        .into_iter()
        .filter(|name| !name.is_empty() && name.to_lowercase().contains("gemini"))
        .collect();
    models.sort();
    models.dedup();
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"comodo_ou_area\":"},{"text":"\"sala\"}"}]}}]}"#;
        assert_eq!(response_text(body).unwrap(), r#"{"comodo_ou_area":"sala"}"#);
    }

    #[test]
    fn test_response_text_empty_candidates() {
        let result = response_text(r#"{"candidates":[]}"#);
        assert!(matches!(result, Err(InspectionError::ApiParse(_))));

        let result = response_text(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert!(matches!(result, Err(InspectionError::ApiParse(_))));
    }

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "prompt".into() },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".into(),
                            data: STANDARD.encode([0xff, 0xd8]),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                response_mime_type: "application/json".into(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(json["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_filter_gemini_models() {
        let models = filter_gemini_models(vec![
            "models/gemini-1.5-pro".into(),
            "models/embedding-001".into(),
            "models/gemini-1.5-flash".into(),
            "models/gemini-1.5-pro".into(),
            String::new(),
        ]);
        assert_eq!(models, vec!["models/gemini-1.5-flash", "models/gemini-1.5-pro"]);
    }

    #[test]
    fn test_client_normalizes_model() {
        let client = GeminiClient::new("key", "gemini-1.5-flash", 30).unwrap();
        assert_eq!(client.model_id(), "models/gemini-1.5-flash");
    }
}
