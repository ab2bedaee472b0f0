//! Google Gemini API provider implementation.
//!
//! One client serves both collaborators: image editing through the image
//! model and question authoring through the text model.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use examprep_core::model::{Category, Question};
use examprep_core::traits::{
    edit_prompt, extract_json_from_markdown, generation_prompt, EditedImage, GeneratedQuestion,
    ImageEditRequest, ImageEditor, QuestionGenerator,
};

use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_QUESTION_MODEL: &str = "gemini-3-flash-preview";

/// Gemini API provider.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    image_model: String,
    question_model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            question_model: DEFAULT_QUESTION_MODEL.to_string(),
            client,
        })
    }

    /// Override the models used for image edits and question generation.
    pub fn with_models(mut self, image_model: &str, question_model: &str) -> Self {
        self.image_model = image_model.to_string();
        self.question_model = question_model.to_string();
        self
    }

    /// POST a `generateContent` request and map HTTP failures to [`ProviderError`].
    async fn generate_content(
        &self,
        model: &str,
        body: &GeminiRequest,
    ) -> anyhow::Result<GeminiResponse> {
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(error_message(body)).into());
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(model.to_string()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: error_message(body),
            }
            .into());
        }

        let api_response: GeminiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;
        Ok(api_response)
    }
}

/// Pull `error.message` out of a Gemini error body, falling back to the raw body.
fn error_message(body: String) -> String {
    serde_json::from_str::<GeminiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn user(parts: Vec<GeminiPart>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl GeminiPart {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            ..Default::default()
        }
    }

    fn inline(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: STANDARD.encode(bytes),
            }),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    /// Parts of the first candidate.
    fn into_parts(self) -> Vec<GeminiPart> {
        self.candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

fn question_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "text": { "type": "STRING" },
                "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                "correctAnswer": { "type": "INTEGER" },
                "explanation": { "type": "STRING" }
            },
            "required": ["id", "text", "options", "correctAnswer", "explanation"]
        }
    })
}

#[async_trait]
impl ImageEditor for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %self.image_model, bytes = request.image.len()))]
    async fn edit(&self, request: &ImageEditRequest) -> anyhow::Result<EditedImage> {
        let body = GeminiRequest {
            contents: vec![GeminiContent::user(vec![
                GeminiPart::inline(&request.mime_type, &request.image),
                GeminiPart::text(edit_prompt(&request.instruction)),
            ])],
            generation_config: None,
        };

        let response = self.generate_content(&self.image_model, &body).await?;
        let inline = response
            .into_parts()
            .into_iter()
            .find_map(|p| p.inline_data)
            .ok_or(ProviderError::MissingImage)?;

        let image = STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("invalid image data: {e}"),
            })?;

        Ok(EditedImage {
            image,
            mime_type: inline.mime_type,
        })
    }
}

#[async_trait]
impl QuestionGenerator for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self), fields(model = %self.question_model))]
    async fn generate(&self, category: Category, count: usize) -> anyhow::Result<Vec<Question>> {
        let body = GeminiRequest {
            contents: vec![GeminiContent::user(vec![GeminiPart::text(
                generation_prompt(category, count),
            )])],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: question_schema(),
            }),
        };

        let response = self.generate_content(&self.question_model, &body).await?;
        let text: String = response
            .into_parts()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        let generated: Vec<GeneratedQuestion> =
            serde_json::from_str(&extract_json_from_markdown(&text)).map_err(|e| {
                ProviderError::ApiError {
                    status: 0,
                    message: format!("failed to parse generated questions: {e}"),
                }
            })?;

        let mut seen = HashSet::new();
        let questions = generated
            .into_iter()
            .map(|g| g.into_question(category))
            .filter(|q| match q.validate() {
                Ok(()) => seen.insert(q.id.clone()),
                Err(e) => {
                    tracing::warn!("dropping generated question: {e}");
                    false
                }
            })
            .take(count)
            .collect();

        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const IMAGE_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";
    const TEXT_PATH: &str = "/v1beta/models/gemini-3-flash-preview:generateContent";

    fn edit_request(instruction: &str) -> ImageEditRequest {
        ImageEditRequest {
            image: vec![0x89, b'P', b'N', b'G'],
            mime_type: "image/png".into(),
            instruction: instruction.into(),
        }
    }

    #[tokio::test]
    async fn successful_edit() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Here is your image."},
                        {"inlineData": {"mimeType": "image/png", "data": STANDARD.encode(b"edited")}}
                    ]
                }
            }]
        });

        Mock::given(method("POST"))
            .and(path(IMAGE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inlineData": {"mimeType": "image/png", "data": STANDARD.encode([0x89, b'P', b'N', b'G'])}},
                        {"text": "Edit this image based on the following instruction: sepia. Return only the edited image."}
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key", Some(server.uri())).unwrap();
        let edited = provider.edit(&edit_request("sepia")).await.unwrap();
        assert_eq!(edited.image, b"edited");
        assert_eq!(edited.mime_type, "image/png");
    }

    #[tokio::test]
    async fn text_only_reply_is_missing_image() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(IMAGE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "I cannot do that."}]}}]
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri())).unwrap();
        let err = provider.edit(&edit_request("sepia")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::MissingImage)
        ));
    }

    #[tokio::test]
    async fn authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(IMAGE_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("bad-key", Some(server.uri())).unwrap();
        let err = provider.edit(&edit_request("sepia")).await.unwrap_err();
        assert!(err.to_string().contains("authentication failed: API key not valid"));
    }

    #[tokio::test]
    async fn rate_limiting() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(IMAGE_PATH))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri())).unwrap();
        let err = provider.edit(&edit_request("sepia")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::RateLimited {
                retry_after_ms: 3000
            })
        ));
    }

    #[tokio::test]
    async fn custom_models() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/other-image:generateContent"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri()))
            .unwrap()
            .with_models("other-image", "other-text");
        let err = provider.edit(&edit_request("sepia")).await.unwrap_err();
        assert!(err.to_string().contains("model not found: other-image"));
    }

    #[tokio::test]
    async fn generates_questions_from_fenced_json() {
        let server = MockServer::start().await;

        let questions = serde_json::json!([
            {"id": "g1", "text": "2 + 3?", "options": ["4", "5"], "correctAnswer": 1, "explanation": "Five."},
            {"id": "g2", "text": "Broken", "options": ["only"], "correctAnswer": 0, "explanation": ""},
            {"id": "g1", "text": "Duplicate", "options": ["a", "b"], "correctAnswer": 0, "explanation": ""},
            {"id": "g3", "text": "3 * 3?", "options": ["6", "9"], "correctAnswer": 1, "explanation": "Nine."}
        ]);
        let text = format!("```json\n{questions}\n```");

        Mock::given(method("POST"))
            .and(path(TEXT_PATH))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": text}]}}]
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri())).unwrap();
        let generated = provider.generate(Category::Mathematics, 5).await.unwrap();

        let ids: Vec<&str> = generated.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["g1", "g3"]);
        assert!(generated
            .iter()
            .all(|q| q.category == Category::Mathematics));
    }

    #[tokio::test]
    async fn unparsable_generation_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TEXT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "no questions today"}]}}]
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri())).unwrap();
        let err = provider.generate(Category::Languages, 2).await.unwrap_err();
        assert!(err.to_string().contains("failed to parse generated questions"));
    }

    #[tokio::test]
    async fn server_error_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TEXT_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri())).unwrap();
        let err = provider.generate(Category::Humanities, 1).await.unwrap_err();
        assert!(err.to_string().contains("API error (HTTP 500): internal error"));
    }
}
