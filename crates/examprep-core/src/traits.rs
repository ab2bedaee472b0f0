//! Core trait definitions for the engine's injected dependencies and the
//! external collaborators.
//!
//! The random source and clock are consumed by the session engine. The image
//! editor and question generator are implemented by `examprep-providers`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::model::{Category, Question};

// ---------------------------------------------------------------------------
// Random source
// ---------------------------------------------------------------------------

/// A pluggable source of uniform randomness, consumed once per session start.
pub trait RandomSource: Send {
    /// Return a uniformly random permutation of `0..len`.
    fn permutation(&mut self, len: usize) -> Vec<usize>;
}

/// [`RandomSource`] backed by any `rand` generator.
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Reproducible orderings for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Non-reproducible orderings seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut self.rng);
        order
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of the current time for session timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ---------------------------------------------------------------------------
// Image edit collaborator
// ---------------------------------------------------------------------------

/// Trait for backends that edit an image from a natural-language instruction.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Human-readable backend name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Apply the instruction to the image.
    async fn edit(&self, request: &ImageEditRequest) -> anyhow::Result<EditedImage>;
}

/// Request to edit an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEditRequest {
    /// Raw image bytes.
    pub image: Vec<u8>,
    /// MIME type of `image` (e.g. "image/png").
    pub mime_type: String,
    /// Free-text edit instruction.
    pub instruction: String,
}

/// An edited image returned by an [`ImageEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedImage {
    pub image: Vec<u8>,
    pub mime_type: String,
}

/// Prompt sent alongside the image for an edit request.
pub fn edit_prompt(instruction: &str) -> String {
    format!(
        "Edit this image based on the following instruction: {}. Return only the edited image.",
        instruction.trim()
    )
}

/// Guess an image MIME type from a file extension.
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// File extension for an image MIME type.
pub fn extension_for_mime_type(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/heic" => "heic",
        _ => "png",
    }
}

// ---------------------------------------------------------------------------
// Question generator collaborator
// ---------------------------------------------------------------------------

/// Trait for backends that author new questions for a category.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Generate up to `count` questions tagged with `category`.
    async fn generate(&self, category: Category, count: usize) -> anyhow::Result<Vec<Question>>;
}

/// A question as authored by a generator, before it is tagged with a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

impl GeneratedQuestion {
    pub fn into_question(self, category: Category) -> Question {
        Question {
            id: self.id,
            category,
            text: self.text,
            image: None,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
        }
    }
}

/// Prompt used to request new questions.
pub fn generation_prompt(category: Category, count: usize) -> String {
    format!(
        "Write {count} new ENEM-style multiple-choice questions for the area \"{}\". \
         Each question needs a unique id, the statement, five options, the zero-based \
         index of the correct option, and a short explanation. Respond in JSON.",
        category.enem_area()
    )
}

// ---------------------------------------------------------------------------
// Markdown JSON extraction
// ---------------------------------------------------------------------------

/// Extract a JSON payload from a markdown-formatted model response.
///
/// Handles:
/// - ```json``` blocks (the first one wins)
/// - Generic ``` blocks (if no json-specific block is found)
/// - Raw JSON with no markdown fences (returned trimmed)
pub fn extract_json_from_markdown(response: &str) -> String {
    let mut json_block: Option<String> = None;
    let mut generic_block: Option<String> = None;
    let mut in_block = false;
    let mut is_json_block = false;
    let mut is_generic_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            is_generic_block = lang.is_empty();
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block && json_block.is_none() {
                json_block = Some(current_block.clone());
            } else if is_generic_block && generic_block.is_none() {
                generic_block = Some(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    // Truncated (unclosed) block: keep what was accumulated
    if in_block && !current_block.is_empty() {
        if is_json_block && json_block.is_none() {
            json_block = Some(current_block);
        } else if is_generic_block && generic_block.is_none() {
            generic_block = Some(current_block);
        }
    }

    json_block
        .or(generic_block)
        .unwrap_or_else(|| response.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sources_agree() {
        let mut a = RngSource::seeded(7);
        let mut b = RngSource::seeded(7);
        assert_eq!(a.permutation(20), b.permutation(20));
    }

    #[test]
    fn permutation_covers_every_index() {
        let mut source = RngSource::seeded(42);
        let mut order = source.permutation(50);
        order.sort_unstable();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
        assert!(source.permutation(0).is_empty());
    }

    #[test]
    fn edit_prompt_wraps_instruction() {
        assert_eq!(
            edit_prompt("  black and white "),
            "Edit this image based on the following instruction: black and white. Return only the edited image."
        );
    }

    #[test]
    fn mime_types() {
        assert_eq!(mime_type_for_extension("PNG"), Some("image/png"));
        assert_eq!(mime_type_for_extension("jpeg"), Some("image/jpeg"));
        assert_eq!(mime_type_for_extension("txt"), None);
        assert_eq!(extension_for_mime_type("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime_type("application/octet-stream"), "png");
    }

    #[test]
    fn generated_question_uses_camel_case() {
        let raw = r#"{"id":"g1","text":"?","options":["a","b"],"correctAnswer":1}"#;
        let generated: GeneratedQuestion = serde_json::from_str(raw).unwrap();
        let question = generated.into_question(Category::Languages);
        assert_eq!(question.correct_answer, 1);
        assert_eq!(question.category, Category::Languages);
        assert!(question.explanation.is_empty());
    }

    #[test]
    fn extract_json_block() {
        let input = "Here you go:\n\n```json\n[{\"id\": \"a\"}]\n```\n\nEnjoy!";
        assert_eq!(extract_json_from_markdown(input), "[{\"id\": \"a\"}]");
    }

    #[test]
    fn extract_prefers_json_over_generic() {
        let input = "```\nnot this\n```\n\n```json\n[]\n```\n";
        assert_eq!(extract_json_from_markdown(input), "[]");
    }

    #[test]
    fn extract_generic_block_fallback() {
        let input = "```\n[1, 2]\n```";
        assert_eq!(extract_json_from_markdown(input), "[1, 2]");
    }

    #[test]
    fn extract_raw_json() {
        assert_eq!(extract_json_from_markdown("  [1]\n"), "[1]");
    }

    #[test]
    fn extract_truncated_block() {
        let input = "```json\n[{\"id\": \"a\"}";
        assert_eq!(extract_json_from_markdown(input), "[{\"id\": \"a\"}");
    }
}
