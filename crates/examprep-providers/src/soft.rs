//! Soft-failure wrappers around the collaborators.
//!
//! Callers never see provider errors: every failure, timeout or empty
//! payload is logged and collapses to absence.

use std::sync::Arc;
use std::time::Duration;

use examprep_core::model::{Category, Question};
use examprep_core::traits::{EditedImage, ImageEditRequest, ImageEditor, QuestionGenerator};

use crate::error::ProviderError;

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

fn log_failure(what: &str, backend: &str, err: &anyhow::Error) {
    match err.downcast_ref::<ProviderError>() {
        Some(e) if e.is_permanent() => {
            tracing::error!(backend, "{what} failed permanently: {e}")
        }
        _ => tracing::warn!(backend, "{what} failed: {err:#}"),
    }
}

/// Image editor that never fails: it returns `None` instead.
pub struct SoftImageEditor {
    inner: Arc<dyn ImageEditor>,
    deadline: Duration,
}

impl SoftImageEditor {
    pub fn new(inner: Arc<dyn ImageEditor>) -> Self {
        Self {
            inner,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Apply `instruction` to `image`, or `None` if the edit could not be made.
    pub async fn edit(
        &self,
        image: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Option<EditedImage> {
        if instruction.trim().is_empty() {
            tracing::debug!("empty edit instruction, skipping");
            return None;
        }
        if image.is_empty() {
            tracing::debug!("empty image, skipping");
            return None;
        }

        let request = ImageEditRequest {
            image: image.to_vec(),
            mime_type: mime_type.to_string(),
            instruction: instruction.trim().to_string(),
        };

        match tokio::time::timeout(self.deadline, self.inner.edit(&request)).await {
            Ok(Ok(edited)) if edited.image.is_empty() => {
                tracing::warn!(backend = self.inner.name(), "image edit returned no data");
                None
            }
            Ok(Ok(edited)) => {
                tracing::info!(
                    backend = self.inner.name(),
                    bytes = edited.image.len(),
                    "image edited"
                );
                Some(edited)
            }
            Ok(Err(e)) => {
                log_failure("image edit", self.inner.name(), &e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    backend = self.inner.name(),
                    "image edit timed out after {}s",
                    self.deadline.as_secs()
                );
                None
            }
        }
    }
}

/// Question generator that returns an empty list on any failure.
pub struct SoftQuestionGenerator {
    inner: Arc<dyn QuestionGenerator>,
    deadline: Duration,
}

impl SoftQuestionGenerator {
    pub fn new(inner: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            inner,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn generate(&self, category: Category, count: usize) -> Vec<Question> {
        if count == 0 {
            return Vec::new();
        }

        match tokio::time::timeout(self.deadline, self.inner.generate(category, count)).await {
            Ok(Ok(questions)) => {
                tracing::info!(
                    backend = self.inner.name(),
                    count = questions.len(),
                    "generated questions for {category}"
                );
                questions
            }
            Ok(Err(e)) => {
                log_failure("question generation", self.inner.name(), &e);
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    backend = self.inner.name(),
                    "question generation timed out after {}s",
                    self.deadline.as_secs()
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockImageEditor, MockQuestionGenerator};

    const IMAGE: &[u8] = &[0x89, b'P', b'N', b'G'];

    #[tokio::test]
    async fn empty_instruction_skips_the_call() {
        let mock = Arc::new(MockImageEditor::with_fixed_image(b"edited", "image/png"));
        let soft = SoftImageEditor::new(mock.clone());

        assert!(soft.edit(IMAGE, "image/png", "").await.is_none());
        assert!(soft.edit(IMAGE, "image/png", "   ").await.is_none());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_image_skips_the_call() {
        let mock = Arc::new(MockImageEditor::with_fixed_image(b"edited", "image/png"));
        let soft = SoftImageEditor::new(mock.clone());

        assert!(soft.edit(&[], "image/png", "sepia").await.is_none());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn successful_edit_passes_through() {
        let mock = Arc::new(MockImageEditor::with_fixed_image(b"edited", "image/png"));
        let soft = SoftImageEditor::new(mock.clone());

        let edited = soft.edit(IMAGE, "image/png", "  sepia ").await.unwrap();
        assert_eq!(edited.image, b"edited");
        assert_eq!(mock.last_request().unwrap().instruction, "sepia");
    }

    #[tokio::test]
    async fn transport_failure_is_absence() {
        let mock = Arc::new(MockImageEditor::failing());
        let soft = SoftImageEditor::new(mock.clone());

        let original = IMAGE.to_vec();
        assert!(soft.edit(&original, "image/png", "sepia").await.is_none());
        assert_eq!(original, IMAGE);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_payload_is_absence() {
        let mock = Arc::new(MockImageEditor::with_fixed_image(b"", "image/png"));
        let soft = SoftImageEditor::new(mock);
        assert!(soft.edit(IMAGE, "image/png", "sepia").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_is_absence() {
        let mock = Arc::new(MockImageEditor::slow(Duration::from_secs(120)));
        let soft = SoftImageEditor::new(mock.clone()).with_deadline(Duration::from_secs(60));

        assert!(soft.edit(IMAGE, "image/png", "sepia").await.is_none());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_edit_within_deadline_succeeds() {
        let mock = Arc::new(MockImageEditor::slow(Duration::from_secs(5)));
        let soft = SoftImageEditor::new(mock);

        let edited = soft.edit(IMAGE, "image/png", "sepia").await.unwrap();
        assert_eq!(edited.image, IMAGE);
    }

    #[tokio::test]
    async fn generator_failure_is_empty() {
        let soft = SoftQuestionGenerator::new(Arc::new(MockQuestionGenerator::failing()));
        assert!(soft.generate(Category::Mathematics, 3).await.is_empty());
    }

    #[tokio::test]
    async fn zero_count_skips_the_call() {
        let mock = Arc::new(MockQuestionGenerator::new(Vec::new()));
        let soft = SoftQuestionGenerator::new(mock.clone());
        assert!(soft.generate(Category::Mathematics, 0).await.is_empty());
        assert_eq!(mock.call_count(), 0);
    }
}
