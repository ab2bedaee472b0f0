//! Mock collaborators for testing without real API calls.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use examprep_core::model::{Category, Question};
use examprep_core::traits::{EditedImage, ImageEditRequest, ImageEditor, QuestionGenerator};

use crate::error::ProviderError;

enum Behavior {
    Fixed(EditedImage),
    Fail,
    Slow(Duration),
}

/// A mock image editor.
pub struct MockImageEditor {
    behavior: Behavior,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<ImageEditRequest>>,
}

impl MockImageEditor {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always returns the given image.
    pub fn with_fixed_image(image: &[u8], mime_type: &str) -> Self {
        Self::with_behavior(Behavior::Fixed(EditedImage {
            image: image.to_vec(),
            mime_type: mime_type.to_string(),
        }))
    }

    /// Always fails with a network error.
    pub fn failing() -> Self {
        Self::with_behavior(Behavior::Fail)
    }

    /// Sleeps for `delay` and then echoes the input image.
    pub fn slow(delay: Duration) -> Self {
        Self::with_behavior(Behavior::Slow(delay))
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<ImageEditRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageEditor for MockImageEditor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn edit(&self, request: &ImageEditRequest) -> anyhow::Result<EditedImage> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match &self.behavior {
            Behavior::Fixed(edited) => Ok(edited.clone()),
            Behavior::Fail => {
                Err(ProviderError::NetworkError("simulated transport failure".into()).into())
            }
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(EditedImage {
                    image: request.image.clone(),
                    mime_type: request.mime_type.clone(),
                })
            }
        }
    }
}

/// A mock question generator that returns canned questions re-tagged with the
/// requested category.
pub struct MockQuestionGenerator {
    questions: Option<Vec<Question>>,
    call_count: AtomicU32,
}

impl MockQuestionGenerator {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: Some(questions),
            call_count: AtomicU32::new(0),
        }
    }

    /// Always fails with an API error.
    pub fn failing() -> Self {
        Self {
            questions: None,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QuestionGenerator for MockQuestionGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, category: Category, count: usize) -> anyhow::Result<Vec<Question>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let Some(questions) = &self.questions else {
            return Err(ProviderError::ApiError {
                status: 500,
                message: "simulated failure".into(),
            }
            .into());
        };

        Ok(questions
            .iter()
            .take(count)
            .cloned()
            .map(|mut q| {
                q.category = category;
                q
            })
            .collect())
    }
}
