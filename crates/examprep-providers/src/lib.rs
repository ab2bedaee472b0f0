//! examprep-providers: generative AI collaborators.
//!
//! Implements the `ImageEditor` and `QuestionGenerator` traits on top of the
//! Gemini API, plus the soft-failure wrappers the CLI talks to.

pub mod config;
pub mod error;
pub mod gemini;
pub mod mock;
pub mod soft;

pub use config::{
    create_image_editor, create_question_generator, load_config, load_config_from,
    ExamprepConfig, ProviderConfig,
};
pub use error::ProviderError;
pub use gemini::GeminiProvider;
pub use soft::{SoftImageEditor, SoftQuestionGenerator};
