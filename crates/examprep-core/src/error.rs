//! Engine and question bank error types.
//!
//! Every variant here is a caller-contract violation: the presentation layer
//! sent an intent that cannot apply to the current state, or a question bank
//! does not have the required shape. None of them are retried.

use thiserror::Error;

/// Errors returned by the quiz session engine and the scoring functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `start` was called with no questions to draw from.
    #[error("question repository is empty")]
    EmptyRepository,

    /// `start` was asked to draw zero questions.
    #[error("sample size must be at least 1")]
    InvalidSampleSize,

    /// An in-progress operation was attempted while idle.
    #[error("no exam session is in progress")]
    NoActiveSession,

    /// An in-progress operation was attempted after completion.
    #[error("exam session is already completed")]
    SessionCompleted,

    /// Results were requested before the last question was submitted.
    #[error("exam session is not complete")]
    SessionNotComplete,

    /// The question id is not part of the active session.
    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    /// The option index is outside the question's option list.
    #[error("invalid option {index} for question {question_id} ({option_count} options)")]
    InvalidOption {
        question_id: String,
        index: usize,
        option_count: usize,
    },

    /// `advance` was called on an unanswered question with answers required.
    #[error("question {0} must be answered before advancing")]
    AnswerRequired(String),
}

/// Errors raised when a question or question bank violates the shape contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("question id is empty")]
    EmptyId,

    #[error("duplicate question id: {0}")]
    DuplicateId(String),

    #[error("question {id} has {count} option(s), at least 2 are required")]
    TooFewOptions { id: String, count: usize },

    #[error("question {id} marks option {index} as correct but has {option_count} options")]
    CorrectAnswerOutOfRange {
        id: String,
        index: usize,
        option_count: usize,
    },
}
