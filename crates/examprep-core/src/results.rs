//! Result types produced when an exam session completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Category;

/// Per-question record of the selected versus correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub question_id: String,
    /// The chosen option, `None` when the question was left unanswered.
    pub selected: Option<usize>,
    pub correct: bool,
}

/// The scored result of one completed exam session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    /// Id of the session this result was computed from.
    pub session_id: Uuid,
    /// Number of correct answers.
    pub score: usize,
    /// Number of questions in the session.
    pub total: usize,
    /// Whole seconds between session start and completion.
    pub time_spent_secs: u64,
    /// Outcomes in the session's question order.
    pub outcomes: Vec<Outcome>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ExamResult {
    /// Percentage of correct answers, `0.0` for an empty session.
    pub fn accuracy(&self) -> f64 {
        percentage(self.score, self.total)
    }

    /// Number of questions left unanswered.
    pub fn unanswered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.selected.is_none()).count()
    }

    /// Time spent formatted as `"{minutes}m {seconds}s"`.
    pub fn time_spent_display(&self) -> String {
        format!("{}m {}s", self.time_spent_secs / 60, self.time_spent_secs % 60)
    }

    pub fn outcome(&self, question_id: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.question_id == question_id)
    }
}

/// Correctness aggregated over one subject category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    /// Questions of this category in the session.
    pub count: usize,
    /// Correct answers among them.
    pub correct: usize,
    /// `correct / count * 100`, or `0.0` when `count` is zero.
    pub percentage: f64,
}

impl CategoryBreakdown {
    pub fn new(category: Category, count: usize, correct: usize) -> Self {
        Self {
            category,
            count,
            correct,
            percentage: percentage(correct, count),
        }
    }
}

pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
