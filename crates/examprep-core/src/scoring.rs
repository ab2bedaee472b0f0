//! Scoring and per-category analytics over a completed session.
//!
//! Both functions are pure: they borrow the session and result read-only.

use std::collections::HashSet;

use crate::engine::Session;
use crate::error::EngineError;
use crate::model::Category;
use crate::results::{CategoryBreakdown, ExamResult, Outcome};

/// Score a completed session.
///
/// An answer counts only when it is exactly the question's `correct_answer`;
/// unanswered questions are never correct. Outcomes keep the session order.
pub fn score(session: &Session) -> Result<ExamResult, EngineError> {
    let completed_at = session.completed_at.ok_or(EngineError::SessionNotComplete)?;

    let outcomes: Vec<Outcome> = session
        .questions()
        .iter()
        .map(|q| {
            let selected = session.answer(&q.id).ok().flatten();
            Outcome {
                question_id: q.id.clone(),
                selected,
                correct: selected == Some(q.correct_answer),
            }
        })
        .collect();

    let score = outcomes.iter().filter(|o| o.correct).count();
    let elapsed_ms = (completed_at - session.started_at).num_milliseconds().max(0);
    let time_spent_secs = u64::try_from(elapsed_ms / 1000).unwrap_or(0);

    Ok(ExamResult {
        session_id: session.id,
        score,
        total: outcomes.len(),
        time_spent_secs,
        outcomes,
        started_at: session.started_at,
        completed_at,
    })
}

/// Per-category correctness, one entry per category in canonical order.
///
/// Categories with no questions in the session report a zero percentage.
pub fn category_breakdown(session: &Session, result: &ExamResult) -> Vec<CategoryBreakdown> {
    Category::ALL
        .iter()
        .map(|&category| {
            let ids: HashSet<&str> = session
                .questions()
                .iter()
                .filter(|q| q.category == category)
                .map(|q| q.id.as_str())
                .collect();
            let correct = result
                .outcomes
                .iter()
                .filter(|o| o.correct && ids.contains(o.question_id.as_str()))
                .count();
            CategoryBreakdown::new(category, ids.len(), correct)
        })
        .collect()
}
