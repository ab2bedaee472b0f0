//! Quiz session engine.
//!
//! Owns the lifecycle of one exam attempt: question selection, answer
//! capture, navigation, and completion. Results are computed by
//! [`crate::scoring`] when the last question is submitted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::Question;
use crate::results::{CategoryBreakdown, ExamResult};
use crate::scoring;
use crate::traits::{Clock, RandomSource, RngSource, SystemClock};

/// Default number of questions drawn for one session.
pub const DEFAULT_SAMPLE_SIZE: usize = 50;

/// One exam attempt.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    questions: Vec<Question>,
    /// Every session question id, mapped to the selected option or `None`.
    answers: HashMap<String, Option<usize>>,
    cursor: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    fn new(questions: Vec<Question>, started_at: DateTime<Utc>) -> Self {
        let answers = questions.iter().map(|q| (q.id.clone(), None)).collect();
        Self {
            id: Uuid::new_v4(),
            questions,
            answers,
            cursor: 0,
            started_at,
            completed_at: None,
        }
    }

    /// The drawn questions in presentation order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Zero-based index of the question being shown.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    pub fn is_last(&self) -> bool {
        self.cursor + 1 >= self.questions.len()
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// The recorded answer for `question_id`.
    ///
    /// `Ok(None)` means the question is part of the session but unanswered.
    pub fn answer(&self, question_id: &str) -> Result<Option<usize>, EngineError> {
        self.answers
            .get(question_id)
            .copied()
            .ok_or_else(|| EngineError::UnknownQuestion(question_id.to_string()))
    }

    /// The recorded answer for the question under the cursor.
    pub fn current_answer(&self) -> Option<usize> {
        self.current_question()
            .and_then(|q| self.answers.get(&q.id).copied().flatten())
    }

    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|a| a.is_some()).count()
    }

    /// Fraction of the session reached, counting the current question.
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            0.0
        } else {
            (self.cursor + 1) as f64 / self.questions.len() as f64
        }
    }
}

/// Lifecycle state of the engine.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    InProgress(Session),
    Completed {
        session: Session,
        result: ExamResult,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::InProgress(_) => "in_progress",
            SessionState::Completed { .. } => "completed",
        }
    }
}

/// Outcome of [`QuizEngine::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved to the question at this index.
    Moved(usize),
    /// The last question was submitted.
    Completed(ExamResult),
}

/// The quiz session engine.
pub struct QuizEngine {
    random: Box<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    require_answer: bool,
    state: SessionState,
}

impl Default for QuizEngine {
    fn default() -> Self {
        Self::new(
            Box::new(RngSource::from_os_rng()),
            Arc::new(SystemClock),
        )
    }
}

impl QuizEngine {
    pub fn new(random: Box<dyn RandomSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            random,
            clock,
            require_answer: false,
            state: SessionState::Idle,
        }
    }

    /// Refuse to advance past an unanswered question.
    pub fn require_answer(mut self, required: bool) -> Self {
        self.require_answer = required;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The active or completed session, if any.
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::InProgress(session) => Some(session),
            SessionState::Completed { session, .. } => Some(session),
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        match &self.state {
            SessionState::InProgress(session) => session.current_question(),
            _ => None,
        }
    }

    /// Start a new session, discarding any previous one.
    ///
    /// Draws `sample_size` questions in random order. A repository smaller
    /// than `sample_size` yields a shorter session rather than an error, but
    /// a `sample_size` of zero is rejected.
    pub fn start(
        &mut self,
        questions: &[Question],
        sample_size: usize,
    ) -> Result<&Session, EngineError> {
        if sample_size == 0 {
            return Err(EngineError::InvalidSampleSize);
        }
        if questions.is_empty() {
            return Err(EngineError::EmptyRepository);
        }

        let order = self.random.permutation(questions.len());
        let mut seen = HashSet::new();
        let drawn: Vec<Question> = order
            .into_iter()
            .filter_map(|i| questions.get(i))
            .filter(|q| seen.insert(q.id.as_str()))
            .take(sample_size)
            .cloned()
            .collect();

        if drawn.len() < sample_size {
            tracing::warn!(
                requested = sample_size,
                available = drawn.len(),
                "question repository smaller than sample size, drawing all available questions"
            );
        }

        let session = Session::new(drawn, self.clock.now());
        tracing::debug!(session = %session.id, questions = session.len(), "exam session started");
        self.state = SessionState::InProgress(session);
        self.session().ok_or(EngineError::NoActiveSession)
    }

    /// Record `option` as the answer to `question_id`, replacing any earlier choice.
    pub fn select_option(&mut self, question_id: &str, option: usize) -> Result<(), EngineError> {
        let session = self.in_progress_mut()?;

        let question = session
            .question(question_id)
            .ok_or_else(|| EngineError::UnknownQuestion(question_id.to_string()))?;
        if !question.has_option(option) {
            return Err(EngineError::InvalidOption {
                question_id: question_id.to_string(),
                index: option,
                option_count: question.options.len(),
            });
        }

        session.answers.insert(question_id.to_string(), Some(option));
        Ok(())
    }

    /// Move to the next question, completing the session at the last one.
    pub fn advance(&mut self) -> Result<Advance, EngineError> {
        let require_answer = self.require_answer;
        let session = self.in_progress_mut()?;

        if require_answer && session.current_answer().is_none() {
            let id = session
                .current_question()
                .map(|q| q.id.clone())
                .unwrap_or_default();
            return Err(EngineError::AnswerRequired(id));
        }

        if !session.is_last() {
            session.cursor += 1;
            return Ok(Advance::Moved(session.cursor));
        }

        self.complete().map(Advance::Completed)
    }

    /// Move to the previous question, staying put at the first one.
    pub fn retreat(&mut self) -> Result<usize, EngineError> {
        let session = self.in_progress_mut()?;
        session.cursor = session.cursor.saturating_sub(1);
        Ok(session.cursor)
    }

    /// Return to idle, discarding the session.
    pub fn reset(&mut self) {
        if let Some(session) = self.session() {
            tracing::debug!(session = %session.id, state = self.state.name(), "exam session discarded");
        }
        self.state = SessionState::Idle;
    }

    /// The result of the completed session.
    pub fn result(&self) -> Result<&ExamResult, EngineError> {
        match &self.state {
            SessionState::Completed { result, .. } => Ok(result),
            SessionState::InProgress(_) => Err(EngineError::SessionNotComplete),
            SessionState::Idle => Err(EngineError::NoActiveSession),
        }
    }

    /// Per-category breakdown of the completed session.
    pub fn breakdown(&self) -> Result<Vec<CategoryBreakdown>, EngineError> {
        match &self.state {
            SessionState::Completed { session, result } => {
                Ok(scoring::category_breakdown(session, result))
            }
            SessionState::InProgress(_) => Err(EngineError::SessionNotComplete),
            SessionState::Idle => Err(EngineError::NoActiveSession),
        }
    }

    fn in_progress_mut(&mut self) -> Result<&mut Session, EngineError> {
        match &mut self.state {
            SessionState::InProgress(session) => Ok(session),
            SessionState::Completed { .. } => Err(EngineError::SessionCompleted),
            SessionState::Idle => Err(EngineError::NoActiveSession),
        }
    }

    fn complete(&mut self) -> Result<ExamResult, EngineError> {
        let SessionState::InProgress(mut session) = std::mem::take(&mut self.state) else {
            return Err(EngineError::NoActiveSession);
        };

        session.completed_at = Some(self.clock.now());
        let result = match scoring::score(&session) {
            Ok(result) => result,
            Err(e) => {
                self.state = SessionState::InProgress(session);
                return Err(e);
            }
        };

        tracing::debug!(
            session = %session.id,
            score = result.score,
            total = result.total,
            "exam session completed"
        );
        self.state = SessionState::Completed {
            session,
            result: result.clone(),
        };
        Ok(result)
    }
}
