//! Exam report types with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::Session;
use crate::model::{BankSummary, Question};
use crate::results::{CategoryBreakdown, ExamResult};
use crate::scoring::category_breakdown;

/// A complete exam report: the result plus what is needed to review it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// The bank the questions were drawn from.
    pub bank: BankSummary,
    /// The session's questions in presentation order.
    pub questions: Vec<Question>,
    pub result: ExamResult,
    /// Per-category breakdown in canonical order.
    pub breakdown: Vec<CategoryBreakdown>,
}

impl ExamReport {
    pub fn new(bank: BankSummary, session: &Session, result: ExamResult) -> Self {
        let breakdown = category_breakdown(session, &result);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            bank,
            questions: session.questions().to_vec(),
            result,
            breakdown,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ExamReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.bank.name));
        md.push_str(&format!(
            "**Score:** {}/{} ({:.1}%) in {}\n\n",
            self.result.score,
            self.result.total,
            self.result.accuracy(),
            self.result.time_spent_display()
        ));

        md.push_str("| Category | Questions | Correct | Accuracy |\n");
        md.push_str("|----------|-----------|---------|----------|\n");
        for b in &self.breakdown {
            md.push_str(&format!(
                "| {} | {} | {} | {:.1}% |\n",
                b.category.label(),
                b.count,
                b.correct,
                b.percentage
            ));
        }

        let missed: Vec<&Question> = self
            .questions
            .iter()
            .filter(|q| !self.result.outcome(&q.id).is_some_and(|o| o.correct))
            .collect();
        if !missed.is_empty() {
            md.push_str("\n### Review\n\n");
            for q in missed {
                let chosen = self
                    .result
                    .outcome(&q.id)
                    .and_then(|o| o.selected)
                    .map(|i| Question::option_letter(i).to_string())
                    .unwrap_or_else(|| "-".to_string());
                md.push_str(&format!(
                    "- **{}** ({}): answered {}, correct {}. {}\n",
                    q.id,
                    q.category.label(),
                    chosen,
                    Question::option_letter(q.correct_answer),
                    q.explanation
                ));
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::{Advance, QuizEngine};
    use crate::model::Category;
    use crate::traits::{RandomSource, SystemClock};

    struct Identity;

    impl RandomSource for Identity {
        fn permutation(&mut self, len: usize) -> Vec<usize> {
            (0..len).collect()
        }
    }

    fn make_report() -> ExamReport {
        let questions: Vec<Question> = Category::ALL
            .iter()
            .enumerate()
            .map(|(i, &category)| Question {
                id: format!("q{i}"),
                category,
                text: format!("Question {i}"),
                image: None,
                options: vec!["yes".into(), "no".into()],
                correct_answer: 0,
                explanation: format!("Because {i}."),
            })
            .collect();

        let mut engine = QuizEngine::new(Box::new(Identity), Arc::new(SystemClock));
        engine.start(&questions, 4).unwrap();
        engine.select_option("q0", 0).unwrap();
        engine.advance().unwrap();
        engine.select_option("q1", 1).unwrap();
        let result = loop {
            if let Advance::Completed(result) = engine.advance().unwrap() {
                break result;
            }
        };

        let bank = BankSummary {
            id: "test".into(),
            name: "Test".into(),
            question_count: 4,
        };
        ExamReport::new(bank, engine.session().unwrap(), result)
    }

    #[test]
    fn report_carries_breakdown() {
        let report = make_report();
        assert_eq!(report.result.score, 1);
        assert_eq!(report.breakdown.len(), 4);
        assert_eq!(report.breakdown[0].correct, 1);
        assert_eq!(report.questions.len(), 4);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = ExamReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.result, report.result);
        assert_eq!(loaded.breakdown, report.breakdown);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ExamReport::load_json(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn markdown_output() {
        let md = make_report().to_markdown();
        assert!(md.contains("**Score:** 1/4 (25.0%)"));
        assert!(md.contains("| Humanities | 1 | 1 | 100.0% |"));
        assert!(md.contains("| Mathematics | 1 | 0 | 0.0% |"));
        assert!(md.contains("### Review"));
        assert!(md.contains("**q1** (Nature Sciences): answered B, correct A. Because 1."));
        assert!(md.contains("**q2** (Languages): answered -, correct A."));
        assert!(!md.contains("**q0**"));
    }
}
