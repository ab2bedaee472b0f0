//! Core data model types for examprep.
//!
//! These are the question repository types the engine draws from: subject
//! categories, individual questions, and the validated question bank.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BankError;

/// Subject area a question belongs to.
///
/// The set is closed; [`Category::ALL`] is the canonical order used for every
/// per-category breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Humanities,
    NatureSciences,
    Languages,
    Mathematics,
}

impl Category {
    /// All categories in canonical order.
    pub const ALL: [Category; 4] = [
        Category::Humanities,
        Category::NatureSciences,
        Category::Languages,
        Category::Mathematics,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Humanities => "Humanities",
            Category::NatureSciences => "Nature Sciences",
            Category::Languages => "Languages",
            Category::Mathematics => "Mathematics",
        }
    }

    /// Name of the matching ENEM knowledge area.
    pub fn enem_area(&self) -> &'static str {
        match self {
            Category::Humanities => "Ciências Humanas",
            Category::NatureSciences => "Ciências da Natureza",
            Category::Languages => "Linguagens e Códigos",
            Category::Mathematics => "Matemática",
        }
    }

    /// Position of this category in [`Category::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Category::Humanities => 0,
            Category::NatureSciences => 1,
            Category::Languages => 2,
            Category::Mathematics => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Humanities => write!(f, "humanities"),
            Category::NatureSciences => write!(f, "nature-sciences"),
            Category::Languages => write!(f, "languages"),
            Category::Mathematics => write!(f, "mathematics"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "humanities" | "humanas" => Ok(Category::Humanities),
            "nature-sciences" | "nature" | "natureza" => Ok(Category::NatureSciences),
            "languages" | "linguagens" => Ok(Category::Languages),
            "mathematics" | "math" | "matematica" | "matemática" => Ok(Category::Mathematics),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique, stable identifier.
    pub id: String,
    /// Subject area.
    pub category: Category,
    /// The question statement.
    pub text: String,
    /// Optional illustration (URL or path) shown with the statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Answer options, in display order.
    pub options: Vec<String>,
    /// Zero-based index of the correct option.
    pub correct_answer: usize,
    /// Commentary shown when reviewing the answer.
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    /// Check the hard shape contract for a single question.
    pub fn validate(&self) -> Result<(), BankError> {
        if self.id.trim().is_empty() {
            return Err(BankError::EmptyId);
        }
        if self.options.len() < 2 {
            return Err(BankError::TooFewOptions {
                id: self.id.clone(),
                count: self.options.len(),
            });
        }
        if self.correct_answer >= self.options.len() {
            return Err(BankError::CorrectAnswerOutOfRange {
                id: self.id.clone(),
                index: self.correct_answer,
                option_count: self.options.len(),
            });
        }
        Ok(())
    }

    /// Whether `index` points at one of this question's options.
    pub fn has_option(&self, index: usize) -> bool {
        index < self.options.len()
    }

    /// Display letter for an option index (`0` → `A`).
    pub fn option_letter(index: usize) -> char {
        u8::try_from(index)
            .ok()
            .and_then(|i| b'A'.checked_add(i))
            .filter(u8::is_ascii_uppercase)
            .map(char::from)
            .unwrap_or('?')
    }
}

/// A validated collection of questions.
///
/// Construction enforces unique ids and the per-question shape contract, so
/// the engine can rely on every `correct_answer` being a valid index.
/// Deserialization goes through the same checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawQuestionBank")]
pub struct QuestionBank {
    /// Unique identifier for this bank.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of this bank.
    #[serde(default)]
    pub description: String,
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, BankError> {
        let mut seen = HashSet::new();
        for question in &questions {
            question.validate()?;
            if !seen.insert(question.id.as_str()) {
                return Err(BankError::DuplicateId(question.id.clone()));
            }
        }

        Ok(Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            questions,
        })
    }

    /// The questions in load order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up a question by id.
    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Number of questions per category, in canonical order.
    pub fn category_counts(&self) -> [(Category, usize); 4] {
        let mut counts = Category::ALL.map(|c| (c, 0usize));
        for question in &self.questions {
            counts[question.category.index()].1 += 1;
        }
        counts
    }

    pub fn summary(&self) -> BankSummary {
        BankSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            question_count: self.questions.len(),
        }
    }
}

#[derive(Deserialize)]
struct RawQuestionBank {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    questions: Vec<Question>,
}

impl TryFrom<RawQuestionBank> for QuestionBank {
    type Error = BankError;

    fn try_from(raw: RawQuestionBank) -> Result<Self, Self::Error> {
        QuestionBank::new(raw.id, raw.name, raw.description, raw.questions)
    }
}

/// Summary of a question bank (without the questions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, options: usize, correct: usize) -> Question {
        Question {
            id: id.into(),
            category: Category::Mathematics,
            text: "2 + 2 = ?".into(),
            image: None,
            options: (0..options).map(|i| i.to_string()).collect(),
            correct_answer: correct,
            explanation: String::new(),
        }
    }

    #[test]
    fn category_display_and_parse() {
        assert_eq!(Category::NatureSciences.to_string(), "nature-sciences");
        assert_eq!(
            "nature_sciences".parse::<Category>().unwrap(),
            Category::NatureSciences
        );
        assert_eq!("Humanas".parse::<Category>().unwrap(), Category::Humanities);
        assert_eq!("math".parse::<Category>().unwrap(), Category::Mathematics);
        assert!("physics".parse::<Category>().is_err());
    }

    #[test]
    fn canonical_order_matches_index() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn option_letters() {
        assert_eq!(Question::option_letter(0), 'A');
        assert_eq!(Question::option_letter(4), 'E');
        assert_eq!(Question::option_letter(26), '?');
    }

    #[test]
    fn bank_rejects_duplicate_ids() {
        let err = QuestionBank::new("b", "B", "", vec![question("q1", 2, 0), question("q1", 3, 1)])
            .unwrap_err();
        assert_eq!(err, BankError::DuplicateId("q1".into()));
    }

    #[test]
    fn bank_rejects_single_option() {
        let err = QuestionBank::new("b", "B", "", vec![question("q1", 1, 0)]).unwrap_err();
        assert!(matches!(err, BankError::TooFewOptions { count: 1, .. }));
    }

    #[test]
    fn bank_rejects_out_of_range_answer() {
        let err = QuestionBank::new("b", "B", "", vec![question("q1", 3, 3)]).unwrap_err();
        assert!(matches!(err, BankError::CorrectAnswerOutOfRange { index: 3, .. }));
    }

    #[test]
    fn category_counts_in_canonical_order() {
        let mut humanities = question("h1", 2, 0);
        humanities.category = Category::Humanities;
        let bank = QuestionBank::new(
            "b",
            "B",
            "",
            vec![humanities, question("m1", 2, 0), question("m2", 2, 1)],
        )
        .unwrap();
        assert_eq!(
            bank.category_counts(),
            [
                (Category::Humanities, 1),
                (Category::NatureSciences, 0),
                (Category::Languages, 0),
                (Category::Mathematics, 2),
            ]
        );
        assert_eq!(bank.summary().question_count, 3);
        assert!(bank.get("m2").is_some());
    }

    #[test]
    fn bank_deserialization_enforces_shape() {
        let json = r#"{
            "id": "b",
            "name": "B",
            "questions": [
                {"id": "x", "category": "mathematics", "text": "?", "options": ["1"], "correct_answer": 9},
                {"id": "x", "category": "mathematics", "text": "?", "options": ["1", "2"], "correct_answer": 0}
            ]
        }"#;
        let err = serde_json::from_str::<QuestionBank>(json).unwrap_err();
        assert!(err.to_string().contains("option(s)"));

        let json = r#"{
            "id": "b",
            "name": "B",
            "questions": [
                {"id": "x", "category": "mathematics", "text": "?", "options": ["1", "2"], "correct_answer": 0},
                {"id": "x", "category": "languages", "text": "?", "options": ["1", "2"], "correct_answer": 1}
            ]
        }"#;
        let err = serde_json::from_str::<QuestionBank>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate question id: x"));
    }

    #[test]
    fn bank_serde_roundtrip() {
        let bank = QuestionBank::new("b", "B", "", vec![question("q1", 3, 2)]).unwrap();
        let json = serde_json::to_string(&bank).unwrap();
        let back: QuestionBank = serde_json::from_str(&json).unwrap();
        assert_eq!(back.questions(), bank.questions());
    }

    #[test]
    fn question_serde_roundtrip() {
        let q = question("q1", 3, 2);
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"mathematics\""));
        assert!(!json.contains("image"));
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
