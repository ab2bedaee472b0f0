//! Built-in question bank shipped with the binary.

use std::path::Path;

use anyhow::Result;

use crate::model::QuestionBank;
use crate::parser::parse_bank_str;

const ENEM_SAMPLE: &str = include_str!("../data/enem-sample.toml");

/// The embedded ENEM-style sample bank.
pub fn builtin_bank() -> Result<QuestionBank> {
    parse_bank_str(ENEM_SAMPLE, Path::new("<builtin>/enem-sample.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::parser::validate_bank;

    #[test]
    fn builtin_bank_is_valid_and_balanced() {
        let bank = builtin_bank().unwrap();
        assert_eq!(bank.id, "enem-sample");
        assert!(validate_bank(&bank).is_empty());
        for (category, count) in bank.category_counts() {
            assert_eq!(count, 4, "{category} should have 4 questions");
        }
        assert_eq!(bank.get("q2").unwrap().category, Category::Mathematics);
    }
}
