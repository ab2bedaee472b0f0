//! The `examprep generate` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use examprep_core::model::{Category, Question};
use examprep_core::parser::questions_to_toml;
use examprep_providers::config::{create_question_generator, load_config_from};
use examprep_providers::SoftQuestionGenerator;

/// A complete bank file holding the generated questions.
fn bank_document(category: Category, questions: &[Question]) -> Result<String> {
    let mut doc = format!(
        "[bank]\nid = \"generated-{category}\"\nname = \"Generated {} questions\"\n\n",
        category.label()
    );
    doc.push_str(&questions_to_toml(questions)?);
    Ok(doc)
}

pub async fn execute(
    category: Category,
    count: usize,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(count >= 1, "count must be at least 1");

    let config = load_config_from(config_path.as_deref())?;
    let generator = SoftQuestionGenerator::new(Arc::from(create_question_generator(&config)?))
        .with_deadline(config.edit_timeout());

    let questions = generator.generate(category, count).await;
    if questions.is_empty() {
        eprintln!("No questions generated.");
        return Ok(());
    }

    let doc = bank_document(category, &questions)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, doc)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "Wrote {} question(s) to {}",
                questions.len(),
                path.display()
            );
        }
        None => print!("{doc}"),
    }

    Ok(())
}
