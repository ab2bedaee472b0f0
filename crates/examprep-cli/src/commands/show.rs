//! The `examprep show` command.

use std::path::PathBuf;

use anyhow::Result;

use examprep_core::model::Question;
use examprep_core::report::ExamReport;

use super::take::write_summary;

pub fn execute(report_path: PathBuf, format: String) -> Result<()> {
    let report = ExamReport::load_json(&report_path)?;

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "{} | {}",
                report.bank.name,
                report.created_at.format("%Y-%m-%d %H:%M UTC")
            );
            let stdout = std::io::stdout();
            write_summary(&mut stdout.lock(), &report.result, &report.breakdown)?;

            let missed: Vec<&Question> = report
                .questions
                .iter()
                .filter(|q| !report.result.outcome(&q.id).is_some_and(|o| o.correct))
                .collect();
            if !missed.is_empty() {
                println!("\nMissed questions:");
                for q in missed {
                    let chosen = report
                        .result
                        .outcome(&q.id)
                        .and_then(|o| o.selected)
                        .map(|i| Question::option_letter(i).to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  {} ({}) answered {}, correct {}",
                        q.id,
                        q.category.label(),
                        chosen,
                        Question::option_letter(q.correct_answer)
                    );
                }
            }
        }
    }

    Ok(())
}
