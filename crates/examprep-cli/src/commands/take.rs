//! The `examprep take` command: an interactive exam in the terminal.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examprep_core::catalog::builtin_bank;
use examprep_core::engine::{Advance, QuizEngine};
use examprep_core::error::EngineError;
use examprep_core::model::{Question, QuestionBank};
use examprep_core::parser::load_bank;
use examprep_core::report::ExamReport;
use examprep_core::results::{CategoryBreakdown, ExamResult};
use examprep_core::traits::{RandomSource, RngSource, SystemClock};
use examprep_providers::config::load_config_from;
use examprep_report::html::write_html_report;

/// What the user asked for at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Intent {
    Select(usize),
    Next,
    Previous,
    Quit,
    Unknown(String),
}

/// Whether the single letters `n`, `p` and `q` are free to act as commands.
///
/// Once a question has an option N they select options instead, and only
/// the whole words `next`, `prev` and `quit` navigate.
fn short_commands(option_count: usize) -> bool {
    option_count <= usize::from(b'n' - b'a')
}

/// Whole-word commands always navigate. `n`, `p` and `q` are commands unless
/// `option_count` makes them option letters; any other single letter picks an
/// option, as does a 1-based number.
fn parse_intent(line: &str, option_count: usize) -> Intent {
    let input = line.trim().to_lowercase();
    let short = short_commands(option_count);
    match input.as_str() {
        "" | "next" => Intent::Next,
        "prev" | "previous" => Intent::Previous,
        "quit" => Intent::Quit,
        "n" if short => Intent::Next,
        "p" if short => Intent::Previous,
        "q" if short => Intent::Quit,
        _ => {
            let mut chars = input.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_lowercase() => {
                    Intent::Select((c as u8 - b'a') as usize)
                }
                _ => match input.parse::<usize>() {
                    Ok(n) if n >= 1 => Intent::Select(n - 1),
                    _ => Intent::Unknown(input),
                },
            }
        }
    }
}

/// How an interactive exam ended.
#[derive(Debug)]
pub enum ExamOutcome {
    Completed(ExamResult),
    Quit,
}

fn render_question<W: Write>(
    out: &mut W,
    question: &Question,
    position: usize,
    total: usize,
    selected: Option<usize>,
) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "[{}] Question {} of {}",
        question.category.label(),
        position + 1,
        total
    )?;
    writeln!(out, "{}", question.text)?;
    if let Some(image) = &question.image {
        writeln!(out, "(image: {image})")?;
    }
    for (i, option) in question.options.iter().enumerate() {
        let marker = if selected == Some(i) { '*' } else { ' ' };
        writeln!(out, "{marker} {}) {option}", Question::option_letter(i))?;
    }
    Ok(())
}

/// Drive `engine` from line-based input until the exam completes or the user quits.
///
/// The session must already be started. Reaching end of input counts as quitting.
pub fn run_exam<R: BufRead, W: Write>(
    engine: &mut QuizEngine,
    mut input: R,
    out: &mut W,
) -> Result<ExamOutcome> {
    let mut line = String::new();

    loop {
        let session = engine.session().context("no exam in progress")?;
        let question = session
            .current_question()
            .context("exam has no questions")?
            .clone();
        render_question(
            out,
            &question,
            session.cursor(),
            session.len(),
            session.current_answer(),
        )?;
        let unanswered = session.current_answer().is_none();
        let option_count = question.options.len();
        let commands = if short_commands(option_count) {
            "[letter] answer, [n]ext, [p]revious, [q]uit"
        } else {
            "[letter or number] answer, next, prev, quit"
        };
        write!(
            out,
            "Answered {}/{}. {commands} > ",
            session.answered_count(),
            session.len()
        )?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            engine.reset();
            return Ok(ExamOutcome::Quit);
        }

        match parse_intent(&line, option_count) {
            Intent::Select(option) => match engine.select_option(&question.id, option) {
                Ok(()) => {}
                Err(EngineError::InvalidOption { option_count, .. }) => writeln!(
                    out,
                    "Choose an option between A and {}.",
                    Question::option_letter(option_count.saturating_sub(1))
                )?,
                Err(e) => return Err(e.into()),
            },
            Intent::Next if unanswered => {
                writeln!(out, "Answer the question before moving on.")?;
            }
            Intent::Next => match engine.advance() {
                Ok(Advance::Moved(_)) => {}
                Ok(Advance::Completed(result)) => return Ok(ExamOutcome::Completed(result)),
                Err(EngineError::AnswerRequired(_)) => {
                    writeln!(out, "Answer the question before moving on.")?
                }
                Err(e) => return Err(e.into()),
            },
            Intent::Previous => {
                engine.retreat()?;
            }
            Intent::Quit => {
                engine.reset();
                writeln!(out, "Exam abandoned.")?;
                return Ok(ExamOutcome::Quit);
            }
            Intent::Unknown(input) => {
                writeln!(out, "Unrecognised input '{input}'.")?;
            }
        }
    }
}

/// Per-category results as a terminal table.
pub fn breakdown_table(breakdown: &[CategoryBreakdown]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Questions", "Correct", "Accuracy"]);
    for b in breakdown {
        table.add_row(vec![
            Cell::new(b.category.label()),
            Cell::new(b.count),
            Cell::new(b.correct),
            Cell::new(format!("{:.1}%", b.percentage)),
        ]);
    }
    table
}

/// Score, time, accuracy and the breakdown table.
pub fn write_summary<W: Write>(
    out: &mut W,
    result: &ExamResult,
    breakdown: &[CategoryBreakdown],
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Score: {}/{}", result.score, result.total)?;
    writeln!(out, "Time: {}", result.time_spent_display())?;
    writeln!(out, "Accuracy: {:.1}%", result.accuracy())?;
    writeln!(out, "{}", breakdown_table(breakdown))?;
    Ok(())
}

fn resolve_bank(bank: Option<PathBuf>, configured: Option<PathBuf>) -> Result<QuestionBank> {
    match bank.or(configured) {
        Some(path) => load_bank(&path),
        None => builtin_bank(),
    }
}

fn write_reports(report: &ExamReport, output: &Path, format: &str) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "markdown"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("exam-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("exam-{timestamp}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("exam-{timestamp}.md"));
                std::fs::write(&path, report.to_markdown())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn execute(
    bank: Option<PathBuf>,
    sample_size: Option<usize>,
    seed: Option<u64>,
    require_answer: bool,
    output: PathBuf,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let sample_size = sample_size.unwrap_or(config.sample_size);

    let bank = resolve_bank(bank, config.question_bank.clone())?;
    tracing::debug!(bank = %bank.id, questions = bank.len(), "question bank loaded");

    let random: Box<dyn RandomSource> = match seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::from_os_rng()),
    };
    let mut engine = QuizEngine::new(random, Arc::new(SystemClock)).require_answer(require_answer);

    let session_len = engine.start(bank.questions(), sample_size)?.len();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(
        out,
        "examprep: {} ({} questions drawn from {})",
        bank.name,
        session_len,
        bank.len()
    )?;

    let result = match run_exam(&mut engine, std::io::stdin().lock(), &mut out)? {
        ExamOutcome::Completed(result) => result,
        ExamOutcome::Quit => return Ok(()),
    };

    let breakdown = engine.breakdown()?;
    write_summary(&mut out, &result, &breakdown)?;

    let session = engine.session().context("completed exam has no session")?;
    let report = ExamReport::new(bank.summary(), session, result);
    write_reports(&report, &output, &format)?;

    Ok(())
}
