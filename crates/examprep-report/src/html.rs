//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use examprep_core::model::Question;
use examprep_core::report::ExamReport;
use examprep_core::results::CategoryBreakdown;

/// Bar colours, one per category position in canonical order.
const CATEGORY_COLORS: [&str; 4] = ["#3b82f6", "#10b981", "#f59e0b", "#8b5cf6"];

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from an exam report.
pub fn generate_html(report: &ExamReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>examprep report: {}</title>\n",
        html_escape(&report.bank.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str("<h1>examprep report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Bank: <strong>{}</strong> | {} questions | {}</p>\n",
        html_escape(&report.bank.name),
        report.result.total,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<div class=\"cards\">\n");
    html.push_str(&card(
        "Score",
        &format!("{}/{}", report.result.score, report.result.total),
    ));
    html.push_str(&card("Time", &report.result.time_spent_display()));
    html.push_str(&card(
        "Accuracy",
        &format!("{:.1}%", report.result.accuracy()),
    ));
    html.push_str(&card(
        "Unanswered",
        &report.result.unanswered().to_string(),
    ));
    html.push_str("</div>\n");

    html.push_str("<h2>By category</h2>\n");
    html.push_str(&generate_bar_chart(&report.breakdown));

    html.push_str("<table class=\"summary\">\n");
    html.push_str(
        "<thead><tr><th>Category</th><th>Questions</th><th>Correct</th><th>Accuracy</th></tr></thead>\n",
    );
    html.push_str("<tbody>\n");
    for b in &report.breakdown {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
            html_escape(b.category.label()),
            b.count,
            b.correct,
            b.percentage
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Answer review
    html.push_str("<section class=\"review\">\n");
    html.push_str("<h2>Answer review</h2>\n");
    for (i, question) in report.questions.iter().enumerate() {
        html.push_str(&review_item(report, i, question));
    }
    html.push_str("</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &ExamReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn card(label: &str, value: &str) -> String {
    format!(
        "<div class=\"card\"><span class=\"label\">{}</span><span class=\"value\">{}</span></div>\n",
        html_escape(label),
        html_escape(value)
    )
}

fn review_item(report: &ExamReport, index: usize, question: &Question) -> String {
    let outcome = report.result.outcome(&question.id);
    let selected = outcome.and_then(|o| o.selected);
    let correct = outcome.is_some_and(|o| o.correct);

    let status_class = match (selected, correct) {
        (_, true) => "pass",
        (None, false) => "skipped",
        (Some(_), false) => "fail",
    };

    let mut item = format!(
        "<article class=\"question {status_class}\">\n<h3>{}. <span class=\"category\">{}</span></h3>\n<p>{}</p>\n",
        index + 1,
        html_escape(question.category.label()),
        html_escape(&question.text)
    );
    if let Some(image) = &question.image {
        item.push_str(&format!(
            "<figure><img src=\"{}\" alt=\"Illustration for question {}\"></figure>\n",
            html_escape(image),
            index + 1
        ));
    }

    item.push_str("<ol class=\"options\">\n");
    for (i, option) in question.options.iter().enumerate() {
        let mut classes = Vec::new();
        if i == question.correct_answer {
            classes.push("correct");
        }
        if selected == Some(i) {
            classes.push("chosen");
        }
        item.push_str(&format!(
            "<li class=\"{}\"><span class=\"letter\">{}</span> {}</li>\n",
            classes.join(" "),
            Question::option_letter(i),
            html_escape(option)
        ));
    }
    item.push_str("</ol>\n");

    let chosen = selected
        .map(|i| Question::option_letter(i).to_string())
        .unwrap_or_else(|| "none".to_string());
    item.push_str(&format!(
        "<p class=\"verdict\">Your answer: {} | Correct answer: {}</p>\n",
        chosen,
        Question::option_letter(question.correct_answer)
    ));
    if !question.explanation.is_empty() {
        item.push_str(&format!(
            "<p class=\"explanation\">{}</p>\n",
            html_escape(&question.explanation)
        ));
    }
    item.push_str("</article>\n");
    item
}

fn generate_bar_chart(breakdown: &[CategoryBreakdown]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 180;

    let total_height = breakdown.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\" role=\"img\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, b) in breakdown.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (b.percentage.clamp(0.0, 100.0) / 100.0 * max_width as f64) as usize;
        let color = CATEGORY_COLORS[i % CATEGORY_COLORS.len()];

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(b.category.label())
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            b.percentage
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --skip: #f3f4f6; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --skip: #1f2937; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.cards { display: flex; gap: 1rem; flex-wrap: wrap; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; min-width: 8rem; }
.card .label { display: block; color: #6b7280; font-size: 0.85rem; }
.card .value { display: block; font-size: 1.5rem; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.question { border: 1px solid var(--border); border-radius: 8px; padding: 1rem; margin: 1rem 0; }
.question.pass { border-left: 6px solid #22c55e; }
.question.fail { border-left: 6px solid #ef4444; }
.question.skipped { border-left: 6px solid #9ca3af; }
.category { color: #6b7280; font-weight: normal; font-size: 0.9rem; }
.options { list-style: none; padding: 0; }
.options li { padding: 0.25rem 0.5rem; border-radius: 4px; }
.options li.correct { background: var(--pass); }
.options li.chosen:not(.correct) { background: var(--fail); }
.letter { font-weight: bold; margin-right: 0.5rem; }
.explanation { background: var(--skip); padding: 0.75rem; border-radius: 6px; }
svg { margin: 1rem 0; }
figure img { max-width: 100%; border-radius: 6px; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use examprep_core::model::{BankSummary, Category};
    use examprep_core::results::{ExamResult, Outcome};

    fn question(id: &str, category: Category, text: &str) -> Question {
        Question {
            id: id.into(),
            category,
            text: text.into(),
            image: None,
            options: vec!["first".into(), "second".into(), "third".into()],
            correct_answer: 0,
            explanation: format!("Explanation for {id}."),
        }
    }

    fn make_test_report() -> ExamReport {
        let now = chrono::Utc::now();
        ExamReport {
            id: uuid::Uuid::nil(),
            created_at: now,
            bank: BankSummary {
                id: "test-bank".into(),
                name: "Test <Bank>".into(),
                question_count: 3,
            },
            questions: vec![
                question("h1", Category::Humanities, "Who & why?"),
                question("n1", Category::NatureSciences, "What is ATP?"),
                question("m1", Category::Mathematics, "2 + 2?"),
            ],
            result: ExamResult {
                session_id: uuid::Uuid::nil(),
                score: 1,
                total: 3,
                time_spent_secs: 125,
                outcomes: vec![
                    Outcome {
                        question_id: "h1".into(),
                        selected: Some(0),
                        correct: true,
                    },
                    Outcome {
                        question_id: "n1".into(),
                        selected: Some(2),
                        correct: false,
                    },
                    Outcome {
                        question_id: "m1".into(),
                        selected: None,
                        correct: false,
                    },
                ],
                started_at: now,
                completed_at: now,
            },
            breakdown: vec![
                CategoryBreakdown::new(Category::Humanities, 1, 1),
                CategoryBreakdown::new(Category::NatureSciences, 1, 0),
                CategoryBreakdown::new(Category::Languages, 0, 0),
                CategoryBreakdown::new(Category::Mathematics, 1, 0),
            ],
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&make_test_report());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("1/3"));
        assert!(html.contains("2m 5s"));
        assert!(html.contains("33.3%"));
        assert!(html.contains("<svg"));
        assert!(html.contains("Explanation for n1."));
        assert!(html.contains("Your answer: C | Correct answer: A"));
        assert!(html.contains("Your answer: none | Correct answer: A"));
    }

    #[test]
    fn html_escapes_user_text() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("Test &lt;Bank&gt;"));
        assert!(html.contains("Who &amp; why?"));
        assert!(!html.contains("Test <Bank>"));
    }

    #[test]
    fn chart_uses_fixed_colours_in_canonical_order() {
        let html = generate_html(&make_test_report());
        let positions: Vec<usize> = CATEGORY_COLORS
            .iter()
            .map(|c| html.find(&format!("fill=\"{c}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let humanities = html.find(">Humanities</text>").unwrap();
        let mathematics = html.find(">Mathematics</text>").unwrap();
        assert!(humanities < mathematics);
    }

    #[test]
    fn review_marks_question_status() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("class=\"question pass\""));
        assert!(html.contains("class=\"question fail\""));
        assert!(html.contains("class=\"question skipped\""));
    }

    #[test]
    fn review_shows_question_image_escaped() {
        let mut report = make_test_report();
        report.questions[2].image = Some("https://example.org/chart.png?a=1&b=\"2\"".into());
        let html = generate_html(&report);

        assert!(html.contains(
            "<img src=\"https://example.org/chart.png?a=1&amp;b=&quot;2&quot;\" alt=\"Illustration for question 3\">"
        ));
        assert_eq!(html.matches("<img ").count(), 1);
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&report, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
