//! The `examprep init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examprep.toml").exists() {
        println!("examprep.toml already exists, skipping.");
    } else {
        std::fs::write("examprep.toml", SAMPLE_CONFIG)?;
        println!("Created examprep.toml");
    }

    std::fs::create_dir_all("question-banks")?;
    let example_path = std::path::Path::new("question-banks/example.toml");
    if example_path.exists() {
        println!("question-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created question-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set GEMINI_API_KEY or EXAMPREP_GEMINI_KEY (used by edit-image and generate)");
    println!("  2. Run: examprep validate --bank question-banks/example.toml");
    println!("  3. Run: examprep take --bank question-banks/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examprep configuration

default_provider = "gemini"
image_model = "gemini-2.5-flash-image"
question_model = "gemini-3-flash-preview"
sample_size = 50
edit_timeout_secs = 60
# question_bank = "question-banks"

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Question Bank"
description = "A small bank to get started"

[[questions]]
id = "ex-humanities-1"
category = "humanities"
text = "Em que ano foi proclamada a Independência do Brasil?"
options = ["1500", "1808", "1822", "1889", "1930"]
correct_answer = 2
explanation = "D. Pedro I proclamou a Independência em 7 de setembro de 1822."

[[questions]]
id = "ex-nature-1"
category = "nature-sciences"
text = "Qual gás as plantas absorvem durante a fotossíntese?"
options = ["Oxigênio", "Gás carbônico", "Nitrogênio", "Hidrogênio", "Metano"]
correct_answer = 1
explanation = "A fotossíntese converte gás carbônico e água em glicose, liberando oxigênio."

[[questions]]
id = "ex-languages-1"
category = "languages"
text = "Qual figura de linguagem aparece em 'Seus olhos são duas estrelas'?"
options = ["Metonímia", "Hipérbole", "Metáfora", "Ironia", "Eufemismo"]
correct_answer = 2
explanation = "Há uma comparação implícita, sem conectivo, entre olhos e estrelas."

[[questions]]
id = "ex-mathematics-1"
category = "mathematics"
text = "Quanto é 15% de 200?"
options = ["15", "20", "30", "35", "45"]
correct_answer = 2
explanation = "0,15 x 200 = 30."
"#;
