//! examprep CLI: practice ENEM-style exams from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use examprep_core::model::Category;

mod commands;

#[derive(Parser)]
#[command(name = "examprep", version, about = "ENEM-style exam practice")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take an exam interactively
    Take {
        /// Question bank file or directory (defaults to the built-in bank)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Number of questions to draw (default from config, 50)
        #[arg(long)]
        sample_size: Option<usize>,

        /// Seed for a reproducible question order
        #[arg(long)]
        seed: Option<u64>,

        /// Reject advancing past an unanswered question in the engine
        #[arg(long)]
        require_answer: bool,

        /// Output directory for reports
        #[arg(long, default_value = "./examprep-results")]
        output: PathBuf,

        /// Report formats: json, html, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to question bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Show a saved exam report
    Show {
        /// Report JSON written by `take`
        #[arg(long)]
        report: PathBuf,

        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Edit a question image with a natural-language instruction
    EditImage {
        /// Image to edit
        #[arg(long)]
        input: PathBuf,

        /// What to change
        #[arg(long)]
        instruction: String,

        /// Where to write the edited image (defaults to <input>-edited.<ext>)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate new questions for a category
    Generate {
        /// humanities, nature-sciences, languages or mathematics
        #[arg(long)]
        category: Category,

        /// Number of questions
        #[arg(long, default_value = "5")]
        count: usize,

        /// Bank file to write (prints to stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examprep=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            bank,
            sample_size,
            seed,
            require_answer,
            output,
            format,
            config,
        } => commands::take::execute(
            bank,
            sample_size,
            seed,
            require_answer,
            output,
            format,
            config,
        ),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Show { report, format } => commands::show::execute(report, format),
        Commands::EditImage {
            input,
            instruction,
            output,
            config,
        } => commands::edit_image::execute(input, instruction, output, config).await,
        Commands::Generate {
            category,
            count,
            output,
            config,
        } => commands::generate::execute(category, count, output, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
