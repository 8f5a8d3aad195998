//! quizprep CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::AppContext;

#[derive(Parser)]
#[command(
    name = "quizprep",
    version,
    about = "Turn study notes into self-scored quizzes"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and the data folders
    Init,

    /// Manage study notes
    Note {
        #[command(subcommand)]
        action: NoteCommand,
    },

    /// Generate or take a quiz
    Quiz {
        #[command(subcommand)]
        action: QuizCommand,
    },

    /// List past quiz attempts
    History {
        /// Only show attempts for this note
        #[arg(long)]
        note: Option<String>,
    },

    /// Show performance statistics
    Stats,

    /// Write an HTML report of the quiz history
    Report {
        /// Output file
        #[arg(long, short, default_value = "quizprep-report.html")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum NoteCommand {
    /// Save a typed note or import one from a .txt/.pdf file
    Add {
        /// Note title (defaults to the file name when importing)
        #[arg(long)]
        title: Option<String>,

        /// Note content
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,

        /// File to import (.txt or .pdf)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List saved notes
    List,

    /// Print a note
    Show {
        #[arg(long)]
        title: String,
    },
}

#[derive(Subcommand)]
enum QuizCommand {
    /// Print generated questions for a note
    Generate {
        /// Note title
        #[arg(long)]
        note: String,

        /// Number of questions
        #[arg(long)]
        count: Option<usize>,

        /// Print the questions as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Answer and self-score a quiz interactively
    Take {
        /// Note title
        #[arg(long)]
        note: String,

        /// Number of questions
        #[arg(long)]
        count: Option<usize>,

        /// Do not save the result
        #[arg(long)]
        no_save: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Init) {
        return commands::init::execute(cli.config, cli.data_dir);
    }
    let ctx = AppContext::load(cli.config.as_deref(), cli.data_dir)?;

    match cli.command {
        // Handled above, before any config is loaded.
        Commands::Init => Ok(()),
        Commands::Note { action } => match action {
            NoteCommand::Add {
                title,
                content,
                file,
            } => commands::note::add(&ctx, title, content, file).await,
            NoteCommand::List => commands::note::list(&ctx),
            NoteCommand::Show { title } => commands::note::show(&ctx, &title),
        },
        Commands::Quiz { action } => match action {
            QuizCommand::Generate { note, count, json } => {
                commands::quiz::generate(&ctx, &note, count, json).await
            }
            QuizCommand::Take {
                note,
                count,
                no_save,
            } => commands::quiz::take(&ctx, &note, count, no_save).await,
        },
        Commands::History { note } => commands::history::execute(&ctx, note.as_deref()),
        Commands::Stats => commands::stats::execute(&ctx),
        Commands::Report { output } => commands::report::execute(&ctx, &output),
    }
}
