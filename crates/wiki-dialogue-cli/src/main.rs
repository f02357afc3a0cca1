//! wiki-dialogue — entry point.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use wiki_dialogue_cli::commands;
use wiki_dialogue_cli::config::CrawlArgs;

#[derive(Parser)]
#[command(
    name = "wiki-dialogue",
    about = "wiki-dialogue — crawl wiki transcripts and collect every character's lines",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the transcript pages and write the results file (default).
    Crawl(CrawlArgs),

    /// Summarize a results file.
    Stats {
        /// Results file to read.
        #[arg(default_value = "results.json")]
        file: PathBuf,

        /// Number of characters to list.
        #[arg(long, default_value = "10")]
        top: usize,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   wiki-dialogue completions bash > ~/.local/share/bash-completion/completions/wiki-dialogue
    ///   wiki-dialogue completions zsh > ~/.zfunc/_wiki-dialogue
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Crawl(CrawlArgs::default()));

    let result = match command {
        Commands::Crawl(args) => commands::crawl::run(&args).await.map(|_| ()),

        Commands::Stats { file, top, json } => commands::stats::run(&file, top, json).map(|_| ()),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "wiki-dialogue", &mut std::io::stdout());
            Ok(())
        }
    };

    // 0 = success, 1 = error
    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
