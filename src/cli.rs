use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "reportscope",
    version,
    about = "Topic relevance clustering and reporting-sentence extraction"
)]
pub struct Cli {
    /// Path to a JSON config file (overrides REPORTSCOPE_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify every text file in a directory as related to the topic
    Relevance(RelevanceArgs),
    /// Extract sentences built around reporting verbs into a CSV file
    Extract(ExtractArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Relevance --

#[derive(Debug, Parser)]
pub struct RelevanceArgs {
    /// Directory containing .txt documents
    pub dir: PathBuf,

    /// Requested number of clusters
    #[arg(short = 'k', long = "clusters")]
    pub clusters: Option<usize>,

    /// Seed for cluster initialisation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Extract --

#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Directory containing .txt documents
    pub dir: PathBuf,

    /// Newline-delimited list of reporting verbs
    #[arg(long)]
    pub lexicon: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "output/output.csv")]
    pub output: PathBuf,

    /// Sentences of context on each side of a match
    #[arg(long)]
    pub context_range: Option<usize>,

    /// Maximum sentences merged into an open quotation
    #[arg(long)]
    pub max_merge: Option<usize>,

    /// Wrap detected reporting verbs in brackets
    #[arg(long)]
    pub mark_verbs: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "reportscope",
            &mut std::io::stdout(),
        );
    }
}
