use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "folio",
    about = "Detect chapter structure in book text and search across it"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

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
    /// Manage the documents in the library
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },
    /// Generate and inspect tables of contents
    Toc {
        #[command(subcommand)]
        action: TocAction,
    },
    /// Search library documents line by line
    Search(SearchArgs),
    /// Inspect past searches
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Library subcommands --

#[derive(Debug, Subcommand)]
pub enum LibraryAction {
    /// Register a text file as a library document
    Add {
        /// Path to the file
        path: PathBuf,
        /// Document name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a document and its stored table of contents
    Remove {
        /// Name of the document to remove
        name: String,
    },
    /// List all registered documents
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

// -- Toc subcommands --

#[derive(Debug, Subcommand)]
pub enum TocAction {
    /// Detect chapters in a document and store the result
    Generate {
        /// Document name
        document: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the stored table of contents of a document
    Show {
        /// Document name
        document: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find the chapter containing a character position
    Locate {
        /// Document name
        document: String,
        /// Character offset into the document
        position: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search text, or a regular expression with --regex
    pub query: String,

    /// Only search documents whose name matches this glob (repeatable)
    #[arg(short = 'd', long = "document")]
    pub documents: Vec<String>,

    /// Treat the query as a regular expression
    #[arg(short = 'r', long)]
    pub regex: bool,

    /// Match case exactly
    #[arg(short = 's', long)]
    pub case_sensitive: bool,

    /// Only match whole whitespace-delimited words
    #[arg(short = 'w', long)]
    pub whole_words: bool,

    /// Maximum number of results to return
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not record this search in the history
    #[arg(long)]
    pub no_history: bool,
}

// -- History subcommands --

#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    /// List past searches, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest past searches containing some text
    Suggest {
        /// Text to look for
        prefix: String,
    },
    /// Forget one past search
    Remove {
        /// Exact query text
        query: String,
    },
    /// Forget all past searches
    Clear,
}

// -- Config subcommands --

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Persist a setting
    Set {
        /// Setting name, e.g. toc.confidence_threshold
        key: String,
        /// New value
        value: String,
    },
    /// Revert a setting to its default
    Unset {
        /// Setting name
        key: String,
    },
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
            "folio",
            &mut std::io::stdout(),
        );
    }
}
