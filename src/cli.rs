use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "solr-ltr",
    about = "Solr learning-to-rank administration and feature logging"
)]
pub struct Cli {
    /// Full Solr base URL, e.g. http://localhost:8983/solr
    #[arg(long, global = true, env = "SOLR_URL")]
    pub solr_url: Option<String>,

    /// Override the Solr host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Override the Solr port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Override the path Solr is served under
    #[arg(long, global = true)]
    pub base_path: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "SOLR_LTR_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that Solr is up and responding
    Health,
    /// Create or delete collections
    Collection {
        #[command(subcommand)]
        action: CollectionAction,
    },
    /// Configure learning-to-rank on a collection
    Ltr {
        #[command(subcommand)]
        action: LtrAction,
    },
    /// Add or replace schema fields
    Field {
        #[command(subcommand)]
        action: FieldAction,
    },
    /// Log LTR feature vectors for documents
    Features(FeaturesArgs),
    /// Render search results into the HTML template
    Render(RenderArgs),
    /// Download files into the data directory
    Download(DownloadArgs),
    /// Print the tokens of a piece of text
    Tokenize {
        /// Text to tokenize
        text: String,
    },
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Collection subcommands --

#[derive(Debug, Subcommand)]
pub enum CollectionAction {
    /// Delete (if present) and recreate a collection
    Create {
        /// Collection name
        name: String,
    },
    /// Delete a collection
    Delete {
        /// Collection name
        name: String,
    },
}

// -- LTR subcommands --

#[derive(Debug, Subcommand)]
pub enum LtrAction {
    /// Register the ltr query parser and features transformer
    Enable {
        /// Collection name
        collection: String,
    },
    /// Replace a feature store with the features in a JSON file
    UploadStore {
        /// Collection name
        collection: String,
        /// Feature store name
        store: String,
        /// JSON array of feature definitions
        file: PathBuf,
    },
    /// Delete a feature store
    DeleteStore {
        /// Collection name
        collection: String,
        /// Feature store name
        store: String,
    },
}

// -- Field subcommands --

#[derive(Debug, Subcommand)]
pub enum FieldAction {
    /// Add (or replace) a text_general field
    Text {
        /// Collection name
        collection: String,
        /// Field name
        field: String,
    },
    /// Add (or replace) an integer field
    Int {
        /// Collection name
        collection: String,
        /// Field name
        field: String,
    },
}

// -- Features --

#[derive(Debug, Parser)]
pub struct FeaturesArgs {
    /// Collection to query
    pub index: String,

    /// Feature store to log
    pub featureset: String,

    /// Restrict to these document ids (repeatable); all documents otherwise
    #[arg(long = "id")]
    pub ids: Vec<String>,

    /// External feature information as key=value (repeatable)
    #[arg(long = "efi", value_parser = parse_key_val)]
    pub efi: Vec<(String, String)>,

    /// Field identifying documents
    #[arg(long, default_value = "id")]
    pub id_field: String,

    /// Output documents as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Render --

#[derive(Debug, Parser)]
pub struct RenderArgs {
    /// The query shown in the header
    pub query: String,

    /// JSON file with a document array or a select response
    pub results: PathBuf,

    /// Template file (defaults to the data directory, then the builtin)
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Prefix the output with a query heading
    #[arg(long)]
    pub heading: bool,
}

// -- Download --

#[derive(Debug, Parser)]
pub struct DownloadArgs {
    /// URIs to fetch
    #[arg(required = true)]
    pub uris: Vec<String>,

    /// Destination directory (defaults to <data-dir>/data)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Download even if the file already exists
    #[arg(long)]
    pub force: bool,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
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
            "solr-ltr",
            &mut std::io::stdout(),
        );
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {s:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}
