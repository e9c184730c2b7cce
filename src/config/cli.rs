use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Scrivo binary.
#[derive(Debug, Parser)]
#[command(
    name = "scrivo",
    version,
    about = "Content cache and front-matter console for static sites"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SCRIVO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the site checkout used as content provider.
    #[arg(
        long = "site-root",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub site_root: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Parse a document's front matter and print it as JSON.
    Parse(ParseArgs),
    /// Generate an abbrlink identifier.
    Abbrlink(AbbrlinkArgs),
    /// Inspect and maintain content caches.
    Cache(CacheArgs),
    /// Maintain the post index.
    Index(IndexArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ParseArgs {
    /// Document to parse.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Escape the body for embedding in a script literal.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub safe: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct AbbrlinkArgs {
    /// Timestamp string to hash; defaults to the current time.
    #[arg(long, value_name = "SECONDS")]
    pub timestamp: Option<String>,

    /// Override the checksum algorithm (crc16|crc32).
    #[arg(long = "algorithm", value_name = "NAME")]
    pub algorithm: Option<String>,

    /// Override the output representation (dec|hex).
    #[arg(long = "representation", value_name = "NAME")]
    pub representation: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CacheCommand {
    /// List a collection through the cache.
    List {
        /// Collection name (posts|pages|configs).
        #[arg(value_name = "COLLECTION")]
        collection: String,

        /// Only list items whose name contains this term.
        #[arg(long, value_name = "TERM")]
        search: Option<String>,
    },
    /// Delete every cache entry except the update marker.
    Purge,
    /// Delete a single cache entry.
    Delete {
        #[arg(value_name = "NAME")]
        name: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub command: IndexCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum IndexCommand {
    /// Parse a document and record it in the post index.
    Mark {
        #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Index key; defaults to the file path as given.
        #[arg(long, value_name = "PATH")]
        path: Option<String>,

        /// Publication status (draft|published or 0|1).
        #[arg(long, value_name = "STATUS", default_value = "published")]
        status: String,

        /// Stored file name; defaults to the file's name.
        #[arg(long, value_name = "NAME")]
        filename: Option<String>,
    },
    /// Remove one document from the index.
    Remove {
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// Remove every row from the index.
    Clear,
}
