use clap::{Args, Parser, Subcommand};

use crate::steam;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Scan(ScanArgs),
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Input list: one title per row, or a file previously produced by `scan`.
    #[arg(long)]
    pub input: String,

    /// Output CSV path (title, app id, TRUE/FALSE/blank).
    #[arg(long)]
    pub out: String,

    /// Search settings file (JSON with `key` and `cx`).
    #[arg(long)]
    pub config: Option<String>,

    /// Local app catalog cache file.
    #[arg(long, default_value = "applist.json")]
    pub cache: String,

    /// Re-download the app catalog even if the cache file exists.
    #[arg(long)]
    pub refresh_catalog: bool,

    /// Never contact the search provider; resolve ids only via the catalog.
    #[arg(long)]
    pub offline: bool,

    /// Continue without catalog-assisted resolution when the catalog
    /// cannot be fetched or parsed.
    #[arg(long)]
    pub allow_missing_catalog: bool,

    /// Mirror each produced row to stdout.
    #[arg(long)]
    pub echo: bool,

    /// Overwrite the output file if it already exists.
    #[arg(long)]
    pub force: bool,

    /// Insert the long rest after this many network-touching iterations.
    #[arg(long, default_value_t = 50)]
    pub rest_every: u32,

    /// Pause after each network-touching iteration.
    #[arg(long, default_value_t = 1500)]
    pub delay_ms: u64,

    /// Length of the periodic long rest.
    #[arg(long, default_value_t = 15_000)]
    pub rest_ms: u64,

    /// Timeout for one search request.
    #[arg(long, default_value_t = 10)]
    pub search_timeout_secs: u64,

    /// Timeout for one appdetails request.
    #[arg(long, default_value_t = 10)]
    pub details_timeout_secs: u64,

    /// Steam app list endpoint.
    #[arg(long, default_value = steam::DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Steam appdetails endpoint.
    #[arg(long, default_value = steam::DEFAULT_DETAILS_URL)]
    pub details_url: String,
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    Refresh(CatalogRefreshArgs),
}

#[derive(Debug, Args)]
pub struct CatalogRefreshArgs {
    /// Local app catalog cache file to overwrite.
    #[arg(long, default_value = "applist.json")]
    pub cache: String,

    /// Steam app list endpoint.
    #[arg(long, default_value = steam::DEFAULT_CATALOG_URL)]
    pub catalog_url: String,
}
