/// CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Build timestamp injected at compile time
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser, Debug)]
#[command(name = "catalog-admin")]
#[command(author, version = VERSION_WITH_BUILD, about = "Browse and edit catalog collections over a REST API", long_about = None)]
pub struct Cli {
    /// Config file (default: <config_dir>/catalog-admin/config.toml)
    #[arg(long, global = true, env = "CATALOG_ADMIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// API base URL, overrides api.base_url
    #[arg(long, global = true, env = "CATALOG_ADMIN_API")]
    pub api: Option<String>,

    /// Records per page, overrides api.page_size
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured resources
    Resources,

    /// Print one page of a resource
    List {
        /// Resource name (see `resources`)
        resource: String,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Print raw records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a record from key=value pairs
    Create {
        resource: String,

        /// Field values, e.g. code=x86_64
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Delete a record by id
    Delete {
        resource: String,
        id: String,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init,
}
