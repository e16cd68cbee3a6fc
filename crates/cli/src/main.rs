// gridext CLI - headless grid extensions
// Imports remote data into workbook files, manages templates, and runs the
// auto-expansion controller against an in-memory host.

mod book;
mod data;
mod exit_codes;
mod templates;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gridext_config::{ConfigStore, PluginConfig};
use gridext_engine::{FlowError, InsertMode, TemplateError};
use gridext_gateway::{GatewayError, RemoteGateway};

use exit_codes::{
    flow_exit_code, gateway_exit_code, template_exit_code, EXIT_BOOK_IO, EXIT_BOOK_PARSE,
    EXIT_CONFIG_INVALID, EXIT_NOT_CONFIGURED, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "gridext")]
#[command(about = "Grid extensions: remote data import, templates, auto-expansion")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/gridext/config.json)
    #[arg(long, global = true, env = "GRIDEXT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the API base URL from the config file
    #[arg(long, global = true, env = "GRIDEXT_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List dropdown sources
    #[command(after_help = "\
Examples:
  gridext sources
  gridext sources --remote --json")]
    Sources {
        /// Ask the server which sources it offers instead of reading config
        #[arg(long)]
        remote: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch the items of a dropdown source and print them as JSON
    #[command(after_help = "\
Examples:
  gridext fetch products
  gridext fetch employees --search eng --field department")]
    Fetch {
        /// Source id from the config
        source: String,

        /// Server-side search query
        #[arg(long)]
        search: Option<String>,

        /// Field to search in (with --search)
        #[arg(long, requires = "search")]
        field: Option<String>,
    },

    /// Insert a dropdown source into a workbook file
    #[command(after_help = "\
Examples:
  gridext import products --book sales.json
  gridext import employees --book hr.json --fields name,email --mode column --at C5")]
    Import {
        /// Source id from the config
        source: String,

        /// Workbook snapshot file (created if missing)
        #[arg(long)]
        book: PathBuf,

        /// Comma-separated fields, in output order (default: all fields of the first item)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Layout: row (header row, one row per item) or column
        #[arg(long, default_value = "row")]
        mode: InsertMode,

        /// Anchor cell (default: the book's current selection)
        #[arg(long)]
        at: Option<String>,

        /// Print the grid without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Move the selection in a workbook file, growing the sheet near its edge
    #[command(after_help = "\
Examples:
  gridext select A998 --book sales.json")]
    Select {
        /// Cell or range (A1 notation)
        range: String,

        /// Workbook snapshot file
        #[arg(long)]
        book: PathBuf,
    },

    /// Template service operations
    Templates {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Check that the API server is reachable
    Health,
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List templates
    List {
        #[arg(long)]
        category: Option<String>,

        /// Text filter on name and category
        #[arg(long, short = 'q')]
        query: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Print one template as JSON
    Show { id: String },

    /// Replace a workbook file with a template from the service
    Load {
        id: String,

        #[arg(long)]
        book: PathBuf,
    },

    /// Replace a workbook file with a local template JSON file
    LoadFile {
        file: PathBuf,

        #[arg(long)]
        book: PathBuf,
    },

    /// Save a workbook file as a new template
    Save {
        #[arg(long)]
        book: PathBuf,

        #[arg(long)]
        name: String,

        #[arg(long)]
        category: Option<String>,
    },

    /// Delete a template
    Delete { id: String },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  gridext-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
        "\nprofile: ", env!("BUILD_PROFILE"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref(), cli.api_url.as_deref()).and_then(|store| {
        let config = store.current();
        match cli.command {
            Commands::Sources { remote, json } => data::cmd_sources(&config, remote, json),
            Commands::Fetch { source, search, field } => data::cmd_fetch(&config, &source, search, field),
            Commands::Import { source, book, fields, mode, at, dry_run } => {
                data::cmd_import(&config, &source, &book, &fields, mode, at.as_deref(), dry_run)
            }
            Commands::Select { range, book } => data::cmd_select(&config, &range, &book),
            Commands::Templates { command } => match command {
                TemplateCommands::List { category, query, json } => {
                    templates::cmd_list(&config, category, query, json)
                }
                TemplateCommands::Show { id } => templates::cmd_show(&config, &id),
                TemplateCommands::Load { id, book } => templates::cmd_load(&config, &id, &book),
                TemplateCommands::LoadFile { file, book } => templates::cmd_load_file(&config, &file, &book),
                TemplateCommands::Save { book, name, category } => {
                    templates::cmd_save(&config, &book, &name, category.as_deref())
                }
                TemplateCommands::Delete { id } => templates::cmd_delete(&config, &id),
            },
            Commands::Health => data::cmd_health(&config),
        }
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn load_config(path: Option<&std::path::Path>, api_url: Option<&str>) -> Result<ConfigStore, CliError> {
    let mut config = match path {
        Some(path) => PluginConfig::load_from(path).map_err(|e| {
            CliError::new(EXIT_CONFIG_INVALID, e.to_string())
        })?,
        None => PluginConfig::load(),
    };
    if let Some(url) = api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    ConfigStore::new(config).map_err(|e| CliError::new(EXIT_CONFIG_INVALID, e.to_string()))
}

pub(crate) fn gateway(config: &Arc<PluginConfig>) -> Result<RemoteGateway, CliError> {
    RemoteGateway::new(Arc::clone(config)).map_err(CliError::from)
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_BOOK_IO, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(EXIT_BOOK_PARSE, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn config_hint(code: u8) -> Option<String> {
    (code == EXIT_NOT_CONFIGURED)
        .then(|| format!("add the endpoint to {}", PluginConfig::config_path_display()))
}

impl From<GatewayError> for CliError {
    fn from(err: GatewayError) -> Self {
        let code = gateway_exit_code(&err);
        Self { code, message: err.to_string(), hint: config_hint(code) }
    }
}

impl From<TemplateError> for CliError {
    fn from(err: TemplateError) -> Self {
        let code = template_exit_code(&err);
        Self { code, message: err.to_string(), hint: config_hint(code) }
    }
}

impl From<FlowError> for CliError {
    fn from(err: FlowError) -> Self {
        Self::new(flow_exit_code(&err), err.to_string())
    }
}
