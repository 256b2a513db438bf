use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inview_api::{CatalogSource, InviewClient};
use inview_types::{HostQuery, LookupQuery};
use inview_util::config::{EditorConfig, load_config, load_config_from_path};
use inview_util::{expand_tilde, inview_config_dir};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Environment variable relocating the editor's log file.
const LOG_PATH_ENV: &str = "INVIEW_LOG_PATH";
const LOG_FILE_NAME: &str = "inview.log";

#[derive(Parser, Debug)]
#[command(name = "inview", version, about = "Build InView variable queries from the terminal")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base URL of the InView resource API. Overrides the config file and INVIEW_API_BASE.
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive query editor (default).
    Edit(EditArgs),
    /// List connections.
    Connections(LookupArgs),
    /// List variables, optionally scoped to one connection.
    Variables {
        /// Only variables belonging to this connection id.
        #[arg(long, value_name = "ID")]
        connection: Option<i64>,
        #[command(flatten)]
        lookup: LookupArgs,
    },
}

#[derive(Args, Debug, Default)]
struct EditArgs {
    /// Start from a previously saved query object.
    #[arg(long, value_name = "FILE")]
    query: Option<PathBuf>,
    /// Write the final query object here instead of stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Case-insensitive text filter.
    #[arg(long, default_value = "")]
    search: String,
    /// Zero-based page index.
    #[arg(long, default_value_t = 0)]
    page: u32,
    /// Items per page; defaults to `lookupPageSize` from the config.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    page_size: Option<u32>,
    /// Return every match without paging.
    #[arg(long)]
    all: bool,
}

impl LookupArgs {
    fn to_query(&self, connection_id: Option<i64>, config: &EditorConfig) -> LookupQuery {
        LookupQuery {
            connection_id,
            skip_connection_filter: connection_id.is_none(),
            search_text: self.search.clone(),
            page_index: self.page,
            page_size: self.page_size.unwrap_or(config.lookup_page_size),
            skip_pagination: self.all,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Edit(EditArgs::default()));
    init_tracing(matches!(command, Command::Edit(_)))?;

    let config = resolve_config(cli.config.as_deref(), cli.base_url)?;
    let client = InviewClient::new_from_config(&config).context("configure InView client")?;

    match command {
        Command::Edit(args) => run_editor(config, client, args).await,
        Command::Connections(lookup) => {
            let query = LookupQuery {
                skip_connection_filter: lookup.search.is_empty(),
                ..lookup.to_query(None, &config)
            };
            let items = client.connections(&query).await?;
            print_json(&items)
        }
        Command::Variables { connection, lookup } => {
            let items = client.variables(&lookup.to_query(connection, &config)).await?;
            print_json(&items)
        }
    }
}

/// Logs go to stderr for one-shot commands and to a file while the editor owns the terminal.
fn init_tracing(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if to_file {
        let path = log_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create log directory {}", parent.display()))?;
        }
        let file = File::options()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log file {}", path.display()))?;
        let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
    } else {
        let _ = builder.with_writer(std::io::stderr).try_init();
    }
    Ok(())
}

fn log_path() -> PathBuf {
    match std::env::var(LOG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => expand_tilde(&path),
        _ => inview_config_dir().join(LOG_FILE_NAME),
    }
}

fn resolve_config(path: Option<&Path>, base_url: Option<String>) -> Result<EditorConfig> {
    let mut config = match path {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    }
    .context("load configuration")?;
    if let Some(base_url) = base_url {
        config.base_url = Some(base_url);
        config.validate().context("--base-url")?;
    }
    debug!(base_url = ?config.base_url, debounce_ms = config.debounce_ms, "configuration loaded");
    Ok(config)
}

async fn run_editor(config: EditorConfig, client: InviewClient, args: EditArgs) -> Result<()> {
    let initial = match &args.query {
        Some(path) => {
            let content = fs::read_to_string(path).with_context(|| format!("read query file {}", path.display()))?;
            let query: HostQuery =
                serde_json::from_str(&content).with_context(|| format!("parse query file {}", path.display()))?;
            Some(query)
        }
        None => None,
    };
    let endpoint = client.base_url().to_string();
    let source: Arc<dyn CatalogSource> = Arc::new(client);
    let query = inview_tui::run(config, source, initial, endpoint).await?;

    let rendered = serde_json::to_string_pretty(&query)?;
    match &args.output {
        Some(path) => {
            fs::write(path, format!("{rendered}\n")).with_context(|| format!("write query file {}", path.display()))?;
            info!(path = %path.display(), "query written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
