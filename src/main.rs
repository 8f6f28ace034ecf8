use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tgmd::Config;
use tracing_subscriber::EnvFilter;

/// Config file picked up from the working directory when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "tgmd.toml";

#[derive(Parser)]
#[command(name = "tgmd")]
#[command(about = "Convert Markdown to Telegram MarkdownV2")]
struct Cli {
    /// Input Markdown file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Output file (writes to stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log conversion details to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Print the parsed document tree instead of rendering it
    #[arg(long)]
    tree: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE))
            .with_context(|| format!("Failed to load config {DEFAULT_CONFIG_FILE}"))?,
    };

    let markdown = read_input(cli.input.as_deref())?;

    let mut rendered = if cli.tree {
        format!("{:#?}", tgmd::parse_with_config(&markdown, &config.parser))
    } else {
        tgmd::markdown_to_telegram_with_config(&markdown, &config)
    };
    rendered.push('\n');

    match cli.output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Created {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut markdown = String::new();
            io::stdin()
                .read_to_string(&mut markdown)
                .context("Failed to read stdin")?;
            Ok(markdown)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "tgmd=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
