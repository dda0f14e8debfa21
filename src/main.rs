//! CLI entry point for phpsense.
//!
//! Indexes a PHP workspace and answers position queries against the
//! persisted index: definitions, completion, signature help, hover and
//! symbol listings.

use anyhow::{Context, Result, bail};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use phpsense::config::CONFIG_DIR;
use phpsense::indexing::{FileWalker, path_to_uri, uri_to_path};
use phpsense::{IndexError, Settings, SourceDocument, Symbol, Workspace, logging};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// PHP source intelligence
#[derive(Parser)]
#[command(
    name = "phpsense",
    version = env!("CARGO_PKG_VERSION"),
    about = "PHP source intelligence",
    long_about = "Index PHP code and query definitions, completions and signatures.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Examples:\n  phpsense init\n  phpsense index .\n  phpsense definition src/App.php 12:8\n  phpsense complete src/App.php 12:14 --json\n  phpsense search user"
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true, env = "PHPSENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .phpsense directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    #[command(about = "Display active settings")]
    Config,

    /// Index PHP files under a directory
    #[command(about = "Build or refresh the index of a workspace")]
    Index {
        /// Directory to index
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Files parsed at once (overrides config)
        #[arg(short, long)]
        threads: Option<usize>,

        /// List the files that would be indexed
        #[arg(long)]
        dry_run: bool,
    },

    #[command(about = "Find the declarations referenced at a position")]
    Definition {
        file: PathBuf,
        /// Byte offset or zero-based LINE:CHARACTER
        at: String,
    },

    #[command(about = "Complete the name at a position")]
    Complete { file: PathBuf, at: String },

    #[command(about = "Show parameter help for the call at a position")]
    Signature { file: PathBuf, at: String },

    #[command(about = "Describe the symbol at a position")]
    Hover { file: PathBuf, at: String },

    #[command(about = "List the declarations of a file")]
    Symbols { file: PathBuf },

    #[command(about = "Search top-level declarations by word prefix")]
    Search { query: String },
}

#[derive(Serialize)]
struct SymbolLine<'a> {
    kind: String,
    name: &'a str,
    label: String,
    uri: Option<&'a str>,
    /// One-based
    line: Option<u32>,
    offset: Option<u32>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.debug);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        if let Some(index_error) = e.downcast_ref::<IndexError>() {
            for suggestion in index_error.recovery_suggestions() {
                eprintln!("  hint: {suggestion}");
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { force } = cli.command {
        let root = std::env::current_dir()?;
        let path = Settings::init_config_file(&root, force)
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        println!("Created configuration file at: {}", path.display());
        println!("Edit this file to customize your settings.");
        return Ok(());
    }

    let mut settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } => {}
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&settings)?);
        }
        Commands::Index {
            path,
            threads,
            dry_run,
        } => {
            if let Some(threads) = threads {
                settings.indexing.max_concurrent_files = threads;
            }
            let root = path
                .canonicalize()
                .with_context(|| format!("cannot index '{}'", path.display()))?;

            if dry_run {
                let walker = FileWalker::new(Arc::new(settings));
                for file in walker.walk(&root) {
                    println!("{}", file.display());
                }
                return Ok(());
            }

            let workspace = Workspace::open(settings)?;
            let stats = workspace.index_workspace(&root).await?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "indexed": stats.files_indexed,
                        "unchanged": stats.files_unchanged,
                        "removed": stats.files_removed,
                        "failed": stats.files_failed,
                        "symbols": stats.symbols_found,
                        "errors": stats.errors,
                    })
                );
            } else {
                stats.display();
            }
        }
        Commands::Definition { file, at } => {
            let (workspace, uri, offset) = open_at(settings, &file, &at).await?;
            print_symbols(&workspace.definition(&uri, offset).await?, cli.json)?;
        }
        Commands::Complete { file, at } => {
            let (workspace, uri, offset) = open_at(settings, &file, &at).await?;
            print_symbols(&workspace.completion(&uri, offset).await?, cli.json)?;
        }
        Commands::Signature { file, at } => {
            let (workspace, uri, offset) = open_at(settings, &file, &at).await?;
            let help = workspace.get_signature_help(&uri, offset).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&help)?);
            } else if let Some(help) = help {
                for (i, signature) in help.signatures.iter().enumerate() {
                    let marker = if i as u32 == help.active_signature { '>' } else { ' ' };
                    println!("{marker} {}", signature.label);
                    if let Some(parameter) = signature.parameters.get(help.active_parameter as usize) {
                        println!("    parameter: {parameter}");
                    }
                }
            } else {
                println!("No signature help at this position");
            }
        }
        Commands::Hover { file, at } => {
            let (workspace, uri, offset) = open_at(settings, &file, &at).await?;
            let hover = workspace.hover(&uri, offset).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&hover)?);
            } else {
                match hover {
                    Some(hover) => println!("{}", hover.contents),
                    None => println!("Nothing to describe at this position"),
                }
            }
        }
        Commands::Symbols { file } => {
            let workspace = Workspace::open(settings)?;
            workspace.index_path(&file).await?;
            let uri = path_to_uri(&file.canonicalize()?);
            print_symbols(&workspace.document_symbols(&uri).await?, cli.json)?;
        }
        Commands::Search { query } => {
            let workspace = Workspace::open(settings)?;
            print_symbols(&workspace.workspace_symbols(&query).await?, cli.json)?;
        }
    }
    Ok(())
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let settings = match config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("configuration error loading {}", path.display()))?,
        None => {
            if Settings::workspace_root().is_none() {
                tracing::warn!("no {CONFIG_DIR} directory found, using default configuration");
            }
            Settings::load().context("configuration error")?
        }
    };
    Ok(settings)
}

/// Opens the index, brings `file` up to date and resolves `at` to a byte
/// offset in it.
async fn open_at(settings: Settings, file: &Path, at: &str) -> Result<(Workspace, String, u32)> {
    let path = file
        .canonicalize()
        .with_context(|| format!("cannot open '{}'", file.display()))?;
    let text = tokio::fs::read_to_string(&path).await?;
    let uri = path_to_uri(&path);

    let workspace = Workspace::open(settings)?;
    workspace.index_path(&path).await?;

    let offset = match at.split_once(':') {
        Some((line, character)) => {
            let doc = SourceDocument::from_source(uri.clone(), text)?;
            doc.get_offset(line.trim().parse()?, character.trim().parse()?)
        }
        None => {
            let offset: u32 = at.trim().parse().with_context(|| format!("bad position '{at}'"))?;
            if offset as usize > text.len() {
                bail!("offset {offset} is past the end of '{}'", file.display());
            }
            offset
        }
    };
    Ok((workspace, uri, offset))
}

fn print_symbols(symbols: &[Symbol], json: bool) -> Result<()> {
    let mut files: HashMap<String, Option<String>> = HashMap::new();
    let lines: Vec<SymbolLine> = symbols
        .iter()
        .map(|symbol| {
            let location = symbol.location();
            let line = location.uri.as_deref().zip(location.range).and_then(|(uri, range)| {
                let text = files
                    .entry(uri.to_string())
                    .or_insert_with(|| uri_to_path(uri).and_then(|p| std::fs::read_to_string(p).ok()));
                let before = text.as_deref()?.get(..range.start as usize)?;
                Some(before.matches('\n').count() as u32 + 1)
            });
            SymbolLine {
                kind: format!("{:?}", symbol.kind()),
                name: symbol.name(),
                label: symbol.label(),
                uri: location.uri.as_deref(),
                line,
                offset: location.range.map(|r| r.start),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }
    if lines.is_empty() {
        println!("No symbols found");
    }
    for line in lines {
        match (line.uri, line.line, line.offset) {
            (Some(uri), Some(row), _) => println!("{}  {uri}:{row}", line.label),
            (Some(uri), None, Some(offset)) => println!("{}  {uri}@{offset}", line.label),
            _ => println!("{}", line.label),
        }
    }
    Ok(())
}
