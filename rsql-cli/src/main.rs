use anyhow::{Context, Result};
use clap::{Parser as CliParser, Subcommand, ValueEnum};
use rsql_filter::{mongo, FilterConfig, FilterNode, Parser, Policy};
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

#[derive(CliParser)]
#[command(name = "rsql", version)]
#[command(about = "Compile RSQL filter queries into MongoDB query documents", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only allow filtering on this field (repeatable, overrides the config policy)
    #[arg(long, global = true, conflicts_with = "deny")]
    allow: Vec<String>,

    /// Disallow filtering on this field (repeatable, overrides the config policy)
    #[arg(long, global = true)]
    deny: Vec<String>,

    /// Maximum nesting depth of parenthesized groups
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print the filter tree
    Parse {
        /// RSQL query, or "-" to read it from stdin
        query: String,

        /// Output format of the tree
        #[arg(long, value_enum, default_value_t = Format::Debug)]
        format: Format,
    },
    /// Parse a query and print the MongoDB filter document
    Render {
        /// RSQL query, or "-" to read it from stdin
        query: String,

        /// Print the document on a single line
        #[arg(long, default_value = "false")]
        compact: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Debug,
    Json,
    Rsql,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let parser = build_parser(&cli)?;

    let output = match &cli.command {
        Commands::Parse { query, format } => {
            let query = read_query(query)?;
            let filter = parse_query(&parser, &query)?;
            format_tree(filter.as_ref(), *format)?
        }
        Commands::Render { query, compact } => {
            let query = read_query(query)?;
            let filter = parse_query(&parser, &query)?;
            format_document(filter.as_ref(), *compact)?
        }
    };

    println!("{}", output);
    Ok(())
}

/// Config file first, then command line overrides
fn build_parser(cli: &Cli) -> Result<Parser> {
    let config = match &cli.config {
        Some(path) => FilterConfig::load(path)?,
        None => FilterConfig::default(),
    };

    let mut parser_config = config.parser;
    if let Some(max_depth) = cli.max_depth {
        parser_config.max_depth = max_depth;
    }

    let policy = if !cli.allow.is_empty() {
        Some(Policy::whitelist(cli.allow.iter().cloned()))
    } else if !cli.deny.is_empty() {
        Some(Policy::blacklist(cli.deny.iter().cloned()))
    } else {
        config.policy()
    };

    debug!(
        max_depth = parser_config.max_depth,
        policy = ?policy.as_ref().map(|p| p.mode()),
        "Parser configured"
    );
    Ok(Parser::with_config(policy, parser_config))
}

fn read_query(query: &str) -> Result<String> {
    if query != "-" {
        return Ok(query.to_string());
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read query from stdin")?;
    Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
}

fn parse_query(parser: &Parser, query: &str) -> Result<Option<FilterNode>> {
    parser
        .parse(query)
        .with_context(|| format!("Failed to parse query: {}", query))
}

fn format_tree(filter: Option<&FilterNode>, format: Format) -> Result<String> {
    Ok(match (format, filter) {
        (Format::Json, filter) => serde_json::to_string_pretty(&filter)?,
        (_, None) => "(no filter)".to_string(),
        (Format::Debug, Some(node)) => format!("{:#?}", node),
        (Format::Rsql, Some(node)) => node.to_string(),
    })
}

fn format_document(filter: Option<&FilterNode>, compact: bool) -> Result<String> {
    let document = mongo::render_filter(filter);
    Ok(if compact {
        serde_json::to_string(&document)?
    } else {
        serde_json::to_string_pretty(&document)?
    })
}
