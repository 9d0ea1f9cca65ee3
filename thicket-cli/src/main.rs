//! Thicket CLI
//!
//! Runs CSS selector queries against element trees described as JSON.
//!
//! Usage:
//!   thicket query <tree.json> <selector>    List matching elements
//!   thicket parse <selector>                Dump the parsed selector as JSON

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use thicket_dom::json::{NodeDescription, describe, from_json_str};
use thicket_dom::{DomTree, ElementData, NodeId};
use thicket_select::{
    CompileOptions, SelectMode, SelectorError, compile_with, parse_selector_list,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit status for selector text that does not compile.
const EXIT_SELECTOR_ERROR: u8 = 2;

/// Thicket: CSS selector queries over JSON element trees
#[derive(Parser, Debug)]
#[command(name = "thicket")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Every paragraph directly inside a div
    thicket query page.json 'div > p'

    # Only the first match, as JSON
    thicket query page.json '#main li:nth-child(odd)' --first --format json

    # Inspect how a selector parses
    thicket parse 'ul > li:not(.done)'

Set RUST_LOG=thicket_select=trace to log every traversal.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select elements from a JSON tree description
    Query(QueryArgs),

    /// Parse a selector and print its structure as JSON
    ///
    /// Names appear exactly as written; case folding happens at compile time.
    Parse {
        /// Selector text
        selector: String,
    },
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Path to the JSON tree description
    #[arg(value_name = "TREE")]
    tree: PathBuf,

    /// Selector text
    selector: String,

    /// Stop after the first match in document order
    #[arg(long)]
    first: bool,

    /// Compare type selectors and attribute names exactly
    #[arg(long)]
    case_sensitive_names: bool,

    /// Always walk the tree instead of seeding id selectors from an index
    #[arg(long)]
    no_id_index: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One start tag per line
    Text,
    /// Matched subtrees in the tree description format
    Json,
}

impl QueryArgs {
    fn options(&self) -> CompileOptions {
        CompileOptions {
            case_sensitive_names: self.case_sensitive_names,
            use_id_index: !self.no_id_index,
            ..CompileOptions::default()
        }
    }
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Query(args) => run_query(&args),
        Command::Parse { selector } => run_parse(&selector),
    }
}

/// Log to stderr, filtered by `RUST_LOG` and quiet by default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_query(args: &QueryArgs) -> Result<ExitCode> {
    let input = fs::read_to_string(&args.tree)
        .with_context(|| format!("failed to read {}", args.tree.display()))?;
    let mut tree = from_json_str(&input)
        .with_context(|| format!("failed to load tree from {}", args.tree.display()))?;

    let options = args.options();
    if options.use_id_index {
        tree.build_id_index();
    }

    let query = match compile_with(&args.selector, &options) {
        Ok(query) => query,
        Err(err) => {
            report_selector_error(&args.selector, &err);
            return Ok(ExitCode::from(EXIT_SELECTOR_ERROR));
        }
    };

    let mode = if args.first {
        SelectMode::First
    } else {
        SelectMode::All
    };
    let matches = query.select(&tree, &[NodeId::ROOT], mode);
    info!(
        selector = %args.selector,
        nodes = tree.len(),
        matches = matches.len(),
        "query finished"
    );

    match args.format {
        Format::Text => print_matches(&tree, &matches),
        Format::Json => {
            let described: Vec<NodeDescription> = matches
                .iter()
                .filter_map(|&node| describe(&tree, node))
                .collect();
            println!("{}", serde_json::to_string_pretty(&described)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_parse(selector: &str) -> Result<ExitCode> {
    match parse_selector_list(selector) {
        Ok(list) => {
            println!("{}", serde_json::to_string_pretty(&list)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report_selector_error(selector, &err);
            Ok(ExitCode::from(EXIT_SELECTOR_ERROR))
        }
    }
}

fn print_matches(tree: &DomTree, matches: &[NodeId]) {
    for &node in matches {
        if let Some(element) = tree.as_element(node) {
            println!("{:>6}  {}", node.0.dimmed(), start_tag(element));
        }
    }
    eprintln!(
        "{}",
        format!(
            "{} match{}",
            matches.len(),
            if matches.len() == 1 { "" } else { "es" }
        )
        .dimmed()
    );
}

/// `<tag name="value" ...>` with attributes sorted by name.
fn start_tag(element: &ElementData) -> String {
    let mut attrs: Vec<(&String, &String)> = element.attrs.iter().collect();
    attrs.sort();

    let mut tag = format!("<{}", element.tag_name.cyan());
    for (name, value) in attrs {
        tag.push_str(&format!(" {}=\"{}\"", name.yellow(), value.green()));
    }
    tag.push('>');
    tag
}

/// Print the error with a caret under the offending position.
fn report_selector_error(selector: &str, err: &SelectorError) {
    let label = if err.is_unsupported() {
        "unsupported:"
    } else {
        "error:"
    };
    eprintln!("{} {err}", label.red().bold());
    eprintln!("  {selector}");

    let column = selector
        .get(..err.position())
        .map_or(0, |prefix| prefix.chars().count());
    eprintln!("  {}{}", " ".repeat(column), "^".yellow().bold());
}
