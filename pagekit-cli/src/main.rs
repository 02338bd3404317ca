//! PageKit CLI
//!
//! Runs the DOM helpers against a document from the command line, for
//! checking selectors and markup without a browser.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use pagekit_dom::{DomTree, NodeId};
use pagekit_html::{dump_tree, parse_document};
use pagekit_selector::{SelectorList, query_selector, query_selector_all};
use pagekit_util::{HostConfig, Window, closest, create, is_framework_element};
use tracing_subscriber::EnvFilter;

/// PageKit: inspect documents with the DOM helpers
#[derive(Parser, Debug)]
#[command(name = "pagekit")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the DOM tree of a file
    pagekit -f ./index.html tree

    # List elements matching a selector
    pagekit --html '<mip-img></mip-img><img>' match 'mip-img, img'

    # Find the nearest .card around the first span
    pagekit -f ./index.html closest span .card

    # Parse a fragment the way create() does
    pagekit create '<p>a</p><p>b</p>'

    # Emulate a host without native lookups, with debug logging
    pagekit -v --config legacy.json -f ./index.html match 'ul > li'
"#)]
struct Cli {
    /// HTML file to load
    #[arg(short, long, value_name = "FILE", conflicts_with = "html")]
    file: Option<PathBuf>,

    /// Parse this HTML string instead of a file
    #[arg(long, value_name = "HTML")]
    html: Option<String>,

    /// JSON host configuration (capabilities, poll interval)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log helper and wait lifecycle events to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the document as an indented tree
    Tree,
    /// List every element matching SELECTOR
    Match {
        /// Selector list to match
        selector: String,
    },
    /// From the first element matching FROM, find the closest ancestor-or-self matching SELECTOR
    Closest {
        /// Selector of the starting element
        from: String,
        /// Selector to look for
        selector: String,
    },
    /// Parse MARKUP into detached elements and print them
    Create {
        /// HTML fragment
        markup: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let config = load_config(cli.config.as_deref())?;
    let mut window = Window::with_document(parse_document(&load_html(&cli)?), &config);

    match &cli.command {
        Command::Tree => {
            println!("{} {}", "readyState:".dimmed(), window.document().ready_state());
            print!("{}", dump_tree(window.document(), NodeId::ROOT));
        }
        Command::Match { selector } => {
            let list = parse_selector(selector)?;
            let found = query_selector_all(window.document(), NodeId::ROOT, &list);
            println!("{} matching element(s)", found.len().bold());
            for node in found {
                println!("  {}", describe(&window, node));
            }
        }
        Command::Closest { from, selector } => {
            let start_list = parse_selector(from)?;
            let list = parse_selector(selector)?;
            let Some(start) = query_selector(window.document(), NodeId::ROOT, &start_list) else {
                bail!("no element matches {from:?}");
            };
            println!("{} {}", "from:".dimmed(), describe(&window, start));
            match closest(&window, start, &list) {
                Some(found) => println!("{} {}", "closest:".dimmed(), describe(&window, found)),
                None => println!("{}", "no matching ancestor".yellow()),
            }
        }
        Command::Create { markup } => match create(&mut window, markup) {
            Some(created) => {
                for node in created.into_vec() {
                    print!("{}", dump_tree(window.document(), node));
                }
            }
            None => println!("{}", "markup has no top-level element".yellow()),
        },
    }

    Ok(())
}

fn load_html(cli: &Cli) -> Result<String> {
    if let Some(html) = &cli.html {
        return Ok(html.clone());
    }
    match &cli.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => Ok(String::new()),
    }
}

fn load_config(path: Option<&Path>) -> Result<HostConfig> {
    let Some(path) = path else {
        return Ok(HostConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    HostConfig::from_json(&json).with_context(|| format!("in {}", path.display()))
}

fn parse_selector(selector: &str) -> Result<SelectorList> {
    SelectorList::parse(selector).with_context(|| format!("invalid selector {selector:?}"))
}

/// `tag#id.class` summary of an element, framework elements in green.
fn describe(window: &Window, node: NodeId) -> String {
    let tree: &DomTree = window.document();
    let Some(element) = tree.as_element(node) else {
        return format!("{node:?}");
    };
    let mut label = element.tag_name.clone();
    if let Some(id) = element.id() {
        label.push('#');
        label.push_str(id);
    }
    let mut classes: Vec<&str> = element.classes().into_iter().collect();
    classes.sort_unstable();
    for class in classes {
        label.push('.');
        label.push_str(class);
    }
    if is_framework_element(window, node) {
        label.green().to_string()
    } else {
        label
    }
}
