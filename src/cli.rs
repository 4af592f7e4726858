use crate::config::load_config;
use crate::connections::EdgeConnections;
use crate::document::{GraphDocument, parse_document};
use crate::dump::write_graph_dump;
use crate::ir::{ElementId, Position};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "edgecx",
    version,
    about = "Resolve edge-to-edge connections in a graph document"
)]
pub struct Args {
    /// Input graph document (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the resolved graph. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (edgeSelector, proxyData)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Insert edges one at a time, dropping unresolvable ones, instead of as one batch
    #[arg(long = "single")]
    pub single: bool,

    /// Move a node after insertion, as ID=X,Y. Repeatable; applied in order.
    #[arg(short = 'm', long = "move", value_parser = parse_move)]
    pub moves: Vec<NodeMove>,

    /// Remove an element after the moves. Repeatable; applied in order.
    #[arg(short = 'r', long = "remove")]
    pub removals: Vec<String>,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeMove {
    pub id: ElementId,
    pub position: Position,
}

fn parse_move(raw: &str) -> Result<NodeMove, String> {
    let (id, coords) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=X,Y, got `{raw}`"))?;
    let (x, y) = coords
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y after `=`, got `{coords}`"))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|err| format!("bad coordinate `{value}`: {err}"))
    };
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing node id in `{raw}`"));
    }
    Ok(NodeMove {
        id: ElementId::from(id),
        position: Position::new(parse(x)?, parse(y)?),
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let document = parse_document(&input)?;
    let graph = resolve_document(&document, &config, &args)?;
    write_graph_dump(args.output.as_deref(), &graph)
}

fn resolve_document(
    document: &GraphDocument,
    config: &crate::config::Config,
    args: &Args,
) -> Result<crate::memory::MemoryGraph> {
    let graph = document.build_graph()?;
    let mut cx = EdgeConnections::new(graph, config)?;

    if args.single {
        let mut dropped = 0usize;
        for edge in document.edges.iter().cloned() {
            if cx.add_edge(edge)?.is_none() {
                dropped += 1;
            }
        }
        info!(
            added = document.edges.len() - dropped,
            dropped, "inserted edges one at a time"
        );
    } else {
        let report = cx.add_edges(document.edges.clone())?;
        info!(
            rounds = report.rounds,
            added = report.committed.len(),
            "inserted edge batch"
        );
    }

    for NodeMove { id, position } in &args.moves {
        cx.move_node(id, *position)
            .with_context(|| format!("failed to move `{id}`"))?;
    }
    for id in &args.removals {
        let id = ElementId::from(id.as_str());
        cx.remove(&id)
            .with_context(|| format!("failed to remove `{id}`"))?;
    }

    Ok(cx.detach())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
