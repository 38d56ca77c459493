use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use scene_classify::data::loader;
use scene_classify::session::{preview_hash_color, ViewerSession};
use scene_classify::{load_config, ClassificationResult};

/// Classify scene nodes by filter and colour rules.
#[derive(Parser)]
#[command(name = "scene-classify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every node and print the decisions
    Classify {
        /// Scene file (.json or .csv)
        nodes: PathBuf,

        /// Classification config (JSON); without it every node passes unchanged
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only print nodes in this state
        #[arg(long, value_enum)]
        only: Option<StateFilter>,
    },

    /// Print the colour legend for a config
    Legend {
        /// Scene file (.json or .csv)
        nodes: PathBuf,

        /// Classification config (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// List the distinct values of a metadata property with their colours
    Values {
        /// Scene file (.json or .csv)
        nodes: PathBuf,

        /// Dotted property path, e.g. props.material.name
        property: String,
    },

    /// Show the hash-derived category colour for a value
    Hue {
        /// Value as it would be stringified from metadata
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum StateFilter {
    Visible,
    Ghosted,
    Hidden,
}

impl StateFilter {
    fn accepts(self, result: &ClassificationResult) -> bool {
        matches!(
            (self, result),
            (StateFilter::Visible, ClassificationResult::Visible(_))
                | (StateFilter::Ghosted, ClassificationResult::Ghosted(_))
                | (StateFilter::Hidden, ClassificationResult::Hidden)
        )
    }
}

fn load_session(nodes: &Path, config: Option<&Path>) -> Result<ViewerSession> {
    let nodes = loader::load_file(nodes)
        .with_context(|| format!("loading nodes from {}", nodes.display()))?;
    let config = config
        .map(load_config)
        .transpose()
        .context("loading config")?;

    let mut session = ViewerSession::new(nodes);
    session.set_config(config);
    Ok(session)
}

fn describe(result: &ClassificationResult) -> String {
    match result {
        ClassificationResult::Hidden => "hidden".to_string(),
        ClassificationResult::Ghosted(hint) => format!("ghosted  opacity={}", hint.opacity),
        ClassificationResult::Visible(None) => "visible".to_string(),
        ClassificationResult::Visible(Some(shade)) if shade.is_undetermined() => {
            "visible  undetermined".to_string()
        }
        ClassificationResult::Visible(Some(shade)) => format!("visible  {}", shade.color),
    }
}

fn run_classify(
    nodes: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
    only: Option<StateFilter>,
) -> Result<()> {
    let session = load_session(&nodes, config.as_deref())?;
    let rows = session
        .nodes()
        .iter()
        .zip(session.results())
        .filter(|(_, r)| only.map_or(true, |f| f.accepts(r)));

    match format {
        OutputFormat::Text => {
            let width = session.nodes().iter().map(|n| n.id.len()).max().unwrap_or(0);
            for (node, result) in rows {
                println!("{:<width$}  {:<7}  {}", node.id, node.kind.to_string(), describe(result));
            }
            let s = session.summary();
            println!(
                "\n{} nodes: {} visible ({} coloured, {} undetermined), {} ghosted, {} hidden",
                s.total, s.visible, s.colored, s.undetermined, s.ghosted, s.hidden
            );
        }
        OutputFormat::Json => {
            let results: Vec<_> = rows
                .map(|(node, result)| json!({ "id": node.id, "kind": node.kind, "result": result }))
                .collect();
            let out = json!({ "results": results, "summary": session.summary() });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

fn run_legend(nodes: PathBuf, config: PathBuf) -> Result<()> {
    let session = load_session(&nodes, Some(config.as_path()))?;
    let entries = session.legend_entries();
    if entries.is_empty() {
        println!("No colour rule in {}", config.display());
    }
    for (label, color) in entries {
        println!("{color}  {label}");
    }
    Ok(())
}

fn run_values(nodes: PathBuf, property: &str) -> Result<()> {
    let session = load_session(&nodes, None)?;
    let values = session.unique_values(property);
    if values.is_empty() {
        println!("No node has {property}");
    }
    for value in values {
        let (hue, color) = preview_hash_color(&value.to_string());
        println!("{color}  hue {hue:>3}  {value}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Classify {
            nodes,
            config,
            format,
            only,
        } => run_classify(nodes, config, format, only),
        Commands::Legend { nodes, config } => run_legend(nodes, config),
        Commands::Values { nodes, property } => run_values(nodes, &property),
        Commands::Hue { value } => {
            let (hue, color) = preview_hash_color(&value);
            println!("{value}: hue {hue} → {color}");
            Ok(())
        }
    }
}
