//! Trellis CLI - diagram graphs from a code model snapshot.
//!
//! Usage:
//!   trellis call --model m.json --root a.B#run          # Call diagram
//!   trellis call --model m.json --root a.B --all        # One per public method
//!   trellis structure --model m.json --root a.B         # Structure diagram
//!   trellis flow --model m.json --root a.B --all        # One per Terminal method
//!   trellis preset call                                 # Print a preset
//!   trellis stats --model m.json                        # Model statistics

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use trellis::config::{metadata_block, parse_configuration, to_commented_json, DiagramConfig, Preset};
use trellis::{
    generate, generate_call_diagrams, generate_flow_diagrams, CallConfiguration,
    CancellationToken, CompiledClassification, DiagramConfiguration, DiagramGraph, DiagramKind,
    DiagramRequest, FlowConfiguration, InMemoryCodeModel, ModelSnapshot, Settings,
    StructureConfiguration,
};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Trellis - call, structure and flow diagram graphs", long_about = None)]
struct Cli {
    /// Settings file (default: ./trellis.toml or ./.trellis.toml)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Log at debug level regardless of settings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a call diagram
    Call(DiagramArgs),

    /// Generate a structure diagram
    Structure(DiagramArgs),

    /// Generate a flow diagram
    Flow(DiagramArgs),

    /// Print a preset configuration as commented JSON
    Preset {
        /// Preset name or diagram kind: call, structure, flow
        name: String,

        /// Wrap the configuration in a diagram metadata block
        #[arg(long)]
        metadata: bool,
    },

    /// Show statistics of a model snapshot
    Stats {
        /// Model snapshot (JSON)
        #[arg(short, long)]
        model: PathBuf,
    },
}

#[derive(Args)]
struct DiagramArgs {
    /// Model snapshot (JSON)
    #[arg(short, long)]
    model: PathBuf,

    /// Root: Class, Class#method or Class#method(Type,...)
    #[arg(short, long)]
    root: String,

    /// Configuration (commented JSON, or a diagram carrying a metadata block)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file or directory (with --all). Prints to stdout when unset.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// One diagram per public method (call) or Terminal method (flow)
    #[arg(long)]
    all: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load_or_default(cli.settings.as_deref())
        .context("failed to load settings")?;
    init_tracing(&settings, cli.verbose);

    let mut warnings = Vec::new();
    let classification = settings.classification.compile(&mut warnings);
    for warning in &warnings {
        warn!(%warning, "classification");
    }

    match cli.command {
        Commands::Call(args) => diagram(DiagramKind::Call, &args, &settings, &classification),
        Commands::Structure(args) => {
            diagram(DiagramKind::Structure, &args, &settings, &classification)
        }
        Commands::Flow(args) => diagram(DiagramKind::Flow, &args, &settings, &classification),
        Commands::Preset { name, metadata } => {
            let preset: Preset = name.parse()?;
            println!("{}", render_preset(preset, metadata)?);
            Ok(())
        }
        Commands::Stats { model } => {
            let model = load_model(&model)?;
            let stats = model.stats();
            println!("Trellis - Model Statistics");
            println!("══════════════════════════");
            println!();
            println!("Classes:    {}", stats.class_count);
            println!("Methods:    {}", stats.method_count);
            println!("Fields:     {}", stats.field_count);
            println!("Calls:      {}", stats.call_count);
            println!("Unresolved: {}", stats.unresolved_call_count);
            Ok(())
        }
    }
}

fn init_tracing(settings: &Settings, verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        settings.logging.level.clone()
    };
    // Diagrams go to stdout, logs to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

// ─── Diagrams ───────────────────────────────────────────────────

fn diagram(
    kind: DiagramKind,
    args: &DiagramArgs,
    settings: &Settings,
    classification: &CompiledClassification,
) -> Result<()> {
    let model = load_model(&args.model)?;
    let configuration = load_configuration(kind, args.config.as_deref())?;
    let cancel = CancellationToken::new();
    let limits = &settings.limits;

    if args.all {
        let graphs = match &configuration {
            DiagramConfiguration::Call(config) => {
                generate_call_diagrams(&model, classification, &args.root, config, limits, &cancel)?
            }
            DiagramConfiguration::Flow(config) => {
                generate_flow_diagrams(&model, classification, &args.root, config, limits, &cancel)?
            }
            DiagramConfiguration::Structure(_) => {
                bail!("--all is only supported for call and flow diagrams")
            }
        };
        return write_batch(&graphs, args.out.as_deref());
    }

    let request = DiagramRequest::new(args.root.clone(), configuration);
    let graph = generate(&model, classification, &request, limits, &cancel)?;
    for warning in &graph.warnings {
        warn!(%warning, "diagram");
    }
    write_graph(&graph, args.out.as_deref())
}

fn load_model(path: &Path) -> Result<InMemoryCodeModel> {
    let snapshot = ModelSnapshot::load(path)
        .with_context(|| format!("failed to load model {}", path.display()))?;
    let model = InMemoryCodeModel::from_snapshot(&snapshot);
    info!(path = %path.display(), stats = %model.stats(), "model loaded");
    Ok(model)
}

fn load_configuration(kind: DiagramKind, path: Option<&Path>) -> Result<DiagramConfiguration> {
    let Some(path) = path else {
        return Ok(DiagramConfiguration::preset(kind));
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let (configuration, warnings) = parse_configuration(kind, &text)
        .with_context(|| format!("invalid configuration {}", path.display()))?;
    for warning in &warnings {
        warn!(%warning, "configuration");
    }
    Ok(configuration)
}

fn render_preset(preset: Preset, metadata: bool) -> Result<String> {
    let text = match (preset.kind(), metadata) {
        (DiagramKind::Call, false) => to_commented_json(&CallConfiguration::preset())?,
        (DiagramKind::Call, true) => metadata_block(&CallConfiguration::preset())?,
        (DiagramKind::Structure, false) => {
            to_commented_json(&StructureConfiguration::preset())?
        }
        (DiagramKind::Structure, true) => metadata_block(&StructureConfiguration::preset())?,
        (DiagramKind::Flow, false) => to_commented_json(&FlowConfiguration::preset())?,
        (DiagramKind::Flow, true) => metadata_block(&FlowConfiguration::preset())?,
    };
    Ok(text)
}

// ─── Output ─────────────────────────────────────────────────────

fn write_graph(graph: &DiagramGraph, out: Option<&Path>) -> Result<()> {
    let json = graph.to_json()?;
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), graph = %graph, "diagram written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn write_batch(graphs: &[DiagramGraph], out: Option<&Path>) -> Result<()> {
    let Some(dir) = out else {
        let json = serde_json::to_string_pretty(graphs)?;
        println!("{}", json);
        return Ok(());
    };
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    for graph in graphs {
        write_graph(graph, Some(&dir.join(format!("{}.json", graph.name))))?;
    }
    Ok(())
}
