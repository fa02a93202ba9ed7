use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use conceptgraph::{
    EngineConfig, FileBackend, GraphEngine, GraphInput, ManualScheduler, PersistenceStore,
    RenderLoop, SvgSurface,
};

/// Lay out and render concept graphs from the command line.
#[derive(Parser)]
#[command(name = "conceptgraph")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding saved layout state
    #[arg(short, long, global = true, default_value = ".conceptgraph")]
    store: PathBuf,

    /// Key namespace inside the store
    #[arg(long, global = true, default_value = "graph")]
    namespace: String,

    /// Engine configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// Options shared by the commands that settle a layout
#[derive(clap::Args, Debug)]
struct SettleArgs {
    /// Graph input file (JSON with `concepts` and `relationships`)
    #[arg(short, long)]
    input: PathBuf,

    /// Layout area width in pixels
    #[arg(long, default_value = "800")]
    width: f32,

    /// Layout area height in pixels
    #[arg(long, default_value = "600")]
    height: f32,

    /// Override the number of settling frames
    #[arg(long)]
    frames: Option<u32>,

    /// Seed for the initial placement jitter
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Settle a graph and save node positions
    Layout {
        #[command(flatten)]
        settle: SettleArgs,
    },
    /// Settle a graph and write it as SVG
    Render {
        #[command(flatten)]
        settle: SettleArgs,

        /// Output SVG file
        #[arg(short, long, default_value = "graph.svg")]
        output: PathBuf,

        /// Frame the whole graph before drawing
        #[arg(long)]
        fit: bool,
    },
    /// Print the saved position map as JSON
    Positions,
    /// Pin a saved node in place
    Pin {
        /// Concept ID
        #[arg(long)]
        node: String,
    },
    /// Release a pinned node
    Unpin {
        /// Concept ID
        #[arg(long)]
        node: String,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn load_input(path: &Path) -> anyhow::Result<GraphInput> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph input {}", path.display()))?;
    GraphInput::from_json(&json)
        .with_context(|| format!("invalid graph input in {}", path.display()))
}

fn open_store(cli: &Cli) -> PersistenceStore {
    PersistenceStore::new(
        Box::new(FileBackend::new(cli.store.clone())),
        cli.namespace.clone(),
    )
}

/// Run the render loop headlessly until the layout settles
fn settle(cli: &Cli, args: &SettleArgs) -> anyhow::Result<(GraphEngine, SvgSurface)> {
    if !(args.width > 0.0 && args.height > 0.0) {
        bail!("layout area must have a positive size");
    }
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(frames) = args.frames {
        config.render_loop.settle_frames = frames;
    }
    let input = load_input(&args.input)?;
    let loop_config = config.render_loop.clone();

    let store = open_store(cli);
    let mut engine = match args.seed {
        Some(seed) => GraphEngine::with_seed(config, store, seed),
        None => GraphEngine::new(config, store),
    };
    engine.set_graph(input);

    let mut surface = SvgSurface::new(args.width, args.height);
    let max_ticks = loop_config.settle_frames as usize + 2;
    let mut render_loop = RenderLoop::new(ManualScheduler::default(), loop_config);
    render_loop.start();
    let settled = render_loop.run_until_settled(&mut engine, &mut surface, max_ticks);
    render_loop.stop();

    info!(
        nodes = engine.nodes().len(),
        edges = engine.edges().len(),
        frames = render_loop.frames(),
        settled,
        "layout finished"
    );
    if !engine.save_layout() {
        bail!("failed to save positions to {}", cli.store.display());
    }
    engine.flush();
    Ok((engine, surface))
}

fn set_pinned(cli: &Cli, node: &str, pinned: bool) -> anyhow::Result<()> {
    let mut store = open_store(cli);
    let mut positions = store.load_positions().unwrap_or_default();
    let Some(position) = positions.get_mut(node) else {
        bail!("no saved position for node '{node}'");
    };
    position.pinned = pinned;
    if !store.save_positions(&positions) {
        bail!("failed to save positions to {}", cli.store.display());
    }
    println!("{} '{node}'", if pinned { "Pinned" } else { "Unpinned" });
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conceptgraph=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Layout { settle: args } => {
            let (engine, _) = settle(&cli, args)?;
            println!(
                "Laid out {} nodes, positions saved in {}",
                engine.nodes().len(),
                cli.store.display()
            );
        }
        Commands::Render {
            settle: args,
            output,
            fit,
        } => {
            let (mut engine, mut surface) = settle(&cli, args)?;
            if *fit {
                engine.fit_to_view();
            }
            engine.draw(&mut surface);
            fs::write(output, surface.finish())
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Rendered {} nodes to {}", engine.nodes().len(), output.display());
        }
        Commands::Positions => {
            let positions = open_store(&cli).load_positions().unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&positions)?);
        }
        Commands::Pin { node } => set_pinned(&cli, node, true)?,
        Commands::Unpin { node } => set_pinned(&cli, node, false)?,
    }

    Ok(())
}
