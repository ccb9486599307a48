#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Plot Defence layouts headlessly.

mod plot_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use plot_defence_core::{BlockPosition, DeathCause, Event, SimulationConfig};
use plot_defence_session::{Session, Wallet};
use plot_defence_world::{
    query,
    registry::{self, TemplateRegistry},
    snapshot::{PlacedTower, PlotSnapshot},
    HeadlessWorld, Layout,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Block position the plot is built at inside the headless world.
const PLOT_ORIGIN: BlockPosition = BlockPosition::new(0, 64, 0);

#[derive(Parser)]
#[command(name = "plot-defence")]
#[command(about = "Headless driver for Plot Defence layouts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a plot from the registry and run it for a number of ticks
    Simulate {
        #[command(flatten)]
        plot: PlotArgs,
        #[command(flatten)]
        run: RunArgs,
        /// Print the plot transfer string after the run
        #[arg(long)]
        export: bool,
    },
    /// Load a registry and report every malformed template
    Validate {
        /// Registry document (TOML)
        #[arg(long)]
        registry: PathBuf,
    },
    /// Build a plot from the registry and print its transfer string
    Export {
        #[command(flatten)]
        plot: PlotArgs,
    },
    /// Restore a plot from a transfer string and run it
    Import {
        /// Registry document (TOML)
        #[arg(long)]
        registry: PathBuf,
        /// Transfer string produced by `export`
        snapshot: String,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct PlotArgs {
    /// Registry document (TOML)
    #[arg(long)]
    registry: PathBuf,
    /// Name of the layout template to build
    #[arg(long)]
    layout: String,
    /// Tower to place, as NAME@X,Y; may be repeated
    #[arg(long = "tower", value_name = "NAME@X,Y")]
    towers: Vec<TowerArg>,
    /// Wave to start on
    #[arg(long)]
    wave: Option<u32>,
}

#[derive(Args)]
struct RunArgs {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Simulation settings (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TowerArg(PlacedTower);

impl FromStr for TowerArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (name, cell) = value
            .split_once('@')
            .ok_or_else(|| format!("expected NAME@X,Y but got '{value}'"))?;
        let (x, y) = cell
            .split_once(',')
            .ok_or_else(|| format!("expected X,Y after '@' but got '{cell}'"))?;
        let parse = |coordinate: &str| {
            coordinate
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid cell coordinate '{coordinate}'"))
        };
        if name.trim().is_empty() {
            return Err(format!("missing tower name in '{value}'"));
        }
        Ok(Self(PlacedTower {
            tower: name.trim().to_owned(),
            x: parse(x)?,
            y: parse(y)?,
        }))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate { plot, run, export } => simulate(plot, run, export),
        Commands::Validate { registry } => validate(&registry),
        Commands::Export { plot } => export(plot),
        Commands::Import {
            registry,
            snapshot,
            run,
        } => import(&registry, &snapshot, run),
    }
}

/// `RUST_LOG` directives when set and valid, `info` otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn simulate(plot: PlotArgs, run: RunArgs, export: bool) -> Result<()> {
    let registry = load_registry(&plot.registry)?;
    let config = load_config(run.config.as_deref())?;
    let layout = build_plot(&registry, plot_snapshot(plot, &config), &config)?;
    let layout = run_plot(layout, &config, run.ticks);
    if export {
        println!("{}", plot_transfer::encode(&PlotSnapshot::capture(&layout))?);
    }
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read registry {}", path.display()))?;
    let (registry, errors) = TemplateRegistry::from_toml_str(&text)
        .with_context(|| format!("failed to parse registry {}", path.display()))?;

    println!(
        "{} tower templates, {} layout templates",
        registry.towers().count(),
        registry.layouts().count()
    );
    for error in &errors {
        println!("  skipped: {error}");
    }
    if !errors.is_empty() {
        bail!("{} malformed templates in {}", errors.len(), path.display());
    }
    Ok(())
}

fn export(plot: PlotArgs) -> Result<()> {
    let registry = load_registry(&plot.registry)?;
    let config = SimulationConfig::default();
    let layout = build_plot(&registry, plot_snapshot(plot, &config), &config)?;
    println!("{}", plot_transfer::encode(&PlotSnapshot::capture(&layout))?);
    Ok(())
}

fn import(registry: &Path, snapshot: &str, run: RunArgs) -> Result<()> {
    let registry = load_registry(registry)?;
    let config = load_config(run.config.as_deref())?;
    let snapshot = plot_transfer::decode(snapshot).context("invalid plot string")?;
    let layout = build_plot(&registry, snapshot, &config)?;
    let _ = run_plot(layout, &config, run.ticks);
    Ok(())
}

fn load_registry(path: &Path) -> Result<TemplateRegistry> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read registry {}", path.display()))?;
    let (registry, errors) = TemplateRegistry::from_toml_str(&text)
        .with_context(|| format!("failed to parse registry {}", path.display()))?;
    if !errors.is_empty() {
        warn!(skipped = errors.len(), "registry contains malformed templates");
    }
    Ok(registry)
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    registry::parse_simulation_config(&text)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn plot_snapshot(plot: PlotArgs, config: &SimulationConfig) -> PlotSnapshot {
    PlotSnapshot {
        layout: plot.layout,
        wave: plot.wave.unwrap_or(config.start_wave),
        towers: plot.towers.into_iter().map(|tower| tower.0).collect(),
    }
}

fn build_plot(
    registry: &TemplateRegistry,
    snapshot: PlotSnapshot,
    config: &SimulationConfig,
) -> Result<Layout> {
    let (layout, skipped) = snapshot
        .restore(registry, PLOT_ORIGIN, HeadlessWorld::new(), config)
        .with_context(|| format!("failed to build layout '{}'", snapshot.layout))?;
    for placed in &skipped {
        println!("  skipped tower {} at ({}, {})", placed.tower, placed.x, placed.y);
    }
    Ok(layout)
}

/// Totals gathered from the events of a run.
#[derive(Debug, Default, PartialEq, Eq)]
struct RunSummary {
    spawned: usize,
    killed: usize,
    leaked: usize,
    waves_completed: usize,
    waves_failed: usize,
    coins: u64,
}

impl RunSummary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::EnemySpawned { .. } => self.spawned += 1,
            Event::EnemyDied {
                cause: DeathCause::Health,
                ..
            } => self.killed += 1,
            Event::EnemyDied {
                cause: DeathCause::Path,
                ..
            } => self.leaked += 1,
            Event::WaveCompleted { .. } => self.waves_completed += 1,
            Event::WaveFailed { .. } => self.waves_failed += 1,
            Event::CoinsGranted { amount } => self.coins += u64::from(*amount),
            _ => {}
        }
    }
}

fn layout_line(layout: &Layout) -> String {
    format!(
        "layout '{}': wave {}, {} towers",
        query::name(layout),
        query::waves(layout).wave(),
        query::towers(layout).len()
    )
}

fn run_plot(layout: Layout, config: &SimulationConfig, ticks: u64) -> Layout {
    let mut session = Session::new(layout, config, Wallet::default());
    let mut summary = RunSummary::default();
    for event in session.start().iter().chain(session.run(ticks).iter()) {
        summary.record(event);
    }
    for event in &session.stop() {
        summary.record(event);
    }

    let (layout, wallet) = session.into_parts();
    info!(ticks, "simulation finished");
    println!("{}", layout_line(&layout));
    println!(
        "enemies: {} spawned, {} killed, {} leaked",
        summary.spawned, summary.killed, summary.leaked
    );
    println!(
        "waves: {} completed, {} failed",
        summary.waves_completed, summary.waves_failed
    );
    println!("coins earned: {} (wallet {})", summary.coins, wallet.balance());
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tower_arguments_parse_name_and_cell() {
        let parsed: TowerArg = "archer@3,7".parse().expect("valid tower argument");
        assert_eq!(
            parsed,
            TowerArg(PlacedTower {
                tower: "archer".to_owned(),
                x: 3,
                y: 7,
            })
        );
    }

    #[test]
    fn malformed_tower_arguments_are_rejected() {
        assert!("archer".parse::<TowerArg>().is_err());
        assert!("archer@3".parse::<TowerArg>().is_err());
        assert!("@3,4".parse::<TowerArg>().is_err());
        assert!("archer@x,4".parse::<TowerArg>().is_err());
    }

    #[test]
    fn summary_counts_kills_and_leaks_separately() {
        let mut summary = RunSummary::default();
        let events = [
            Event::EnemyDied {
                enemy: plot_defence_core::EnemyId::new(0),
                cause: DeathCause::Health,
            },
            Event::CoinsGranted { amount: 3 },
            Event::EnemyDied {
                enemy: plot_defence_core::EnemyId::new(1),
                cause: DeathCause::Path,
            },
        ];
        for event in &events {
            summary.record(event);
        }
        assert_eq!(
            summary,
            RunSummary {
                killed: 1,
                leaked: 1,
                coins: 3,
                ..RunSummary::default()
            }
        );
    }

    #[test]
    fn log_filter_honours_rust_log_and_defaults_to_info() {
        use tracing::level_filters::LevelFilter;

        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter(Some("warn".to_owned())).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            log_filter(Some("plot_defence_world=debug".to_owned())).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn layout_line_reports_the_layout_name() {
        use plot_defence_core::{BlockPattern, CellCoord, Direction, LayoutTemplate, LAYOUT_SIZE};

        let template = LayoutTemplate {
            name: "orchard".to_owned(),
            start: CellCoord::new(0, 5),
            path: plot_defence_core::Path::new(vec![Direction::East; 10])
                .expect("non-empty path"),
            pattern: BlockPattern::filled(LAYOUT_SIZE, LAYOUT_SIZE, 1, "grass_block"),
        };
        let layout = Layout::new(
            &template,
            PLOT_ORIGIN,
            HeadlessWorld::new(),
            &SimulationConfig::default(),
        )
        .expect("layout builds");

        assert_eq!(layout_line(&layout), "layout 'orchard': wave 1, 0 towers");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
