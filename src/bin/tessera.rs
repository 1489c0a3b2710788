use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tessera_wm::common::config::{Config, DEFAULT_CONFIG, config_file};
use tessera_wm::common::log;
use tessera_wm::layout_engine::{SharedLayoutContext, TreeLayoutEngine};
use tessera_wm::model::{Monitor, Rect, SavedState, VirtualWindow, Window, WindowSize};
use tessera_wm::store::map::pick_workspace_by_monitor;
use tessera_wm::store::monitor::pick_all_monitors;
use tessera_wm::store::workspace::{
    ActivateLayoutEngineTransform, AddWorkspaceTransform, LayoutEngineSelector,
};
use tessera_wm::store::{Store, pick_saved_state};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Headless tiling layout manager")]
struct Cli {
    /// Configuration file. Defaults to ~/.tessera.toml, or the bundled
    /// configuration when that does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    CheckConfig {
        /// Repair the values that can be repaired and write the file back.
        #[arg(long)]
        fix: bool,
    },
    /// Print the bundled configuration
    PrintDefaultConfig,
    /// Lay out virtual windows on virtual monitors and print the result
    Simulate {
        #[arg(long, default_value_t = 1)]
        monitors: u32,
        #[arg(long, default_value_t = 4)]
        windows: u64,
        /// Layout to activate, by its configuration name.
        #[arg(long)]
        layout: Option<String>,
        /// Saved state to restore windows from.
        #[arg(long)]
        restore: Option<PathBuf>,
        /// Write the resulting saved state here.
        #[arg(long)]
        save: Option<PathBuf>,
        #[arg(long)]
        json: bool,
        /// Also draw tree layouts.
        #[arg(long)]
        tree: bool,
    },
}

#[derive(Serialize)]
struct Placement {
    workspace: String,
    monitor: u64,
    window: u64,
    rect: Rect<i32>,
    size: WindowSize,
}

fn main() {
    let cli: Cli = Parser::parse();
    log::init_logging();

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::PrintDefaultConfig => {
            print!("{DEFAULT_CONFIG}");
            Ok(())
        }
        Commands::CheckConfig { fix } => check_config(cli.config, fix),
        Commands::Simulate {
            monitors,
            windows,
            layout,
            restore,
            save,
            json,
            tree,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let options = SimulateOptions { monitors, windows, layout, restore, save, json, tree };
            simulate(&config, options)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None if config_file().exists() => config_file(),
        None => return Ok(Config::bundled()),
    };
    Config::read(&path).with_context(|| format!("Could not read {}", path.display()))
}

fn check_config(path: Option<PathBuf>, fix: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_file);
    let mut config =
        Config::read(&path).with_context(|| format!("Could not read {}", path.display()))?;

    let issues = config.validate();
    if issues.is_empty() {
        println!("{}: ok", path.display());
        return Ok(());
    }
    for issue in &issues {
        println!("{}: {issue}", path.display());
    }

    if fix {
        let fixes = config.auto_fix_values();
        config.save(&path)?;
        println!("{}: applied {fixes} fixes", path.display());
        let remaining = config.validate();
        if remaining.is_empty() {
            return Ok(());
        }
        anyhow::bail!("{} issues could not be fixed", remaining.len());
    }
    anyhow::bail!("{} issues found", issues.len())
}

struct SimulateOptions {
    monitors: u32,
    windows: u64,
    layout: Option<String>,
    restore: Option<PathBuf>,
    save: Option<PathBuf>,
    json: bool,
    tree: bool,
}

fn simulate(config: &Config, options: SimulateOptions) -> anyhow::Result<()> {
    if options.monitors == 0 {
        anyhow::bail!("At least one monitor is needed");
    }
    let monitors: Vec<Monitor> = (0..options.monitors)
        .map(|i| {
            Monitor::new(u64::from(i) + 1, Rect::new(i as i32 * 1920, 0, 1920, 1080))
                .with_name(format!("Virtual {}", i + 1))
        })
        .collect();

    let ctx = SharedLayoutContext::new();
    let mut store = Store::new(ctx.clone())
        .with_monitors(monitors.clone())
        .with_layout_engine_creators(config.layout_engine_creators(ctx.clone())?)
        .with_proxy_layout_engine_creators(config.proxy_layout_engine_creators(ctx))
        .with_router_options(config.settings.router);

    for name in &config.settings.workspace_names {
        store.dispatch(AddWorkspaceTransform::named(name.clone()))?;
    }

    // Windows start cascaded on the first monitor.
    let windows: Vec<Window> = (1..=options.windows)
        .map(|id| {
            let offset = (id as i32 - 1) * 30;
            Window::new(VirtualWindow::new(id).with_rect(Rect::new(offset, offset, 800, 600)))
        })
        .collect();
    let saved_state = match &options.restore {
        Some(path) => Some(
            SavedState::read(path).with_context(|| format!("Could not read {}", path.display()))?,
        ),
        None => None,
    };
    store.initialize(windows, saved_state)?;

    if let Some(layout) = &options.layout {
        let Some(index) = config.settings.layouts.iter().position(|name| name == layout) else {
            anyhow::bail!("Layout '{layout}' is not in the configured layouts");
        };
        for monitor in &monitors {
            let workspace = store.pick(pick_workspace_by_monitor(monitor.id))?;
            store.dispatch(ActivateLayoutEngineTransform {
                workspace: Some(workspace.id),
                engine: LayoutEngineSelector::Index(index),
            })?;
        }
    }

    let mut placements = Vec::new();
    let mut trees = Vec::new();
    for monitor in store.pick(pick_all_monitors()) {
        let workspace = store.pick(pick_workspace_by_monitor(monitor.id))?;
        for (window, position) in &workspace.window_positions {
            placements.push(Placement {
                workspace: workspace.name.clone(),
                monitor: monitor.id.as_u64(),
                window: window.as_u64(),
                rect: position.rect,
                size: position.size,
            });
        }
        if let Some(tree) = workspace.active_layout_engine().find_layout_engine::<TreeLayoutEngine>() {
            trees.push((workspace.name.clone(), tree.draw_tree()));
        } else if options.tree {
            warn!(workspace = %workspace.name, "Active layout is not a tree");
        }
    }
    info!(placements = placements.len(), "Simulation finished");

    if options.json {
        println!("{}", serde_json::to_string_pretty(&placements)?);
    } else {
        for p in &placements {
            println!(
                "{:<12} monitor {} window {:<4} {} {:?}",
                p.workspace, p.monitor, p.window, p.rect, p.size
            );
        }
    }
    if options.tree {
        for (name, tree) in &trees {
            println!("{name}:");
            print!("{tree}");
        }
    }

    if let Some(path) = &options.save {
        store.pick(pick_saved_state()).write(path)?;
        info!(path = %path.display(), "Saved state written");
    }
    Ok(())
}
