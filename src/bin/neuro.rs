use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use neuro_wm::common::config::{Config, config_file};
use neuro_wm::common::log;
use neuro_wm::layout_engine::{LayoutCommand, LayoutEngine};
use neuro_wm::model::WindowId;
use neuro_wm::sys::geometry::Rect;
use neuro_wm::sys::headless::HeadlessDisplay;
use tracing::{info, warn};

/// Runs the placement engine against an in-memory display and prints the
/// resulting placements as JSON.
#[derive(Parser)]
struct Cli {
    /// Configuration file. Defaults to the per-user config, or the bundled
    /// defaults when that does not exist.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check the configuration and exit.
    #[arg(long)]
    validate: bool,

    /// Screen width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: i32,

    /// Screen height in pixels.
    #[arg(long, default_value_t = 1080)]
    height: i32,

    /// Workspace shown before the synthetic windows are managed.
    #[arg(long, default_value_t = 0)]
    workspace: usize,

    /// Number of synthetic windows to manage before running commands.
    #[arg(long, default_value_t = 3)]
    clients: u64,

    /// JSON file holding an array of commands to run in order.
    #[arg(long)]
    commands: Option<PathBuf>,

    /// Print the workspace tree instead of placements.
    #[arg(long)]
    tree: bool,
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = path.unwrap_or_else(config_file);
    if path.exists() {
        Config::read(&path)
    } else {
        info!(path = %path.display(), "no config file, using defaults");
        Ok(Config::default())
    }
}

fn load_commands(path: &Path) -> anyhow::Result<Vec<LayoutCommand>> {
    let buf = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read commands from {}", path.display()))?;
    serde_json::from_str(&buf).with_context(|| format!("Could not parse {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let opt: Cli = Parser::parse();
    log::init_logging();

    let mut config = load_config(opt.config)?;
    let issues = config.validate();
    if opt.validate {
        for issue in &issues {
            println!("{issue}");
        }
        if !issues.is_empty() {
            bail!("{} configuration issue(s)", issues.len());
        }
        println!("configuration ok");
        return Ok(());
    }
    if !issues.is_empty() {
        let fixed = config.auto_fix_values();
        warn!(issues = issues.len(), fixed, "configuration values were corrected");
    }

    let screen = Rect::new(0, 0, opt.width, opt.height);
    let display = Arc::new(HeadlessDisplay::new(screen));
    let mut engine = LayoutEngine::new(Arc::new(config), display)
        .context("Could not compile the window rules")?;

    if opt.workspace != 0 && !engine.change_workspace(opt.workspace)? {
        bail!("no workspace with index {}", opt.workspace);
    }
    for window in 1..=opt.clients {
        let geometry = Rect::new(0, 0, opt.width / 2, opt.height / 2);
        engine.manage(WindowId(window), geometry)?;
    }

    if let Some(path) = &opt.commands {
        for command in load_commands(path)? {
            if !engine.handle_command(&command)? {
                warn!(?command, "command had no effect");
            }
        }
    }

    if opt.tree {
        print!("{}", engine.draw_tree());
        return Ok(());
    }
    let active = engine.store().active_workspace();
    let placements = engine.focus_workspace(active);
    println!("{}", serde_json::to_string_pretty(&placements)?);
    Ok(())
}
