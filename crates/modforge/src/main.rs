use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::debug;

use modforge_core::assets::AssetResolution;
use modforge_core::engine::{EngineConfig, LoadReport, ModEngine};
use modforge_core::resolver::{Diagnostic, Severity};

use sample_rebalance::RebalancePlugin;

/// ModForge: plugin load-order resolution and runtime-patch engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Directory to scan for plugin packages (repeatable)
    #[arg(long = "mods-dir")]
    mods_dirs: Vec<PathBuf>,

    /// Host base content directory, the asset fallback of last resort
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Engine configuration file (TOML or YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not register the bundled sample plugin
    #[arg(long)]
    no_builtins: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the load order without running any plugin code
    Check,
    /// Resolve and load all plugins, then print the outcome
    Load,
    /// Load all plugins, then resolve which provider owns an asset path
    Asset {
        /// Logical asset path, e.g. data/units/slime.json
        path: String,
    },
    /// Load all plugins, then print the modification chain for a target
    Chain {
        /// Target signature, e.g. battle.turn_order
        target: String,
    },
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let tag = match diagnostic.severity() {
            Severity::Fatal => "error",
            Severity::Warning => "warning",
        };
        println!("  [{tag}] {diagnostic}");
    }
}

fn print_report(report: &LoadReport) {
    if report.aborted {
        println!("Load aborted; no plugin was loaded:");
        print_diagnostics(&report.diagnostics);
        return;
    }
    if report.cancelled {
        println!("Load cancelled; the partial generation was rolled back.");
        return;
    }

    println!("Loaded {} plugin(s) (generation {}):", report.loaded.len(), report.generation);
    for (index, id) in report.loaded.iter().enumerate() {
        println!("  {:>3}. {}", index + 1, id);
    }
    if !report.diagnostics.is_empty() {
        println!("Diagnostics:");
        print_diagnostics(&report.diagnostics);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => match EngineConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                return ExitCode::from(2);
            }
        },
        None => EngineConfig::default(),
    };
    if !args.mods_dirs.is_empty() {
        config.plugin_dirs = args.mods_dirs.clone();
    }
    if let Some(base_dir) = &args.base_dir {
        config.base_asset_dir = Some(base_dir.clone());
    }
    debug!("effective config: {:?}", config);

    let mut engine = ModEngine::new(config);

    if !args.no_builtins {
        if let Err(e) =
            engine.register_builtin(sample_rebalance::manifest(), Arc::new(RebalancePlugin))
        {
            eprintln!("Failed to register bundled plugin: {e}");
            return ExitCode::from(2);
        }
    }

    match args.command {
        Commands::Check => {
            let check = engine.check().await;
            if check.aborted {
                println!("Load order could not be resolved:");
                print_diagnostics(&check.diagnostics);
                return ExitCode::FAILURE;
            }
            println!("Resolved load order ({} plugin(s)):", check.order.len());
            for (index, id) in check.order.iter().enumerate() {
                println!("  {:>3}. {}", index + 1, id);
            }
            if !check.diagnostics.is_empty() {
                println!("Diagnostics:");
                print_diagnostics(&check.diagnostics);
            }
            ExitCode::SUCCESS
        }
        Commands::Load => {
            let report = engine.load_all().await;
            print_report(&report);
            if report.aborted {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Commands::Asset { path } => {
            let report = engine.load_all().await;
            if report.aborted {
                print_report(&report);
                return ExitCode::FAILURE;
            }
            match engine.resolve_asset(&path).await {
                AssetResolution::Plugin {
                    plugin_id,
                    location,
                } => {
                    println!("{path} -> {} (plugin '{plugin_id}')", location.display());
                }
                AssetResolution::Base { location } => {
                    println!("{path} -> {} (base content)", location.display());
                }
                AssetResolution::NotFound => {
                    println!("{path} -> not found");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Commands::Chain { target } => {
            let report = engine.load_all().await;
            if report.aborted {
                print_report(&report);
                return ExitCode::FAILURE;
            }
            let chain = engine.modification_chain(&target).await;
            if chain.is_empty() {
                println!("No modifications registered for '{target}'.");
            } else {
                println!("Modification chain for '{target}':");
                for (index, plugin_id) in chain.iter().enumerate() {
                    println!("  {:>3}. {}", index + 1, plugin_id);
                }
            }
            ExitCode::SUCCESS
        }
    }
}
