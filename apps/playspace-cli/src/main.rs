mod script;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use playspace_content::ContentBundle;
use script::Script;

#[derive(Parser)]
#[command(name = "playspace-cli", about = "CLI tool for playspace content")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print runtime version and crate info
    Info,
    /// Check a content bundle and list its warnings
    Validate {
        /// Bundle file (.yaml, .yml or .json)
        bundle: PathBuf,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Play a bundle against a scripted input and print events as JSON lines
    Simulate {
        /// Bundle file (.yaml, .yml or .json)
        bundle: PathBuf,
        /// Frame script (.yaml, .yml or .json)
        script: PathBuf,
        /// Also print effect requests
        #[arg(long)]
        effects: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("playspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("triggers: {}", playspace_triggers::crate_info());
            println!("gamestate: {}", playspace_gamestate::crate_info());
            println!("actions: {}", playspace_actions::crate_info());
            println!("nav: {}", playspace_nav::crate_info());
            println!("transition: {}", playspace_transition::crate_info());
            println!("content: {}", playspace_content::crate_info());
            println!(
                "content schema: v{}",
                playspace_content::BUNDLE_SCHEMA_VERSION
            );
        }
        Commands::Validate { bundle, strict } => {
            let mut content = ContentBundle::load(&bundle)
                .with_context(|| format!("loading {}", bundle.display()))?;
            let report = content.validate()?;
            for warning in &report.warnings {
                println!("warning: {warning}");
            }
            println!(
                "{}: {} scene(s), {} warning(s)",
                content.name,
                content.scenes.len(),
                report.warnings.len()
            );
            if strict && !report.is_clean() {
                anyhow::bail!("{} warning(s) in strict mode", report.warnings.len());
            }
        }
        Commands::Simulate {
            bundle,
            script,
            effects,
        } => {
            let content = ContentBundle::load(&bundle)
                .with_context(|| format!("loading {}", bundle.display()))?;
            let script = Script::load(&script)?;
            let (mut session, _) = content.into_session()?;
            tracing::info!(
                session = %session.id(),
                scene = %session.scene().id,
                ticks = script.ticks(),
                "simulation started"
            );

            let mut emit = |tick: u64, session: &mut playspace_kernel::RuntimeSession| {
                for event in session.drain_events() {
                    println!("{}", json!({ "tick": tick, "event": event }));
                }
                let requested = session.drain_effects();
                if effects {
                    for effect in requested {
                        println!("{}", json!({ "tick": tick, "effect": effect }));
                    }
                }
            };
            emit(0, &mut session);
            script.run(&mut session, &mut emit);

            let summary = json!({
                "phase": session.phase(),
                "scene": session.scene().id,
                "state": session.state(),
                "conditions": session.report(),
            });
            println!("{summary}");
        }
    }

    Ok(())
}
