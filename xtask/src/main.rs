use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

const DEMO_BUNDLE: &str = "demos/quest.yaml";
const DEMO_SCRIPT: &str = "demos/walk.yaml";

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for playspace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, deny, doc, demo
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run cargo deny check
    Deny,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Validate the demo bundle strictly and play the demo script
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_deny()?;
            run_doc()?;
            run_demo()?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Deny => run_deny()?,
        Commands::Doc => run_doc()?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
        Commands::Demo => run_demo()?,
    }

    Ok(())
}

/// Run `cargo <args>`, failing with `label` when it exits non-zero.
fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {label}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {label} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo("fmt --check", &["fmt", "--all", "--", "--check"])
}

fn run_clippy() -> Result<()> {
    cargo(
        "clippy",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )
}

fn run_tests() -> Result<()> {
    cargo("test", &["test", "--workspace"])
}

fn run_deny() -> Result<()> {
    cargo(
        "deny check (licenses bans sources)",
        &["deny", "check", "licenses", "bans", "sources"],
    )
}

fn run_doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn run_demo() -> Result<()> {
    let cli = ["run", "--quiet", "-p", "playspace-cli", "--"];
    let validate = [&cli[..], &["validate", "--strict", DEMO_BUNDLE][..]].concat();
    cargo("run (validate demo)", &validate)?;
    let simulate = [&cli[..], &["simulate", DEMO_BUNDLE, DEMO_SCRIPT][..]].concat();
    cargo("run (simulate demo)", &simulate)
}
