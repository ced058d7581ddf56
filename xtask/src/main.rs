use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

const DEFAULT_CONFIG: &str = "platform_rs90.toml";

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for pokemini-rs90")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Run tests, optionally limited to some areas
    Test {
        #[arg(value_enum)]
        areas: Vec<Area>,
    },
    /// Run benchmarks
    Bench {
        /// Only run this bench target (scaler_bench, pipeline_bench)
        #[arg(long)]
        only: Option<String>,
    },
    /// Run the front-end with the demo core
    Run {
        /// Configuration file
        config: Option<String>,
        /// Build without the cpal audio backend
        #[arg(long)]
        no_audio: bool,
        #[arg(long)]
        release: bool,
    },
}

/// Test areas and the cargo targets that cover them
#[derive(Clone, Copy, ValueEnum)]
enum Area {
    Display,
    Pacing,
    Pipeline,
    Menu,
}

impl Area {
    fn name(self) -> &'static str {
        match self {
            Area::Display => "display",
            Area::Pacing => "pacing",
            Area::Pipeline => "pipeline",
            Area::Menu => "menu",
        }
    }

    fn unit_filter(self) -> &'static str {
        match self {
            Area::Display => "display::",
            Area::Pacing => "pacing::",
            Area::Pipeline => "pipeline::",
            Area::Menu => "menu::",
        }
    }

    fn integration_target(self) -> Option<&'static str> {
        match self {
            Area::Pipeline => Some("pipeline_tests"),
            Area::Menu => Some("menu_transition_tests"),
            Area::Display | Area::Pacing => None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Test { areas } => run_test(&areas),
        Commands::Bench { only } => run_bench(only.as_deref()),
        Commands::Run {
            config,
            no_audio,
            release,
        } => run_frontend(config.as_deref(), no_audio, release),
    }
}

/// `cargo <subcommand>` with the feature set for this environment
///
/// CI machines lack the ALSA headers cpal needs, so the audio feature is off there.
fn cargo(subcommand: &str) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg(subcommand);
    if std::env::var("CI").is_ok() {
        cmd.arg("--no-default-features");
    } else {
        cmd.arg("--all-features");
    }
    cmd
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== Running CI Pipeline ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task("Build", || execute_command(&mut cargo("build")), verbose)?;
    run_task("Test", || run_test(&[]), verbose)?;

    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );

    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = cargo("clippy");
    cmd.arg("--all-targets");

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_test(areas: &[Area]) -> Result<()> {
    if areas.is_empty() {
        return execute_command(&mut cargo("test"));
    }

    let mut failed = Vec::new();
    for &area in areas {
        let name = area.name();
        println!("{} Running {} tests...", "→".blue(), name.bold());

        let mut unit = cargo("test");
        unit.arg("--lib").arg(area.unit_filter());
        let mut result = execute_command(&mut unit);

        if let Some(target) = area.integration_target() {
            let mut integration = cargo("test");
            integration.arg("--test").arg(target);
            result = result.and(execute_command(&mut integration));
        }

        match result {
            Ok(()) => println!("{} {} tests passed\n", "✓".green(), name),
            Err(_) => {
                println!("{} {} tests failed\n", "✗".red(), name);
                failed.push(name);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Tests failed in: {}", failed.join(", "))
    }
}

fn run_bench(only: Option<&str>) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("bench");

    if let Some(target) = only {
        println!("{} Bench target: {}", "→".blue(), target.bold());
        cmd.arg("--bench").arg(target);
    }

    execute_command(&mut cmd)
}

fn run_frontend(config: Option<&str>, no_audio: bool, release: bool) -> Result<()> {
    println!("{}", "=== PokeMini RS-90 ===".bold().blue());

    let path = config.unwrap_or(DEFAULT_CONFIG);
    if Path::new(path).exists() {
        println!("{} Config: {}", "✓".green(), path.cyan());
    } else {
        println!(
            "{} Config file not found: {} (defaults will be written there)",
            "⚠".yellow().bold(),
            path.yellow()
        );
    }
    println!(
        "{} Audio: {}, build: {}\n",
        "→".blue(),
        if no_audio { "off".yellow() } else { "cpal".green() },
        if release { "release".green() } else { "debug".yellow() }
    );

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("run");
    if release {
        cmd.arg("--release");
    }
    if no_audio {
        cmd.arg("--no-default-features");
    }
    cmd.arg("--").arg(path);

    execute_command(&mut cmd)?;

    println!(
        "\n{} Session ended after {}",
        "✓".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );

    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(_) => {
            let elapsed = start.elapsed();
            println!(
                "{} {}",
                "✓".green().bold(),
                if verbose {
                    format!("({:.2}s)", elapsed.as_secs_f64())
                } else {
                    String::new()
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
