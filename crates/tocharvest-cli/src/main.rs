// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! tocharvest command-line entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use tocharvest::manifest::ManifestStore;
use tocharvest::pipeline;
use tocharvest::walker;
use tocharvest::{HarvestConfig, HarvestReport, HttpClient, VersionPolicy};

#[derive(Parser)]
#[command(
    name = "tocharvest",
    about = "Mirror a remote table-of-contents catalog of resource specifications to disk",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the manifest and mirror every leaf (default).
    Run {
        #[command(flatten)]
        settings: Settings,

        /// Replay the stored manifest instead of fetching it.
        #[arg(long)]
        from_stored: bool,

        /// Print the run report as JSON on stdout.
        #[arg(long)]
        json: bool,
    },

    /// Fetch, normalize and store the manifest only.
    Manifest {
        #[command(flatten)]
        settings: Settings,
    },

    /// List the hrefs a run would resolve, without fetching any page.
    Leaves {
        #[command(flatten)]
        settings: Settings,

        /// Read the stored manifest instead of fetching it.
        #[arg(long)]
        from_stored: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

/// Overrides layered on top of the environment configuration.
#[derive(Args, Default)]
struct Settings {
    /// Root directory of the mirrored tree.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File holding the normalized manifest.
    #[arg(long)]
    manifest_path: Option<PathBuf>,

    /// Remote manifest location.
    #[arg(long)]
    manifest_url: Option<String>,

    /// Base URL leaf hrefs are joined against (must end with '/').
    #[arg(long)]
    base_url: Option<String>,

    /// Most recent versions kept per version list (0 keeps all).
    #[arg(long)]
    keep_versions: Option<usize>,

    /// Cap on concurrent page resolutions. Unbounded when omitted.
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Per-request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Settings {
    fn resolve(self) -> Result<HarvestConfig> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Flags over `lookup`'d environment values over defaults.
    fn resolve_with<F>(self, lookup: F) -> Result<HarvestConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = HarvestConfig::from_lookup(lookup)?;
        if let Some(v) = self.output_dir {
            config.output_dir = v;
        }
        if let Some(v) = self.manifest_path {
            config.manifest_path = v;
        }
        if let Some(v) = self.manifest_url {
            config.manifest_url = v;
        }
        if let Some(v) = self.base_url {
            config.base_url = v;
        }
        if let Some(v) = self.keep_versions {
            config.keep_versions = v;
        }
        if let Some(v) = self.max_in_flight {
            config.max_in_flight = Some(v);
        }
        if let Some(v) = self.timeout_ms {
            config.timeout_ms = v;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    let command = cli.command.unwrap_or(Commands::Run {
        settings: Settings::default(),
        from_stored: false,
        json: false,
    });
    if let Err(e) = execute(command).await {
        tracing::error!("tocharvest failed: {e:#}");
        return Err(e);
    }
    Ok(())
}

async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            settings,
            from_stored,
            json,
        } => {
            let config = settings.resolve()?;
            let report = if from_stored {
                pipeline::harvest_stored(&config).await?
            } else {
                pipeline::harvest(&config).await?
            };
            print_report(&report, json)?;
        }

        Commands::Manifest { settings } => {
            let config = settings.resolve()?;
            let client = HttpClient::new(config.timeout_ms);
            let manifest = pipeline::acquire_manifest(&config, &client).await?;
            let store = ManifestStore::new(&config.manifest_path);
            store.save(&manifest.canonical).await?;
            println!(
                "Stored {} branches at {}",
                manifest.branches.len(),
                store.path().display()
            );
        }

        Commands::Leaves {
            settings,
            from_stored,
        } => {
            let config = settings.resolve()?;
            let manifest = if from_stored {
                ManifestStore::new(&config.manifest_path).load().await?
            } else {
                let client = HttpClient::new(config.timeout_ms);
                pipeline::acquire_manifest(&config, &client).await?
            };
            let policy = VersionPolicy::new(config.keep_versions);
            let mut count = 0usize;
            for branch in &manifest.branches {
                walker::walk_with(branch, &policy, |leaf| {
                    count += 1;
                    println!("{}\t{}", leaf.href, leaf.trail_display());
                });
            }
            eprintln!("{count} leaves");
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "tocharvest", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn init_logging(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_report(report: &HarvestReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Harvested {} artifacts in {} ms",
        report.written(),
        report.duration_ms
    );
    let skipped = report.skipped();
    if !skipped.is_empty() {
        println!("Skipped {} leaves:", skipped.len());
        for leaf in skipped {
            println!("  {}: {}", leaf.href, leaf.error.as_deref().unwrap_or("unknown"));
        }
    }
    for branch in report.failed_branches() {
        println!(
            "Branch {} aborted: {}",
            branch.title,
            branch.aborted.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}
