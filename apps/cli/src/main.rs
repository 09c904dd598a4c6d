use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use curseloader::{
    InstallConfig, InstallState, Installer, ModLoaderType, ModRef, ProgressEvent, ResolveContext,
    SelectionSet,
};
use tracing_subscriber::EnvFilter;

/// Install mods and modpacks into a game instance folder
#[derive(Debug, Parser)]
#[command(name = "curseloader", version)]
struct Cli {
    /// Mod to install as modId:fileId; repeat for multiple mods
    #[arg(short = 'm', long = "mod", value_name = "MOD:FILE", required = true)]
    mods: Vec<String>,

    /// Destination directory for installed files
    #[arg(short, long, value_name = "DIR")]
    dest: PathBuf,

    /// Game version filter for dependency resolution (e.g. 1.20.1)
    #[arg(long, value_name = "VERSION")]
    game_version: Option<String>,

    /// Mod loader filter (forge, fabric, quilt, neoforge, ...)
    #[arg(long, value_name = "LOADER")]
    loader: Option<ModLoaderType>,

    /// API key; falls back to the CURSEFORGE_API_KEY environment variable
    #[arg(long, value_name = "KEY", env = "CURSEFORGE_API_KEY", hide_env_values = true)]
    api_key: String,
}

fn parse_mod_ref(raw: &str) -> anyhow::Result<ModRef> {
    let Some((mod_part, file_part)) = raw.split_once(':') else {
        bail!("expected modId:fileId, got '{raw}'");
    };
    let mod_id = mod_part
        .parse()
        .with_context(|| format!("invalid mod id '{mod_part}'"))?;
    let file_id = file_part
        .parse()
        .with_context(|| format!("invalid file id '{file_part}'"))?;
    Ok(ModRef::new(mod_id, file_id))
}

fn print_progress(event: ProgressEvent) {
    match event {
        ProgressEvent::StateChanged { state } => {
            if state != InstallState::Idle {
                println!("==> {state}");
            }
        }
        ProgressEvent::UnitStarted {
            mod_name,
            file_name,
        } => {
            println!("    fetching {file_name} ({mod_name})");
        }
        ProgressEvent::UnitFinished { file_name, percent } => {
            println!("    {percent:>5.1}% {file_name}");
        }
        ProgressEvent::Warning { message } => {
            eprintln!("warning: {message}");
        }
        ProgressEvent::Completed { verified_files } => {
            println!("done: {verified_files} files verified");
        }
        ProgressEvent::Failed { error } => {
            eprintln!("failed: {error}");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    let mut selection = SelectionSet::new();
    for raw in &cli.mods {
        selection.select(parse_mod_ref(raw)?);
    }

    let config = InstallConfig::default().with_api_key(cli.api_key);
    let installer = Installer::new(config).context("initializing installer")?;
    let ctx = ResolveContext::new(cli.game_version.clone(), cli.loader);

    let report = installer
        .run(selection, &ctx, &cli.dest, Some(Arc::new(print_progress)))
        .await
        .context("install failed")?;

    if !report.warnings.is_empty() {
        println!("{} warnings:", report.warnings.len());
        for warning in &report.warnings {
            println!("  - {warning}");
        }
    }
    println!(
        "installed {} files into {}",
        report.verified.len(),
        cli.dest.display()
    );
    Ok(())
}
