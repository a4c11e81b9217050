use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use rust_deployer::cli::Args;
use rust_deployer::config::{load_manifest, resolve_collections};
use rust_deployer::deploy::{run_deploy, CancelToken, DeployRequest, LogSink};
use rust_deployer::models::ArtifactCollection;
use rust_deployer::transport::{Credentials, TransportOptions};

fn main() -> Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    initialize_logging(args.verbose)?;

    // Resolve what to upload before touching the network
    let collections = build_collections(&args)?;

    let request = DeployRequest {
        protocol: args.transport.protocol(),
        target: args.target.clone(),
        credentials: Credentials {
            username: args.username.clone(),
            password: args.password.clone(),
            domain: args.domain.clone(),
        },
        options: TransportOptions {
            dns_only_name_resolution: args.dns_only,
            connect_timeout: Duration::from_secs(args.timeout),
        },
        collections,
    };

    // Ctrl-c trips the cancellation gate; the engine stops at its next poll
    let gate = CancelToken::new();
    let runtime = tokio::runtime::Runtime::new().context("Failed to create runtime")?;
    runtime.spawn(watch_for_ctrl_c(gate.clone()));

    let succeeded = run_deploy(&request, &gate, &LogSink);
    if !succeeded {
        std::process::exit(1);
    }
    info!("Deployment completed successfully");
    Ok(())
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}

/// Trip the cancellation gate on the first ctrl-c
async fn watch_for_ctrl_c(gate: CancelToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Stop requested, finishing the current transfer step");
        gate.cancel();
    }
}

/// Build the artifact collections from the manifest or the --file arguments
fn build_collections(args: &Args) -> Result<Vec<ArtifactCollection>> {
    if let Some(manifest_path) = &args.manifest {
        if !args.file.is_empty() {
            bail!("--manifest and --file are mutually exclusive");
        }
        let manifest = load_manifest(manifest_path)?;
        return resolve_collections(&manifest);
    }

    if args.file.is_empty() {
        bail!("Nothing to upload: pass --manifest or at least one --file");
    }
    let mut collection = ArtifactCollection::new("command line");
    for file in &args.file {
        if !file.is_file() {
            bail!("Source {} does not exist", file.display());
        }
        collection.add_file(file.clone(), args.dest.trim_matches('/'));
    }
    Ok(vec![collection])
}
