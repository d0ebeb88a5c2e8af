// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pass_deposit_assembler::{Assembler, Resolver};
use pass_deposit_model::Submission;
use pass_deposit_service::{
    Config, ConfigError, DepositError, IoErrorContext, PackagerRegistry, Result, config,
};
use pass_deposit_store::MemoryStore;
use tokio::io::BufWriter;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Packages submissions and deposits them into repositories.
#[derive(Debug, Parser)]
#[command(name = "pass-deposit", version, about, long_about = None)]
struct Cli {
    /// Configuration file, overriding PASS_DEPOSIT_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that every configured repository is reachable.
    Check,
    /// Assemble a package from a submission JSON document without touching
    /// an entity store.
    Package {
        submission: PathBuf,
        /// Key of the configured repository whose packaging options apply.
        repository: String,
        /// Directory the package file is written into.
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match load_config(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Command::Check => check(&config).await,
            Command::Package {
                submission,
                repository,
                out,
            } => package(&config, &submission, &repository, &out).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "pass-deposit failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => config::load(),
    }
}

async fn check(config: &Config) -> Result<bool> {
    let registry = PackagerRegistry::from_config(config)?;
    if registry.is_empty() {
        warn!("no repositories configured");
    }
    let mut all_reachable = true;
    for packager in registry.iter() {
        let protocol = packager.transport.protocol();
        if packager.transport.check_connectivity(packager.options()).await {
            info!(repository = %packager.key, %protocol, "reachable");
        } else {
            warn!(repository = %packager.key, %protocol, "not reachable");
            all_reachable = false;
        }
    }
    Ok(all_reachable)
}

async fn package(
    config: &Config,
    submission: &std::path::Path,
    repository: &str,
    out: &std::path::Path,
) -> Result<bool> {
    let repository = config
        .repository(repository)
        .ok_or_else(|| DepositError::UnknownRepository {
            key: repository.to_owned(),
        })?;
    let contents = tokio::fs::read_to_string(submission)
        .await
        .io_context(format!("reading {}", submission.display()))?;
    let submission: Submission = serde_json::from_str(&contents).map_err(|e| ConfigError::Invalid {
        reason: format!("{} is not a submission document: {e}", submission.display()),
    })?;
    if let Some(file) = submission
        .files
        .iter()
        .find(|f| f.location.as_deref().is_none_or(str::is_empty))
    {
        return Err(ConfigError::Invalid {
            reason: format!("{} needs a location outside an entity store", file.name),
        }
        .into());
    }

    let http = config.http.client().map_err(DepositError::HttpClient)?;
    let resolver = Resolver::new(
        Arc::new(MemoryStore::new()),
        http,
        config.resolver.classpath_roots.clone(),
    );
    let package = Assembler::new(Arc::new(resolver))
        .assemble(&submission, &repository.assembler)
        .await?;

    let path = out.join(package.metadata().file_name());
    let file = tokio::fs::File::create(&path)
        .await
        .io_context(format!("creating {}", path.display()))?;
    let written = package
        .open()?
        .write_to(&mut BufWriter::new(file))
        .await
        .io_context(format!("writing {}", path.display()))?;

    for resource in package.resources() {
        let checksums: Vec<String> = resource.checksums.iter().map(ToString::to_string).collect();
        info!(resource = %resource.name, size = resource.size, ?checksums, "packaged");
    }
    info!(path = %path.display(), bytes = written, "package written");
    Ok(true)
}
