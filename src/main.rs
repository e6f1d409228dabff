use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use auth_failover::auth::{AuthFailoverManager, Credentials, FailoverSettings};
use auth_failover::config::Config;
use auth_failover::coordinator::{HttpCoordinator, SyncCommand};
use auth_failover::logging::init_tracing;
use auth_failover::provider::ProviderSet;

#[derive(Debug, Parser)]
#[command(name = "auth-failover", version, about = "Authentication failover client")]
struct Cli {
    /// Config file (defaults to the per-user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show which identity provider the coordinator recommends.
    Status,
    /// Sign in, failing over to the backup provider if needed.
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "AUTH_FAILOVER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Switch to the backup provider and notify the coordinator.
    SwitchToBackup,
    /// Switch back to the main provider and notify the coordinator.
    RestoreMain,
    /// Run a coordinator maintenance command.
    Trigger {
        #[arg(value_enum)]
        command: SyncCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    let coordinator = Arc::new(
        HttpCoordinator::new(&config.coordinator).context("building coordinator client")?,
    );

    match cli.command {
        Command::Status => {
            let manager = build_manager(&config, coordinator)?;
            let identity = manager.initialize().await?;
            println!("active configuration: {}", identity);
        }
        Command::SignIn { email, password } => {
            let manager = build_manager(&config, coordinator)?;
            if let Err(e) = manager.initialize().await {
                eprintln!("warning: {} (using {})", e, manager.current_config());
            }
            let session = manager.sign_in(&Credentials::new(email, password)).await?;
            println!(
                "signed in as {} ({}) via {}; retries used: {}",
                session.email,
                session.user_id,
                session.identity,
                manager.retry_count()
            );
        }
        Command::SwitchToBackup => {
            let manager = build_manager(&config, coordinator)?;
            if let Err(e) = manager.initialize().await {
                eprintln!("warning: {}", e);
            }
            let result = manager.switch_to_backup().await;
            println!("active configuration: {}", manager.current_config());
            result?;
        }
        Command::RestoreMain => {
            let manager = build_manager(&config, coordinator)?;
            if let Err(e) = manager.initialize().await {
                eprintln!("warning: {}", e);
            }
            let result = manager.restore_main().await;
            println!("active configuration: {}", manager.current_config());
            result?;
        }
        Command::Trigger { command } => {
            let outcome = coordinator.trigger(command).await?;
            let status = if outcome.success { "ok" } else { "failed" };
            println!(
                "{}: {} {}",
                command,
                status,
                outcome.message.unwrap_or_default()
            );
            if !outcome.success {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn build_manager(config: &Config, coordinator: Arc<HttpCoordinator>) -> Result<AuthFailoverManager> {
    let providers = ProviderSet::from_config(config).context("building identity providers")?;
    Ok(AuthFailoverManager::new(
        providers,
        coordinator,
        FailoverSettings::from(&config.failover),
    ))
}
