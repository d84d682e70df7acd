mod api;
mod commands;
mod sessions;
#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use selina_channels::WhatsAppConnectionFactory;
use selina_core::{config, models::BotStatus};
use selina_services::Services;
use selina_store::Store;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "selina",
    version,
    about = "Queen Selina: multi-tenant WhatsApp bot backend"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, env = "SELINA_CONFIG", default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server and every bot session.
    Start,
    /// Show configured paths and bot counts.
    Status,
    /// Print an Argon2 hash for `[admin] password_hash`.
    HashPassword {
        /// The password to hash.
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;
            let _guard = init_logging(&cfg)?;
            run(cfg).await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("{} status\n", cfg.selina.name);
            println!("Config:   {}", cli.config);
            println!("Records:  {}", cfg.selina.records_dir().display());
            println!("Sessions: {}", cfg.selina.sessions_dir().display());
            println!("Logs:     {}", cfg.selina.logs_dir().display());
            println!(
                "Admin:    {}",
                if cfg.admin.is_configured() {
                    "configured"
                } else {
                    "not configured"
                }
            );
            println!();

            let store = Store::new(&cfg.selina.records_dir()).await?;
            let bots = store.list_bots().await?;
            println!("  users: {}", store.list_users().await?.len());
            println!("  bots:  {}", bots.len());
            for status in [
                BotStatus::Pending,
                BotStatus::Authenticated,
                BotStatus::Active,
                BotStatus::Failed,
                BotStatus::Disconnected,
            ] {
                let count = bots.iter().filter(|b| b.status == status).count();
                println!("    {:<14} {count}", status.as_str());
            }
        }
        Commands::HashPassword { password } => {
            if password.is_empty() {
                anyhow::bail!("password must not be empty");
            }
            println!("{}", api::hash_password(&password)?);
        }
    }

    Ok(())
}

/// Stdout plus a file under the logs directory. `RUST_LOG` overrides the configured level.
fn init_logging(cfg: &config::Config) -> anyhow::Result<WorkerGuard> {
    let logs_dir = cfg.selina.logs_dir();
    std::fs::create_dir_all(&logs_dir)?;
    let appender = tracing_appender::rolling::never(&logs_dir, "selina.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.selina.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();
    Ok(guard)
}

async fn run(cfg: config::Config) -> anyhow::Result<()> {
    let cfg = Arc::new(cfg);
    let name = cfg.selina.name.clone();
    info!("{name} starting");
    if !cfg.admin.is_configured() {
        warn!("no [admin] credentials configured; admin endpoints will reject every request");
    }

    let store = Store::new(&cfg.selina.records_dir()).await?;
    let services = Arc::new(Services::new(cfg.services.clone(), &name)?);
    let dispatcher = Arc::new(commands::Dispatcher::new(
        store.clone(),
        services.clone(),
        cfg.bot.clone(),
        &name,
    ));
    let factory = Arc::new(WhatsAppConnectionFactory::new(&cfg));
    let sessions = Arc::new(sessions::SessionRegistry::new(
        store.clone(),
        factory,
        dispatcher,
        services,
        cfg.bot.clone(),
        &name,
    ));

    if cfg.bot.resume_on_start {
        let resumed = sessions.resume_persisted().await?;
        info!("resumed {resumed} persisted session(s)");
    }

    let state = api::ApiState::new(store, sessions.clone(), cfg.clone());
    api::serve(state, shutdown_signal()).await?;

    info!("shutting down, closing {} session(s)", sessions.session_count());
    sessions.stop_all().await;
    info!("{name} stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
