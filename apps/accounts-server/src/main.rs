use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use user_accounts::config::UserAccountsConfig;
use user_accounts::domain::token::{TokenIssuer, JWT_SECRET_ENV};
use user_accounts::UserAccounts;

mod db;
mod request_id;
mod server;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "user_accounts";

/// Accounts Server - user registration, login and role-gated user management
#[derive(Parser)]
#[command(name = "accounts-server")]
#[command(about = "Accounts Server - user registration, login and role-gated user management")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    // Apply CLI overrides (port / verbosity)
    config.apply_cli_overrides(&args);

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, config.home_dir());
    tracing::info!("Accounts Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config),
    }
}

/// Module config plus a token issuer; fails before any socket or database is opened.
fn prepare_module(config: &AppConfig) -> Result<(UserAccountsConfig, TokenIssuer)> {
    let module_cfg: UserAccountsConfig = config.module_config(MODULE_NAME)?;
    let tokens = TokenIssuer::from_env(Duration::from_secs(module_cfg.token_ttl_secs))
        .with_context(|| format!("{JWT_SECRET_ENV} must be set to a non-empty value"))?;
    Ok((module_cfg, tokens))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    let (module_cfg, tokens) = prepare_module(&config)?;

    let conn = db::connect(&config, &args).await?;
    UserAccounts::migrate(&conn).await?;

    let accounts = UserAccounts::new(conn, &module_cfg, tokens);
    let router = server::build_router(&accounts, &config.server);

    server::serve(router, &config.server).await
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    prepare_module(&config)?;
    if let Some(db_config) = config.database.as_ref() {
        db::detect_from_dsn(db_config)?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}
