//! banking-client -- command-line driver for the banking API client.
//!
//! Loads configuration, installs tracing, builds [`Services`] and runs one
//! command against the configured backend. Results are printed as JSON.

use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use banking_client::Services;
use banking_client::config::{Config, DEFAULT_CONFIG_PATH};

// ---------------------------------------------------------------------------
// CLI argument parsing (minimal, no clap dependency)
// ---------------------------------------------------------------------------

enum Command {
    Login { email: String, password: String },
    Register { name: String, email: String, password: String },
    Me,
    Session,
    Accounts,
    Summary,
    Transactions { limit: Option<u32> },
    Notifications,
    Unread,
    Refresh,
    BiometricLogin,
    Logout,
}

struct CliArgs {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> CliArgs {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                if let Some(path) = args.next() {
                    config_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("banking-client {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            _ => positional.push(arg),
        }
    }

    match parse_command(&positional) {
        Ok(command) => CliArgs {
            config_path,
            command,
        },
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("Run with --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let strs: Vec<&str> = args.iter().map(String::as_str).collect();
    let command = match strs.as_slice() {
        ["login", email, password] => Command::Login {
            email: email.to_string(),
            password: password.to_string(),
        },
        ["register", name, email, password] => Command::Register {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        },
        ["me"] => Command::Me,
        ["session"] => Command::Session,
        ["accounts"] => Command::Accounts,
        ["summary"] => Command::Summary,
        ["transactions"] => Command::Transactions { limit: None },
        ["transactions", limit] => Command::Transactions {
            limit: Some(
                limit
                    .parse()
                    .map_err(|_| format!("Invalid limit: {limit}"))?,
            ),
        },
        ["notifications"] => Command::Notifications,
        ["unread"] => Command::Unread,
        ["refresh"] => Command::Refresh,
        ["biometric-login"] => Command::BiometricLogin,
        ["logout"] => Command::Logout,
        [] => return Err("No command given".to_string()),
        [other, ..] => return Err(format!("Unknown command or wrong arguments: {other}")),
    };
    Ok(command)
}

fn print_usage() {
    println!(
        "\
banking-client {version} -- Banking API client

USAGE:
    banking-client [OPTIONS] <COMMAND>

COMMANDS:
    login <email> <password>             Sign in and store the session
    register <name> <email> <password>   Create an account
    me                                   Show the signed-in profile
    session                              Probe the current session
    accounts                             List accounts
    summary                              Show account totals
    transactions [limit]                 Recent transactions [default: 10]
    notifications                        List notifications
    unread                               Count unread notifications
    refresh                              Refresh the stored session
    biometric-login                      Unlock the stored session biometrically
    logout                               Clear the stored session

OPTIONS:
    -c, --config <PATH>    Path to configuration file [default: {config}]
    -h, --help             Print this help message
    -V, --version          Print version information

ENVIRONMENT:
    RUST_LOG               Override log level (e.g. RUST_LOG=debug)
    BANKING_CONFIG         Alternative to --config flag
    BANKING_API_URL        Backend base URL
    BANKING_USE_MOCKS      Use the local mock backend
",
        version = env!("CARGO_PKG_VERSION"),
        config = DEFAULT_CONFIG_PATH,
    );
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = parse_args();

    let config_path = cli
        .config_path
        .or_else(|| std::env::var("BANKING_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    init_tracing(&config);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "Starting banking-client"
    );

    let services = Services::from_config(&config)?;
    run(&services, cli.command).await
}

async fn run(services: &Services, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => print_json(&services.auth.login(&email, &password).await?),
        Command::Register {
            name,
            email,
            password,
        } => print_json(&services.auth.register(&name, &email, &password).await?),
        Command::Me => print_json(&services.auth.me().await?),
        Command::Session => print_json(&services.auth.session_user().await?),
        Command::Accounts => print_json(&services.accounts.accounts().await?),
        Command::Summary => print_json(&services.accounts.summary().await?),
        Command::Transactions { limit } => {
            print_json(&services.transactions.recent(limit).await?)
        }
        Command::Notifications => print_json(&services.notifications.notifications().await?),
        Command::Unread => print_json(&services.notifications.unread_count().await?),
        Command::Refresh => {
            services.auth.refresh().await?;
            println!("Session refreshed");
            Ok(())
        }
        Command::BiometricLogin => {
            let biometry = services.biometric_login().await?;
            print_json(&serde_json::json!({ "status": "unlocked", "biometry": biometry }))
        }
        Command::Logout => {
            services.auth.logout().await?;
            println!("Logged out");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

fn init_tracing(config: &Config) {
    // RUST_LOG env var takes precedence over config file
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.tracing_filter()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
