mod api;
mod config;
mod http;
mod id;
mod router;
mod server;

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{arg, Arg, Command};
use tracing::{debug, info, Level};

use crate::config::Settings;
use crate::server::{signal, Server, ServerOptions, StartupError};

fn cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .subcommand(
            Command::new("serve")
                .about("Run the application gateway")
                .arg(arg!(-c --config <CONFIG> "config file path"))
                .arg(
                    Arg::new("static")
                        .short('s')
                        .long("static")
                        .value_name("STATIC")
                        .help("static dir path"),
                ),
        )
        .subcommand(
            Command::new("migrate")
                .about("Apply pending database migrations")
                .arg(arg!(-c --config <CONFIG> "config file path")),
        )
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let result = match matches.subcommand() {
        Some(("serve", sub_matches)) => {
            let config_path = sub_matches
                .get_one::<String>("config")
                .map(String::as_str)
                .unwrap_or_default();
            let static_root = sub_matches.get_one::<String>("static").map(PathBuf::from);
            run_serve(config_path, static_root).await
        }
        Some(("migrate", sub_matches)) => {
            let config_path = sub_matches
                .get_one::<String>("config")
                .map(String::as_str)
                .unwrap_or_default();
            run_migrate(config_path)
        }
        _ => unreachable!("subcommand required"),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}

async fn run_serve(
    config_path: &str,
    static_root: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load(config_path)?;
    init_tracing(settings.log.as_deref())?;

    info!(zone = %settings.zone, "gateway starting");
    debug!(
        bus_url = %settings.bus.url,
        bus_namespace = %settings.bus.namespace,
        push_url = %settings.push.url,
        push_namespace = %settings.push.namespace,
        jwks_url = %settings.jwks.url,
        "collaborator endpoints"
    );

    let server = Server::new(ServerOptions {
        addr: settings.addr,
        static_root,
    })?;

    let shutdown = signal::shutdown_signal();
    server.run(shutdown).await?;
    Ok(())
}

fn run_migrate(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load(config_path)?;
    init_tracing(settings.log.as_deref())?;

    if settings.dsn.is_empty() {
        return Err(Box::new(StartupError::MissingDatabaseDsn));
    }

    // Schema management lives with the database collaborator; this build
    // ships no versioned migrations of its own.
    info!(dsn = %settings.dsn, "no pending migrations");
    Ok(())
}

fn init_tracing(level: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let level = match level {
        Some(value) => Level::from_str(value)?,
        None => Level::INFO,
    };

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
