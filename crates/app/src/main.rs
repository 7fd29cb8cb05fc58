mod error;
mod routes;

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use services::{AppServices, Clock};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use crate::routes::{AppState, router};

const DEFAULT_DB_URL: &str = "sqlite://hanja.sqlite3";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidPort { raw: String },
    InvalidAddr { raw: String },
    InvalidOrigin { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidPort { raw } => write!(f, "invalid --port value: {raw}"),
            ArgsError::InvalidAddr { raw } => write!(f, "invalid listen address: {raw}"),
            ArgsError::InvalidOrigin { raw } => write!(f, "invalid ALLOWED_ORIGIN entry: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "serve" => Some(Self::Serve),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    host: String,
    port: u16,
    seed: bool,
    force: bool,
    allowed_origins: Vec<String>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- serve [--db <sqlite_url>] [--host <host>] [--port <port>] [--seed]");
    eprintln!("  cargo run -p app -- seed  [--db <sqlite_url>] [--force]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --host {DEFAULT_HOST}");
    eprintln!("  --port {DEFAULT_PORT}");
    eprintln!();
    eprintln!("Environment (.env is loaded if present):");
    eprintln!("  HANJA_DB_URL, HANJA_HOST, HANJA_PORT, ALLOWED_ORIGIN (comma separated), RUST_LOG");
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Args {
    fn from_env() -> Result<Self, ArgsError> {
        let port = match env_value("HANJA_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ArgsError::InvalidPort { raw })?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            db_url: normalize_sqlite_url(
                env_value("HANJA_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.into()),
            ),
            host: env_value("HANJA_HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            seed: false,
            force: false,
            allowed_origins: env_value("ALLOWED_ORIGIN")
                .unwrap_or_default()
                .split(',')
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect(),
        })
    }

    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env()?;

        while let Some(arg) = args.next() {
            match (cmd, arg.as_str()) {
                (_, "--db") => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                (Command::Serve, "--host") => parsed.host = require_value(args, "--host")?,
                (Command::Serve, "--port") => {
                    let value = require_value(args, "--port")?;
                    parsed.port = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPort { raw: value.clone() })?;
                }
                (Command::Serve, "--seed") => parsed.seed = true,
                (Command::Seed, "--force") => parsed.force = true,
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn listen_addr(&self) -> Result<SocketAddr, ArgsError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ArgsError::InvalidAddr { raw })
    }

    fn cors(&self) -> Result<CorsLayer, ArgsError> {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if self.allowed_origins.is_empty() {
            return Ok(layer.allow_origin(Any));
        }
        let origins = self
            .allowed_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|_| ArgsError::InvalidOrigin { raw: origin.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(layer.allow_origin(AllowOrigin::list(origins)))
    }
}

/// Relative file paths become absolute `sqlite://` URLs with create-if-missing.
fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("sqlite::memory:") || trimmed.contains("mode=") {
        return trimmed.to_string();
    }
    let path_str = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}?mode=rwc", absolute.display())
}

fn prepare_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: serve when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Serve,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Serve,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(cmd, &mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_dir(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::System).await?;

    match cmd {
        Command::Seed => {
            let inserted = services.seed_samples(parsed.force).await?;
            tracing::info!(db = %parsed.db_url, inserted, "seed finished");
            Ok(())
        }
        Command::Serve => {
            if parsed.seed {
                let inserted = services.seed_samples(false).await?;
                tracing::info!(inserted, "sample catalog checked");
            }
            let addr = parsed.listen_addr()?;
            let app = router(AppState { services }, parsed.cors()?);

            let origins = if parsed.allowed_origins.is_empty() {
                "any".to_string()
            } else {
                parsed.allowed_origins.join(",")
            };
            tracing::info!(%addr, db = %parsed.db_url, allowed_origin = %origins, "hanja server listening");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
