use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boar::{server, AppState, Config, Settings};

#[derive(Parser, Debug)]
#[command(name = "boar")]
#[command(about = "A simple CLI to share files through http")]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// File or directory to serve
    #[arg(value_name = "PATH")]
    target: Option<PathBuf>,

    /// The port to listen on
    #[arg(short, long, env = "BOAR_PORT", default_value_t = 8080)]
    port: u16,

    /// Disable the zip download feature
    #[arg(long, visible_alias = "nz", env = "BOAR_NOZIP", value_parser = BoolishValueParser::new())]
    nozip: bool,

    /// Also serve every subdirectory as its own zip
    #[arg(short, long, env = "BOAR_CHILDREN", value_parser = BoolishValueParser::new())]
    children: bool,

    /// Address to bind to (overrides the config file)
    #[arg(short, long, env = "BOAR_BIND")]
    bind: Option<String>,

    /// Config file path (optional)
    #[arg(long, env = "BOAR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, env = "BOAR_VERBOSE", value_parser = BoolishValueParser::new())]
    verbose: bool,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
}

/// Accept the single-dash `-nz` spelling of `--nozip`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut past_separator = false;
    args.into_iter()
        .map(|arg| {
            if arg == "--" {
                past_separator = true;
            }
            if !past_separator && arg == "-nz" {
                OsString::from("--nozip")
            } else {
                arg
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    // Initialize tracing
    let filter = if cli.verbose {
        "boar=debug,tower_http=debug"
    } else {
        "boar=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), boar::BoarError> {
    info!("Boar is running...");

    // Load config from file if provided, otherwise use defaults
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let target = cli.target.unwrap_or_default();
    let settings = Settings::resolve(
        &target,
        cli.port,
        cli.bind.as_deref(),
        cli.nozip,
        cli.children,
        config,
    )?;
    let addr = settings.addr;

    // Listing and archiving finish before anything is bound
    let state = tokio::task::spawn_blocking(move || AppState::prepare(settings))
        .await
        .map_err(|err| boar::BoarError::Io(std::io::Error::other(err.to_string())))??;

    let listener = server::bind(addr).await?;
    server::serve(listener, state, server::shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}
