use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fincalc::api::{AppState, Calculator, run_calculator, run_http_server};
use fincalc::config::{ConfigOverrides, LogLevel, build_config};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Personal-finance calculators over HTTP or the command line
#[derive(Parser, Debug)]
#[command(name = "fincalc", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "FINCALC_LOG_LEVEL", global = true, value_enum, ignore_case = true)]
    log_level: Option<LogLevel>,

    /// Live exchange-rate endpoint
    #[arg(long, env = "FINCALC_RATES_ENDPOINT", global = true)]
    rates_endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API
    Serve {
        /// Host address to bind to
        #[arg(long, env = "FINCALC_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "FINCALC_PORT")]
        port: Option<u16>,
    },
    /// Run one calculator and print its JSON result
    Calc {
        #[arg(value_enum)]
        calculator: Calculator,

        /// JSON payload; `-` reads it from stdin
        #[arg(default_value = "{}")]
        payload: String,
    },
}

fn init_tracing(level: LevelFilter) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut overrides = ConfigOverrides {
        config_file: cli.global.config,
        log_level: cli.global.log_level,
        rates_endpoint: cli.global.rates_endpoint,
        ..ConfigOverrides::default()
    };
    if let Command::Serve { host, port } = &cli.command {
        overrides.host = host.clone();
        overrides.port = *port;
    }
    let config = build_config(&overrides)?;
    init_tracing(config.log_level.into());

    match cli.command {
        Command::Serve { .. } => {
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                host = %config.host,
                port = %config.port,
                log_level = ?config.log_level,
                rates_endpoint = %config.rates_endpoint,
                "configuration loaded"
            );
            run_http_server(&config).await?;
        }
        Command::Calc {
            calculator,
            payload,
        } => {
            let payload = if payload == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                payload
            };
            let state = AppState::from_config(&config)?;
            match run_calculator(&state, calculator, &payload).await {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
