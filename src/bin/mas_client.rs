//! MAS client CLI binary.
//!
//! Offline tools around the MAS client session layer.
//!
//! # Commands
//!
//! - `event` - Decode a MAP event report document to JSON
//! - `srm` - Show whether single response mode applies to a request
//! - `config` - Print the effective configuration

use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use mas_client::{
    obex::SrmState, session::negotiate_srm, Config, EventReport, HeaderSet, Request, RequestKind,
    TransportKind, VERSION,
};

#[derive(Parser)]
#[command(name = "mas-client")]
#[command(version = VERSION)]
#[command(about = "Bluetooth MAP client session tools", long_about = None)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a MAP event report to JSON
    Event {
        /// Event report file (or - for stdin)
        input: String,

        /// Output as pretty-printed JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show whether SRM would be enabled for a request
    Srm {
        /// Transport kind (rfcomm, l2cap)
        #[arg(short, long, default_value = "rfcomm")]
        transport: String,

        /// Request kind (e.g. get-message, push-message, set-path)
        #[arg(short, long)]
        request: String,

        /// Config file path (default: user config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Config file path (default: user config dir)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    match cli.command {
        Commands::Event { input, pretty } => cmd_event(&input, pretty),
        Commands::Srm {
            transport,
            request,
            config,
        } => cmd_srm(&transport, &request, config),
        Commands::Config { file } => cmd_config(file),
    }
}

fn cmd_event(input: &str, pretty: bool) -> anyhow::Result<()> {
    let data = read_input(input)?;

    let report = match EventReport::try_from_reader(data.as_slice()) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("No event report: {e}");
            std::process::exit(1);
        },
    };

    println!("{}", report.to_json(pretty)?);

    Ok(())
}

fn cmd_srm(transport: &str, request: &str, config: Option<PathBuf>) -> anyhow::Result<()> {
    let kind = TransportKind::from_str(transport)
        .map_err(|_| anyhow::anyhow!("Invalid transport: {transport}. Use: rfcomm, l2cap"))?;
    let request_kind = RequestKind::from_str(request).map_err(|_| {
        let known: Vec<_> = RequestKind::ALL.iter().map(RequestKind::name).collect();
        anyhow::anyhow!("Invalid request: {request}. Use: {}", known.join(", "))
    })?;

    let config = load_config(config)?;
    let mut srm = SrmState {
        capable: config.session.srm && kind.supports_srm(),
        ..SrmState::default()
    };
    let mut req = Request::new(request_kind, HeaderSet::new());
    let enabled = negotiate_srm(&mut srm, &mut req);

    println!(
        "{request_kind} over {kind}: SRM {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn cmd_config(file: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(file)?;
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Explicit file, else the default location if present, overlaid with env.
fn load_config(file: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = file.or_else(|| Config::default_path().filter(|p| p.exists()));

    let base = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            Config::from_file(path)?
        },
        None => Config::default(),
    };

    Ok(base.merge(Config::from_env()))
}

fn read_input(input: &str) -> anyhow::Result<Vec<u8>> {
    if input == "-" {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(std::fs::read(input)?)
    }
}
