use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use greeter_proto::config::DEFAULT_LISTEN_ADDR;
use greeter_proto::tls::build_server_tls_config;
use greeter_proto::tls::ticketer::parse_ticket_key;
use greeter_proto::{load_credentials, CertPaths};
use greeter_server_core::{GreeterService, ServerEndpoint};
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Key used when none is configured. Anyone holding it can forge tickets.
const DEMO_TICKET_KEY: &str = "abcdefghijklmnopqrstuvwxyz012345";

/// Serve `helloworld.Greeter` over TLS, reporting whether each caller
/// resumed an earlier session.
#[derive(Parser, Debug)]
#[command(name = "greeter-server")]
#[command(version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "GREETER_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// Root CA bundle used to verify client certificates [default: ../certs/CAcert.pem]
    #[arg(long, env = "GREETER_CA")]
    ca: Option<PathBuf>,

    /// Server certificate [default: ../certs/server.crt]
    #[arg(long, env = "GREETER_CERT")]
    cert: Option<PathBuf>,

    /// Server private key [default: ../certs/server.pem]
    #[arg(long, env = "GREETER_KEY")]
    key: Option<PathBuf>,

    /// 32-byte key sealing session tickets.
    #[arg(long, env = "GREETER_TICKET_KEY", hide_env_values = true)]
    ticket_key: Option<String>,
}

impl Args {
    fn cert_paths(&self) -> CertPaths {
        let defaults = CertPaths::server_default();
        CertPaths::new(
            self.ca.clone().unwrap_or(defaults.ca),
            self.cert.clone().unwrap_or(defaults.cert),
            self.key.clone().unwrap_or(defaults.key),
        )
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let paths = args.cert_paths();
    let creds = load_credentials(&paths).context("could not load server credentials")?;

    let raw_key = match &args.ticket_key {
        Some(key) => key.as_str(),
        None => {
            warn!("no ticket key configured, using the built-in demo key");
            DEMO_TICKET_KEY
        }
    };
    let ticket_key = parse_ticket_key(raw_key).context("invalid ticket key")?;

    let policy =
        build_server_tls_config(&creds, &ticket_key).context("could not build server TLS policy")?;

    let server = ServerEndpoint::bind(&args.listen, &policy, GreeterService)
        .await
        .context("failed to listen")?;

    server.serve().await.context("failed to serve")
}
