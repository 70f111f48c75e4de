use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use greeter_client_core::ClientEndpoint;
use greeter_proto::config::{
    DEFAULT_NAME, DEFAULT_SERVER_ADDR, DEFAULT_SERVER_NAME, DEFAULT_SESSION_CACHE_CAPACITY,
};
use greeter_proto::credentials::load_trust_store;
use greeter_proto::tls::{build_anonymous_client_tls_config, build_client_tls_config};
use greeter_proto::{load_credentials, CertPaths};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Greet a server twice over mutual TLS and report whether the second
/// connection resumed the first one's session.
#[derive(Parser, Debug)]
#[command(name = "greeter-client")]
#[command(version, about)]
struct Args {
    /// Name to greet.
    #[arg(default_value = DEFAULT_NAME)]
    name: String,

    /// Server address to dial.
    #[arg(long, env = "GREETER_ADDR", default_value = DEFAULT_SERVER_ADDR)]
    addr: String,

    /// Identity expected in the server certificate.
    #[arg(long, env = "GREETER_SERVER_NAME", default_value = DEFAULT_SERVER_NAME)]
    server_name: String,

    /// Root CA bundle [default: ../certs/CAcert.pem]
    #[arg(long, env = "GREETER_CA")]
    ca: Option<PathBuf>,

    /// Client certificate [default: ../certs/client.crt]
    #[arg(long, env = "GREETER_CERT")]
    cert: Option<PathBuf>,

    /// Client private key [default: ../certs/client.pem]
    #[arg(long, env = "GREETER_KEY")]
    key: Option<PathBuf>,

    /// Deadline for each call, in milliseconds.
    #[arg(long, env = "GREETER_TIMEOUT_MS", default_value_t = 1000)]
    timeout_ms: u64,

    /// Verify the server but present no client certificate.
    #[arg(long)]
    no_client_cert: bool,

    /// Number of servers whose sessions are cached.
    #[arg(long, default_value_t = DEFAULT_SESSION_CACHE_CAPACITY)]
    session_cache: usize,
}

impl Args {
    fn cert_paths(&self) -> CertPaths {
        let defaults = CertPaths::client_default();
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
    let policy = if args.no_client_cert {
        let roots = load_trust_store(&paths.ca).context("could not load root CA bundle")?;
        build_anonymous_client_tls_config(&Arc::new(roots), &args.server_name, args.session_cache)
    } else {
        let creds = load_credentials(&paths).context("could not load client credentials")?;
        build_client_tls_config(&creds, &args.server_name, args.session_cache)
    }
    .context("could not build client TLS policy")?;

    let client =
        ClientEndpoint::new(policy).with_call_timeout(Duration::from_millis(args.timeout_ms));

    // Two independent connections; the second should resume the first.
    for attempt in 1..=2 {
        let reply = client
            .say_hello(&args.addr, &args.name)
            .await
            .with_context(|| format!("could not greet (connection {attempt})"))?;
        info!("Greeting: {}", reply.message);
    }

    Ok(())
}
