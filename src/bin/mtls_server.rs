//! mTLS server answering every authenticated request with a greeting

use anyhow::{Context, Result};
use clap::Parser;
use mtls_hello::{MtlsServer, ServerSettings};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = mtls_hello::config::DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// Directory the file names below are resolved against
    #[arg(long)]
    cert_dir: Option<PathBuf>,

    /// Server certificate file
    #[arg(long, default_value = "goServer.crt")]
    server_cert: PathBuf,

    /// Server private key file
    #[arg(long, default_value = "goServer.key")]
    server_key: PathBuf,

    /// Server CA bundle
    #[arg(long, default_value = "serverca.pem")]
    server_ca: PathBuf,

    /// CA bundle client certificates must chain to
    #[arg(long, default_value = "deviceca.pem")]
    client_ca: PathBuf,
}

impl Args {
    fn into_settings(self) -> ServerSettings {
        let settings = ServerSettings {
            cert_path: self.server_cert,
            key_path: self.server_key,
            server_ca_path: self.server_ca,
            client_ca_path: self.client_ca,
            listen_addr: self.listen,
        };

        match self.cert_dir {
            Some(dir) => settings.with_base_dir(dir),
            None => settings,
        }
    }
}

#[tokio::main]
async fn main() {
    mtls_hello::init_tracing();

    if let Err(e) = run(Args::parse()).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = args.into_settings();
    info!("Starting mTLS server on {}", settings.listen_addr);

    let server = MtlsServer::bind(&settings)
        .await
        .context("Failed to start mTLS server")?;

    server.serve().await.context("mTLS server stopped")
}
