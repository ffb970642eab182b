//! mTLS client performing one authenticated GET

use anyhow::{Context, Result};
use clap::Parser;
use mtls_hello::{ClientSettings, MtlsClient};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL to fetch
    #[arg(short, long, default_value = mtls_hello::config::DEFAULT_URL)]
    url: String,

    /// Name expected on the server certificate
    #[arg(short, long, default_value = mtls_hello::config::DEFAULT_SERVER_NAME)]
    server_name: String,

    /// Directory the file names below are resolved against
    #[arg(long)]
    cert_dir: Option<PathBuf>,

    /// Client certificate file
    #[arg(long, default_value = "goClient.crt")]
    client_cert: PathBuf,

    /// Client private key file
    #[arg(long, default_value = "goClient.key")]
    client_key: PathBuf,

    /// CA bundle the server certificate must chain to
    #[arg(long, default_value = "serverca.pem")]
    server_ca: PathBuf,
}

impl Args {
    fn into_settings(self) -> ClientSettings {
        let settings = ClientSettings {
            cert_path: self.client_cert,
            key_path: self.client_key,
            server_ca_path: self.server_ca,
            server_name: self.server_name,
            url: self.url,
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
    info!("Fetching {} (expecting server {})", settings.url, settings.server_name);

    let client = MtlsClient::from_settings(&settings).context("Failed to load client credentials")?;
    let response = client
        .get()
        .await
        .with_context(|| format!("GET {} failed", settings.url))?;

    info!("{}", String::from_utf8_lossy(response.body()));
    Ok(())
}
