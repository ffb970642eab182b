//! Mutual-TLS HTTPS client and server
//!
//! Both ends load a certificate/key pair and a CA bundle, then refuse to
//! talk to a peer whose certificate does not chain to that bundle.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod mtls;
pub mod server;
pub mod trust_store;

#[cfg(test)]
mod test_pki;

pub use client::MtlsClient;
pub use config::{ClientSettings, ServerSettings};
pub use error::{Error, Result};
pub use identity::Identity;
pub use server::{MtlsServer, HELLO_BODY};
pub use trust_store::TrustStore;

/// Install a `tracing` subscriber reading `RUST_LOG`, defaulting to `info`
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
