//! rustls configuration for both ends of a mutually authenticated connection

use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::trust_store::TrustStore;
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, ServerConfig};
use std::sync::Arc;
use tracing::debug;

/// Crypto provider shared by every config and verifier in this crate
pub fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Build the client configuration for outbound mTLS connections
///
/// The server is verified against `server_roots`; `identity` is presented
/// when the server asks for a client certificate.
pub fn build_client_config(identity: &Identity, server_roots: &TrustStore) -> Result<ClientConfig> {
    debug!(
        "Building client config with {} trusted server CA(s) from {}",
        server_roots.len(),
        server_roots.source()
    );

    let config = ClientConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::tls(format!("Failed to select protocol versions: {}", e)))?
        .with_root_certificates(server_roots.roots())
        .with_client_auth_cert(identity.cert_chain().to_vec(), identity.private_key().clone_key())
        .map_err(|e| Error::tls(format!("Failed to create client config: {}", e)))?;

    Ok(config)
}

/// Build the server configuration for inbound mTLS connections
///
/// Every client must present a certificate that chains to `client_roots`;
/// anonymous clients fail the handshake.
pub fn build_server_config(identity: &Identity, client_roots: &TrustStore) -> Result<ServerConfig> {
    debug!(
        "Building server config with {} trusted client CA(s) from {}",
        client_roots.len(),
        client_roots.source()
    );

    let client_cert_verifier =
        rustls::server::WebPkiClientVerifier::builder_with_provider(client_roots.roots(), crypto_provider())
            .build()
            .map_err(|e| Error::tls(format!("Failed to create client verifier: {}", e)))?;

    let config = ServerConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::tls(format!("Failed to select protocol versions: {}", e)))?
        .with_client_cert_verifier(client_cert_verifier)
        .with_single_cert(identity.cert_chain().to_vec(), identity.private_key().clone_key())
        .map_err(|e| Error::tls(format!("Failed to create server config: {}", e)))?;

    Ok(config)
}
