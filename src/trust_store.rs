//! Trust stores built from PEM-encoded CA bundles

use crate::error::{Error, Result};
use crate::mtls::crypto_provider;
use rustls::client::danger::ServerCertVerifier;
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::danger::ClientCertVerifier;
use rustls::server::WebPkiClientVerifier;
use rustls::RootCertStore;
use rustls_pemfile::Item;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Immutable set of trusted CA certificates
///
/// A constructed store always holds at least one certificate. Empty or
/// unparseable input is rejected instead of producing a store that trusts
/// nothing.
#[derive(Clone, Debug)]
pub struct TrustStore {
    /// Where the certificates came from (file path or caller label)
    source: String,
    /// Parsed trust anchors
    roots: Arc<RootCertStore>,
}

impl TrustStore {
    /// Load a trust store from a PEM file
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = fs::read(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self::from_pem(path.display().to_string(), &pem)?;
        info!(
            "Loaded {} CA certificate(s) from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Build a trust store from PEM bytes
    ///
    /// Every `CERTIFICATE` block that parses is added; other block types are
    /// ignored and malformed blocks are skipped. `source` only labels errors
    /// and log lines.
    pub fn from_pem(source: impl Into<String>, pem: &[u8]) -> Result<Self> {
        let source = source.into();
        let mut reader = pem;
        let mut certs: Vec<CertificateDer<'static>> = Vec::new();

        loop {
            match rustls_pemfile::read_one(&mut reader) {
                Ok(Some(Item::X509Certificate(cert))) => certs.push(cert),
                Ok(Some(_)) => debug!("Ignoring non-certificate PEM block in {}", source),
                Ok(None) => break,
                Err(e) => warn!("Skipping malformed PEM block in {}: {}", source, e),
            }
        }

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(certs);
        if ignored > 0 {
            warn!("Ignored {} unparseable certificate(s) in {}", ignored, source);
        }

        if added == 0 {
            return Err(Error::InvalidCertificateData(source));
        }

        Ok(TrustStore {
            source,
            roots: Arc::new(roots),
        })
    }

    /// Number of trust anchors
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Always false for a constructed store
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// File path or label this store was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Shared handle to the rustls root store
    pub fn roots(&self) -> Arc<RootCertStore> {
        self.roots.clone()
    }

    /// Verify a server certificate chain and its name against this store
    pub fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
    ) -> Result<()> {
        let verifier = WebPkiServerVerifier::builder_with_provider(self.roots(), crypto_provider())
            .build()
            .map_err(|e| Error::tls(format!("Failed to build server verifier: {}", e)))?;

        verifier.verify_server_cert(end_entity, intermediates, server_name, &[], UnixTime::now())?;
        Ok(())
    }

    /// Verify a client certificate chain against this store
    pub fn verify_client_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
    ) -> Result<()> {
        let verifier = WebPkiClientVerifier::builder_with_provider(self.roots(), crypto_provider())
            .build()
            .map_err(|e| Error::tls(format!("Failed to build client verifier: {}", e)))?;

        verifier.verify_client_cert(end_entity, intermediates, UnixTime::now())?;
        Ok(())
    }
}
