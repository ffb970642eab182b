//! Certificate and private key pairs presented during the handshake

use crate::error::{Error, Result};
use crate::mtls::crypto_provider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::fs;
use std::path::Path;
use tracing::info;
use x509_parser::prelude::*;

/// X.509 certificate chain plus the private key for its leaf
#[derive(Debug)]
pub struct Identity {
    /// Certificate chain, leaf first
    cert_chain: Vec<CertificateDer<'static>>,
    /// Private key matching the leaf
    private_key: PrivateKeyDer<'static>,
}

impl Clone for Identity {
    fn clone(&self) -> Self {
        Identity {
            cert_chain: self.cert_chain.clone(),
            private_key: self.private_key.clone_key(),
        }
    }
}

impl Identity {
    /// Create an identity from an already decoded chain and key
    pub fn new(
        cert_chain: Vec<CertificateDer<'static>>,
        private_key: PrivateKeyDer<'static>,
    ) -> Result<Self> {
        if cert_chain.is_empty() {
            return Err(Error::MissingCertificate("certificate chain".into()));
        }

        // Reject keys the crypto provider cannot sign with
        crypto_provider()
            .key_provider
            .load_private_key(private_key.clone_key())
            .map_err(|e| Error::InvalidPrivateKey(e.to_string()))?;

        Ok(Identity {
            cert_chain,
            private_key,
        })
    }

    /// Load an identity from a PEM certificate file and a PEM key file
    pub fn from_pem_files(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<Self> {
        let cert_path = cert_path.as_ref();
        let key_path = key_path.as_ref();

        let cert_pem = read_file(cert_path)?;
        let key_pem = read_file(key_path)?;

        let identity = Self::from_pem(
            &cert_path.display().to_string(),
            &cert_pem,
            &key_path.display().to_string(),
            &key_pem,
        )?;

        info!(
            "Loaded certificate {} (subject: {})",
            cert_path.display(),
            identity.subject().unwrap_or_else(|| "<unparsed>".into())
        );
        Ok(identity)
    }

    /// Decode an identity from PEM bytes; the labels only name errors
    pub fn from_pem(cert_label: &str, cert_pem: &[u8], key_label: &str, key_pem: &[u8]) -> Result<Self> {
        let cert_chain = rustls_pemfile::certs(&mut &cert_pem[..])
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidCertificateData(cert_label.to_string()))?;
        if cert_chain.is_empty() {
            return Err(Error::MissingCertificate(cert_label.to_string()));
        }

        let private_key = rustls_pemfile::private_key(&mut &key_pem[..])
            .map_err(|_| Error::InvalidPrivateKey(key_label.to_string()))?
            .ok_or_else(|| Error::InvalidPrivateKey(key_label.to_string()))?;

        Self::new(cert_chain, private_key)
    }

    /// Get the certificate chain
    pub fn cert_chain(&self) -> &[CertificateDer<'static>] {
        &self.cert_chain
    }

    /// Get the leaf certificate
    pub fn leaf_cert(&self) -> &CertificateDer<'static> {
        &self.cert_chain[0]
    }

    /// Get the private key
    pub fn private_key(&self) -> &PrivateKeyDer<'static> {
        &self.private_key
    }

    /// Subject distinguished name of the leaf, if it parses
    pub fn subject(&self) -> Option<String> {
        subject_of(self.leaf_cert())
    }
}

/// Render the subject DN of a DER certificate
pub fn subject_of(cert: &CertificateDer<'_>) -> Option<String> {
    X509Certificate::from_der(cert.as_ref())
        .ok()
        .map(|(_, parsed)| parsed.subject().to_string())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pki::TestCa;

    #[test]
    fn test_identity_from_pem() {
        let ca = TestCa::new("Device CA");
        let (cert_pem, key_pem) = ca.issue_client("goClient");

        let identity =
            Identity::from_pem("goClient.crt", cert_pem.as_bytes(), "goClient.key", key_pem.as_bytes())
                .unwrap();

        assert_eq!(identity.cert_chain().len(), 1);
        assert!(identity.subject().unwrap().contains("CN=goClient"));
    }

    #[test]
    fn test_full_chain_is_kept_in_order() {
        let ca = TestCa::new("Device CA");
        let (cert_pem, key_pem) = ca.issue_client("goClient");
        let chain = format!("{}{}", cert_pem, ca.cert_pem());

        let identity =
            Identity::from_pem("chain", chain.as_bytes(), "key", key_pem.as_bytes()).unwrap();

        assert_eq!(identity.cert_chain().len(), 2);
        assert!(identity.subject().unwrap().contains("goClient"));
    }

    #[test]
    fn test_missing_certificate() {
        let ca = TestCa::new("Device CA");
        let (_, key_pem) = ca.issue_client("goClient");

        let result = Identity::from_pem("empty.crt", b"", "goClient.key", key_pem.as_bytes());
        assert!(matches!(result, Err(Error::MissingCertificate(ref s)) if s == "empty.crt"));
    }

    #[test]
    fn test_missing_private_key() {
        let ca = TestCa::new("Device CA");
        let (cert_pem, _) = ca.issue_client("goClient");

        let result = Identity::from_pem("goClient.crt", cert_pem.as_bytes(), "cert-as-key", cert_pem.as_bytes());
        assert!(matches!(result, Err(Error::InvalidPrivateKey(_))));
    }

    #[test]
    fn test_empty_chain_rejected() {
        let ca = TestCa::new("Device CA");
        let (_, key_pem) = ca.issue_client("goClient");
        let key = rustls_pemfile::private_key(&mut key_pem.as_bytes())
            .unwrap()
            .unwrap();

        assert!(Identity::new(Vec::new(), key).is_err());
    }

    #[test]
    fn test_from_pem_files_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let cert_path = dir.path().join("goServer.crt");
        let key_path = dir.path().join("goServer.key");

        let ca = TestCa::new("Server CA");
        let (cert_pem, key_pem) = ca.issue_server("goServer");
        std::fs::write(&cert_path, cert_pem).unwrap();

        let err = Identity::from_pem_files(&cert_path, &key_path).unwrap_err();
        assert!(err.is_read_error());
        assert!(err.to_string().contains("goServer.key"));

        std::fs::write(&key_path, key_pem).unwrap();
        let identity = Identity::from_pem_files(&cert_path, &key_path).unwrap();
        assert!(identity.subject().unwrap().contains("goServer"));
    }
}
