//! Error types for the mTLS client and server

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for mTLS operations
#[derive(Error, Debug)]
pub enum Error {
    /// Credential file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// PEM input held no usable certificate
    #[error("invalid certificate data in {0}")]
    InvalidCertificateData(String),

    /// PEM input held no usable private key
    #[error("invalid private key in {0}")]
    InvalidPrivateKey(String),

    /// Certificate file held no certificate for an identity
    #[error("no certificate found in {0}")]
    MissingCertificate(String),

    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// Expected server name is not a valid DNS name or IP address
    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    /// Target URL is unusable
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// URL as given
        url: String,
        /// What is wrong with it
        reason: String,
    },

    /// TCP connection to the peer failed
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address that was dialed
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the listener was bound to
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// TLS handshake failed
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    /// Peer certificate chain did not verify
    #[error("certificate verification failed: {0}")]
    Verification(#[from] rustls::Error),

    /// HTTP exchange failed
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// Network or I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a Tls error with detailed message
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }

    /// Create an InvalidUrl error
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from reading a file rather than parsing it
    pub fn is_read_error(&self) -> bool {
        matches!(self, Self::Read { .. })
    }
}
