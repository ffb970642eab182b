//! HTTPS client that authenticates itself with a certificate

use crate::config::ClientSettings;
use crate::error::{Error, Result};
use crate::identity::{subject_of, Identity};
use crate::mtls::build_client_config;
use crate::trust_store::TrustStore;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::header::HOST;
use hyper::{Method, Request, Response, Uri};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};

/// Client for a single mutually authenticated GET
pub struct MtlsClient {
    connector: TlsConnector,
    /// Name verified against the server certificate
    server_name: ServerName<'static>,
    /// `host:port` actually dialed
    dial_addr: String,
    /// URL authority, sent as the `Host` header
    host: String,
    /// Path and query of the request
    path: String,
    url: String,
}

impl MtlsClient {
    /// Load credentials named by `settings` and prepare the client
    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let identity = Identity::from_pem_files(&settings.cert_path, &settings.key_path)?;
        let server_roots = TrustStore::from_pem_file(&settings.server_ca_path)?;

        Self::new(&identity, &server_roots, &settings.server_name, &settings.url)
    }

    /// Prepare a client from loaded credentials
    ///
    /// `server_name` overrides the URL host for SNI and certificate name
    /// verification; the TCP connection still goes to the URL authority.
    pub fn new(identity: &Identity, server_roots: &TrustStore, server_name: &str, url: &str) -> Result<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| Error::invalid_url(url, e.to_string()))?;

        if uri.scheme_str() != Some("https") {
            return Err(Error::invalid_url(url, "scheme must be https"));
        }
        let authority = uri
            .authority()
            .ok_or_else(|| Error::invalid_url(url, "missing host"))?;

        let server_name = ServerName::try_from(server_name.to_string())
            .map_err(|_| Error::InvalidServerName(server_name.to_string()))?;

        let config = build_client_config(identity, server_roots)?;

        Ok(MtlsClient {
            connector: TlsConnector::from(Arc::new(config)),
            server_name,
            dial_addr: format!("{}:{}", authority.host(), authority.port_u16().unwrap_or(443)),
            host: authority.as_str().to_string(),
            path: uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string()),
            url: url.to_string(),
        })
    }

    /// Address the client dials
    pub fn dial_addr(&self) -> &str {
        &self.dial_addr
    }

    /// Name the server certificate must carry
    pub fn server_name(&self) -> &ServerName<'static> {
        &self.server_name
    }

    /// Issue one GET and return the whole response
    ///
    /// Any status is returned as-is; only transport, handshake and protocol
    /// failures are errors.
    pub async fn get(&self) -> Result<Response<Bytes>> {
        let stream = TcpStream::connect(&self.dial_addr)
            .await
            .map_err(|source| Error::Connect {
                addr: self.dial_addr.clone(),
                source,
            })?;
        debug!("TCP connection established to {}", self.dial_addr);

        let tls_stream = self
            .connector
            .connect(self.server_name.clone(), stream)
            .await
            .map_err(Error::Handshake)?;

        let (_, connection) = tls_stream.get_ref();
        let peer = connection
            .peer_certificates()
            .and_then(|certs| certs.first())
            .and_then(subject_of);
        info!(
            "mTLS handshake with {} complete (server: {})",
            self.dial_addr,
            peer.as_deref().unwrap_or("<unknown>")
        );

        let (mut sender, conn) =
            hyper::client::conn::http1::handshake::<_, Empty<Bytes>>(TokioIo::new(tls_stream)).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!("Connection closed with error: {}", e);
            }
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri(self.path.as_str())
            .header(HOST, self.host.as_str())
            .body(Empty::<Bytes>::new())
            .map_err(|e| Error::invalid_url(&self.url, e.to_string()))?;

        let response = sender.send_request(request).await?;
        let (parts, body) = response.into_parts();
        let body = body.collect().await?.to_bytes();

        debug!("GET {} -> {} ({} bytes)", self.url, parts.status, body.len());
        Ok(Response::from_parts(parts, body))
    }
}
