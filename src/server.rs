//! HTTPS server that only talks to clients holding a trusted certificate

use crate::config::ServerSettings;
use crate::error::{Error, Result};
use crate::identity::{subject_of, Identity};
use crate::mtls::build_server_config;
use crate::trust_store::TrustStore;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

/// Body served for every request
pub const HELLO_BODY: &str = "Hello world!";

/// Bound mTLS listener
pub struct MtlsServer {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    server_roots: TrustStore,
}

impl MtlsServer {
    /// Load every file named by `settings` and bind the listener
    ///
    /// Files are loaded before binding, so bad credentials never leave a
    /// half-started server behind.
    pub async fn bind(settings: &ServerSettings) -> Result<Self> {
        let server_roots = TrustStore::from_pem_file(&settings.server_ca_path)?;
        let client_roots = TrustStore::from_pem_file(&settings.client_ca_path)?;
        let identity = Identity::from_pem_files(&settings.cert_path, &settings.key_path)?;

        Self::bind_with(&identity, &client_roots, server_roots, &settings.listen_addr).await
    }

    /// Bind with credentials that are already loaded
    pub async fn bind_with(
        identity: &Identity,
        client_roots: &TrustStore,
        server_roots: TrustStore,
        addr: &str,
    ) -> Result<Self> {
        let config = build_server_config(identity, client_roots)?;

        let listener = TcpListener::bind(addr).await.map_err(|source| Error::Bind {
            addr: addr.to_string(),
            source,
        })?;
        info!("mTLS server listening on {}", listener.local_addr()?);

        Ok(MtlsServer {
            listener,
            acceptor: TlsAcceptor::from(Arc::new(config)),
            server_roots,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Server CA bundle loaded at startup
    pub fn server_roots(&self) -> &TrustStore {
        &self.server_roots
    }

    /// Accept connections until the task is dropped
    ///
    /// Each connection runs on its own task. Failed handshakes and accept
    /// errors are logged and do not stop the loop.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
            };

            let acceptor = self.acceptor.clone();
            tokio::spawn(async move {
                debug!("Connection from {}", peer_addr);
                if let Err(e) = handle_connection(stream, peer_addr, acceptor).await {
                    warn!("Error handling client {}: {}", peer_addr, e);
                }
            });
        }
    }
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, acceptor: TlsAcceptor) -> Result<()> {
    let tls_stream = acceptor.accept(stream).await.map_err(Error::Handshake)?;

    let (_, connection) = tls_stream.get_ref();
    let subject = connection
        .peer_certificates()
        .and_then(|certs| certs.first())
        .and_then(subject_of);
    info!(
        "Client {} authenticated as {}",
        peer_addr,
        subject.as_deref().unwrap_or("<unknown>")
    );

    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
        debug!("{} {} from {}", req.method(), req.uri(), peer_addr);
        hello(req)
    });

    http1::Builder::new()
        .serve_connection(TokioIo::new(tls_stream), service)
        .await?;

    Ok(())
}

/// Answer any request with the fixed plain-text greeting
pub async fn hello<B>(_req: Request<B>) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let mut response = Response::new(Full::new(Bytes::from_static(HELLO_BODY.as_bytes())));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    Ok(response)
}
