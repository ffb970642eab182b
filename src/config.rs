//! Settings for the client and server programs
//!
//! Defaults reproduce the fixed file names, address and server name the
//! demo has always used, so both programs run without any flags.

use std::path::PathBuf;

/// Default listen address of the server
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8443";
/// Default URL requested by the client
pub const DEFAULT_URL: &str = "https://localhost:8443/";
/// Default name the client expects on the server certificate
pub const DEFAULT_SERVER_NAME: &str = "goServer";

/// Settings for [`crate::MtlsClient`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    /// Client certificate (PEM)
    pub cert_path: PathBuf,
    /// Client private key (PEM)
    pub key_path: PathBuf,
    /// CA bundle used to verify the server (PEM)
    pub server_ca_path: PathBuf,
    /// Name verified against the server certificate; may differ from the URL host
    pub server_name: String,
    /// `https` URL to fetch
    pub url: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            cert_path: PathBuf::from("goClient.crt"),
            key_path: PathBuf::from("goClient.key"),
            server_ca_path: PathBuf::from("serverca.pem"),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            url: DEFAULT_URL.to_string(),
        }
    }
}

impl ClientSettings {
    /// Resolve every relative file path against `dir`
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.cert_path = dir.join(&self.cert_path);
        self.key_path = dir.join(&self.key_path);
        self.server_ca_path = dir.join(&self.server_ca_path);
        self
    }
}

/// Settings for [`crate::MtlsServer`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSettings {
    /// Server certificate (PEM)
    pub cert_path: PathBuf,
    /// Server private key (PEM)
    pub key_path: PathBuf,
    /// Server CA bundle (PEM); loaded and retained, not used for verification
    pub server_ca_path: PathBuf,
    /// CA bundle every client certificate must chain to (PEM)
    pub client_ca_path: PathBuf,
    /// TCP address to listen on
    pub listen_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            cert_path: PathBuf::from("goServer.crt"),
            key_path: PathBuf::from("goServer.key"),
            server_ca_path: PathBuf::from("serverca.pem"),
            client_ca_path: PathBuf::from("deviceca.pem"),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

impl ServerSettings {
    /// Resolve every relative file path against `dir`
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.cert_path = dir.join(&self.cert_path);
        self.key_path = dir.join(&self.key_path);
        self.server_ca_path = dir.join(&self.server_ca_path);
        self.client_ca_path = dir.join(&self.client_ca_path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_defaults_match_fixed_file_names() {
        let client = ClientSettings::default();
        assert_eq!(client.cert_path, Path::new("goClient.crt"));
        assert_eq!(client.key_path, Path::new("goClient.key"));
        assert_eq!(client.server_ca_path, Path::new("serverca.pem"));
        assert_eq!(client.server_name, "goServer");
        assert_eq!(client.url, "https://localhost:8443/");

        let server = ServerSettings::default();
        assert_eq!(server.cert_path, Path::new("goServer.crt"));
        assert_eq!(server.client_ca_path, Path::new("deviceca.pem"));
        assert_eq!(server.listen_addr, "0.0.0.0:8443");
    }

    #[test]
    fn test_base_dir_keeps_absolute_paths() {
        let mut server = ServerSettings::default();
        server.cert_path = PathBuf::from("/etc/tls/server.crt");

        let server = server.with_base_dir("certs");
        assert_eq!(server.cert_path, Path::new("/etc/tls/server.crt"));
        assert_eq!(server.client_ca_path, Path::new("certs/deviceca.pem"));
    }
}
