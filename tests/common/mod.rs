use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use std::path::Path;

pub struct Ca {
    cert: Certificate,
    key: KeyPair,
}

impl Ca {
    pub fn new(name: &str) -> Self {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.distinguished_name.push(DnType::CommonName, name);
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];

        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        Ca { cert, key }
    }

    pub fn pem(&self) -> String {
        self.cert.pem()
    }

    /// Write a leaf signed by this CA to `<dir>/<stem>.crt` and `<dir>/<stem>.key`
    pub fn write_leaf(&self, dir: &Path, stem: &str, name: &str, usage: ExtendedKeyUsagePurpose) {
        let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, name);
        params.extended_key_usages.push(usage);

        let key = KeyPair::generate().unwrap();
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();

        std::fs::write(dir.join(format!("{stem}.crt")), cert.pem()).unwrap();
        std::fs::write(dir.join(format!("{stem}.key")), key.serialize_pem()).unwrap();
    }
}

/// Credentials laid out with the file names both programs expect by default
pub struct Pki {
    pub dir: tempfile::TempDir,
    pub server_ca: Ca,
    pub device_ca: Ca,
}

impl Pki {
    /// Server certificate for `server_dns`, client certificate signed by `device_ca`
    pub fn new(server_dns: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let server_ca = Ca::new("Server CA");
        let device_ca = Ca::new("Device CA");

        server_ca.write_leaf(dir.path(), "goServer", server_dns, ExtendedKeyUsagePurpose::ServerAuth);
        device_ca.write_leaf(dir.path(), "goClient", "goClient", ExtendedKeyUsagePurpose::ClientAuth);

        std::fs::write(dir.path().join("serverca.pem"), server_ca.pem()).unwrap();
        std::fs::write(dir.path().join("deviceca.pem"), device_ca.pem()).unwrap();

        Pki {
            dir,
            server_ca,
            device_ca,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, file: &str, contents: impl AsRef<[u8]>) {
        std::fs::write(self.path().join(file), contents).unwrap();
    }
}
