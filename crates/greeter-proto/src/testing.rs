//! Throwaway PKI for tests: one CA, a `server` leaf and a `client` leaf.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for the integration tests of the client and server crates.

use std::path::Path;

use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose,
};
use tempfile::TempDir;

use crate::config::CertPaths;

/// PEM and DER material for a CA and two leaves it signed.
pub struct TestPki {
    pub ca_pem: String,
    pub server_cert_pem: String,
    pub server_key_pem: String,
    pub client_cert_pem: String,
    pub client_key_pem: String,
    server_cert_der: Vec<u8>,
    client_cert_der: Vec<u8>,
}

impl TestPki {
    /// Generate a fresh CA and sign a server and a client certificate with it.
    ///
    /// The server certificate carries the DNS SAN `server`, matching the
    /// logical name the client verifies against.
    pub fn generate() -> Self {
        let ca_key = KeyPair::generate().expect("CA key");
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "Greeter Test CA");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let ca_cert = ca_params.self_signed(&ca_key).expect("CA cert");

        let leaf = |name: &str, usage: ExtendedKeyUsagePurpose| {
            let key = KeyPair::generate().expect("leaf key");
            let mut params = CertificateParams::new(vec![name.to_string()]).expect("leaf params");
            params.distinguished_name.push(DnType::CommonName, name);
            params.extended_key_usages = vec![usage];
            let cert = params
                .signed_by(&key, &ca_cert, &ca_key)
                .expect("leaf cert");
            (cert, key)
        };

        let (server_cert, server_key) = leaf("server", ExtendedKeyUsagePurpose::ServerAuth);
        let (client_cert, client_key) = leaf("client", ExtendedKeyUsagePurpose::ClientAuth);

        Self {
            ca_pem: ca_cert.pem(),
            server_cert_pem: server_cert.pem(),
            server_key_pem: server_key.serialize_pem(),
            client_cert_pem: client_cert.pem(),
            client_key_pem: client_key.serialize_pem(),
            server_cert_der: server_cert.der().to_vec(),
            client_cert_der: client_cert.der().to_vec(),
        }
    }

    pub fn server_cert_der(&self) -> &[u8] {
        &self.server_cert_der
    }

    pub fn client_cert_der(&self) -> &[u8] {
        &self.client_cert_der
    }

    /// Write the PKI into a temporary directory using the on-disk names the
    /// binaries expect (`CAcert.pem`, `server.crt`, `server.pem`, ...).
    pub fn write_to_tempdir(&self) -> PkiDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let write = |name: &str, contents: &str| {
            std::fs::write(dir.path().join(name), contents).expect("write PEM");
        };
        write("CAcert.pem", &self.ca_pem);
        write("server.crt", &self.server_cert_pem);
        write("server.pem", &self.server_key_pem);
        write("client.crt", &self.client_cert_pem);
        write("client.pem", &self.client_key_pem);
        PkiDir { dir }
    }
}

/// A temporary directory holding a [`TestPki`]. Removed on drop.
pub struct PkiDir {
    dir: TempDir,
}

impl PkiDir {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn client_paths(&self) -> CertPaths {
        let p = self.path();
        CertPaths::new(p.join("CAcert.pem"), p.join("client.crt"), p.join("client.pem"))
    }

    pub fn server_paths(&self) -> CertPaths {
        let p = self.path();
        CertPaths::new(p.join("CAcert.pem"), p.join("server.crt"), p.join("server.pem"))
    }
}
