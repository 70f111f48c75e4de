//! Read identity fields out of X.509 DER certificates.
//!
//! Used when loading credentials (to reject PEM blocks that are not X.509)
//! and on the server to describe the peer that presented a client
//! certificate.
//!
//! Reference: `x509-parser` crate (rusticata, MIT/Apache-2.0)

use x509_parser::prelude::*;

use crate::error::{ProtoError, Result};

fn parse(cert_der: &[u8]) -> Result<X509Certificate<'_>> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| ProtoError::CertificateInspection(format!("X.509 parse error: {e}")))?;
    Ok(cert)
}

/// The certificate subject as an RFC 4514 string, e.g. `CN=server`.
pub fn subject_name(cert_der: &[u8]) -> Result<String> {
    Ok(parse(cert_der)?.subject().to_string())
}

/// The first common name in the certificate subject, if any.
pub fn common_name(cert_der: &[u8]) -> Result<Option<String>> {
    let cert = parse(cert_der)?;
    let cn = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_owned);
    Ok(cn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestPki;

    #[test]
    fn reads_leaf_common_name() {
        let pki = TestPki::generate();
        let cn = common_name(pki.client_cert_der()).expect("parse should succeed");
        assert_eq!(cn.as_deref(), Some("client"));
    }

    #[test]
    fn subject_contains_common_name() {
        let pki = TestPki::generate();
        let subject = subject_name(pki.server_cert_der()).expect("parse should succeed");
        assert!(subject.contains("CN=server"), "subject was {subject}");
    }

    #[test]
    fn rejects_garbage_input() {
        assert!(subject_name(b"not a certificate").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(common_name(b"").is_err());
    }
}
