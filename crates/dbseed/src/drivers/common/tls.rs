//! TLS settings derived from the `ssl_mode` configuration value.
//!
//! PostgreSQL gets a rustls connector; SQL Server maps the same modes onto
//! tiberius encryption settings in its own driver.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, warn};

use crate::error::{Result, SeedError};

/// Transport security requested for a target, named after libpq's `sslmode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Plain TCP.
    Disable,
    /// Encrypt, but accept any server certificate.
    #[default]
    Require,
    /// Encrypt and verify the certificate chain.
    VerifyCa,
    /// Encrypt and verify the certificate chain and host name.
    VerifyFull,
}

impl SslMode {
    /// Parse an `ssl_mode` value (case-insensitive).
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(SeedError::Config(format!(
                "Invalid ssl_mode '{}'. Valid values: disable, require, verify-ca, verify-full",
                other
            ))),
        }
    }

    /// Whether the connection is encrypted at all.
    pub fn encrypts(&self) -> bool {
        !matches!(self, SslMode::Disable)
    }

    /// Whether the server certificate is checked against trusted roots.
    pub fn verifies_certificate(&self) -> bool {
        matches!(self, SslMode::VerifyCa | SslMode::VerifyFull)
    }
}

/// Builds rustls client settings for an [`SslMode`].
pub struct TlsBuilder {
    ssl_mode: SslMode,
}

impl TlsBuilder {
    pub fn new(ssl_mode: SslMode) -> Self {
        Self { ssl_mode }
    }

    /// Create a builder from an `ssl_mode` string.
    pub fn parse(ssl_mode: &str) -> Result<Self> {
        Ok(Self::new(SslMode::parse(ssl_mode)?))
    }

    /// Connector for tokio-postgres, or `None` when TLS is disabled.
    pub fn postgres_connector(&self) -> Result<Option<MakeRustlsConnect>> {
        if !self.ssl_mode.encrypts() {
            return Ok(None);
        }
        Ok(Some(MakeRustlsConnect::new(self.client_config()?)))
    }

    /// The rustls client configuration for an encrypting mode.
    pub fn client_config(&self) -> Result<ClientConfig> {
        match self.ssl_mode {
            SslMode::Disable => Err(SeedError::Config(
                "ssl_mode=disable has no TLS configuration".into(),
            )),
            SslMode::Require => {
                warn!(
                    "ssl_mode=require encrypts the connection but does not verify the server \
                     certificate; use verify-full outside of test environments"
                );
                Ok(ClientConfig::builder()
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
                    .with_no_client_auth())
            }
            SslMode::VerifyCa | SslMode::VerifyFull => {
                if self.ssl_mode == SslMode::VerifyCa {
                    warn!("ssl_mode=verify-ca also verifies the host name with rustls");
                }
                debug!("Verifying server certificate against webpki roots");
                let mut roots = rustls::RootCertStore::empty();
                roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                Ok(ClientConfig::builder()
                    .with_root_certificates(roots)
                    .with_no_client_auth())
            }
        }
    }
}

/// Certificate verifier for `ssl_mode=require`: every certificate passes.
#[derive(Debug)]
struct AcceptAnyCertificate;

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}
