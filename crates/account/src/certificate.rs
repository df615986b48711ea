//! PKCS#12 to PEM conversion for management certificates.
//!
//! Management certificates are delivered as PFX containers, either embedded in
//! publish settings (base64) or as raw files. Calls to the service-management
//! API need the private key and certificate as PEM text, so this module
//! unwraps the container and re-encodes its first key and certificate bags.
//! The containers issued with publish settings are not password protected;
//! an empty password is always used.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{AccountError, Result};
use crate::models::CredentialMaterial;

const PFX_PASSWORD: &str = "";

pub const PRIVATE_KEY_TAG: &str = "PRIVATE KEY";
pub const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Converts raw PKCS#12 bytes into a PEM key and certificate.
///
/// # Errors
///
/// Returns [`AccountError::CertificateFormat`] if:
/// - The bytes are not a PKCS#12 structure
/// - The container cannot be opened with an empty password
/// - No private key or no certificate is present
pub fn pfx_to_pem(pfx_bytes: &[u8]) -> Result<CredentialMaterial> {
    let pfx = p12::PFX::parse(pfx_bytes)
        .map_err(|e| AccountError::CertificateFormat(format!("Failed to parse PKCS#12: {:?}", e)))?;

    let keys = pfx.key_bags(PFX_PASSWORD).map_err(|e| {
        AccountError::CertificateFormat(format!("Failed to extract keys from PKCS#12: {:?}", e))
    })?;
    let certs = pfx.cert_x509_bags(PFX_PASSWORD).map_err(|e| {
        AccountError::CertificateFormat(format!("Failed to extract certs from PKCS#12: {:?}", e))
    })?;

    let key_der = keys
        .into_iter()
        .next()
        .ok_or_else(|| AccountError::CertificateFormat("No private key in PKCS#12".into()))?;
    let cert_der = certs
        .into_iter()
        .next()
        .ok_or_else(|| AccountError::CertificateFormat("No certificate in PKCS#12".into()))?;

    Ok(CredentialMaterial {
        key: pem::encode(&pem::Pem::new(PRIVATE_KEY_TAG, key_der)),
        cert: pem::encode(&pem::Pem::new(CERTIFICATE_TAG, cert_der)),
    })
}

/// Decodes a base64 PFX blob as found in publish settings, then converts it.
pub fn encoded_pfx_to_pem(encoded: &str) -> Result<CredentialMaterial> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes()).map_err(|e| {
        AccountError::CertificateFormat(format!("Management certificate is not valid base64: {}", e))
    })?;
    pfx_to_pem(&bytes)
}

/// Splits PEM text that already holds a private key and a certificate.
///
/// Returns `None` when either block is missing or the text is not PEM.
pub fn split_pem_pair(text: &str) -> Option<CredentialMaterial> {
    let blocks = pem::parse_many(text).ok()?;
    let key = blocks.iter().find(|p| p.tag().ends_with(PRIVATE_KEY_TAG))?;
    let cert = blocks.iter().find(|p| p.tag() == CERTIFICATE_TAG)?;
    Some(CredentialMaterial {
        key: pem::encode(key),
        cert: pem::encode(cert),
    })
}
