//! Credential import.
//!
//! An imported file is one of three things, told apart by its first bytes:
//!
//! | Starts with   | Treated as                                     |
//! |---------------|------------------------------------------------|
//! | `-----BEGIN`  | PEM text holding a private key and certificate |
//! | `<`           | a publish-settings document                    |
//! | anything else | a raw PKCS#12 container                        |
//!
//! A leading UTF-8 byte order mark and whitespace are skipped before probing.
//! Once a file is classified as XML, XML errors are reported as such rather
//! than retried as PKCS#12.

use std::path::Path;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::certificate;
use crate::config_store::ConfigStore;
use crate::error::{AccountError, Result};
use crate::models::Subscription;
use crate::publish_settings;
use crate::registrar::{RegistrationReport, ResourceTypeRegistrar, ResourceTypeRegistry};
use crate::resolver::{SubscriptionResolver, credential_for};
use crate::transport::ServiceManagement;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    PemPair,
    PublishSettings,
    Pfx,
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialKind::PemPair => write!(f, "PEM certificate"),
            CredentialKind::PublishSettings => write!(f, "publish settings"),
            CredentialKind::Pfx => write!(f, "PKCS#12 certificate"),
        }
    }
}

/// Classifies credential bytes by their leading content.
pub fn detect_kind(bytes: &[u8]) -> CredentialKind {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let content = &bytes[start..];

    if content.starts_with(b"-----BEGIN") {
        CredentialKind::PemPair
    } else if content.starts_with(b"<") {
        CredentialKind::PublishSettings
    } else {
        CredentialKind::Pfx
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub skip_register: bool,
}

/// What happened to resource-provider registration during an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStatus {
    /// Nothing to register for, or registration was suppressed.
    Skipped,
    Completed(RegistrationReport),
    /// Listing failed; no provider was registered.
    Aborted(String),
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub kind: CredentialKind,
    pub subscriptions: Vec<Subscription>,
    pub current_subscription: Option<Subscription>,
    pub registration: RegistrationStatus,
}

impl ImportReport {
    fn credential_only(kind: CredentialKind) -> Self {
        Self {
            kind,
            subscriptions: Vec::new(),
            current_subscription: None,
            registration: RegistrationStatus::Skipped,
        }
    }
}

pub struct CredentialImporter<'a> {
    store: &'a ConfigStore,
    registry: &'a ResourceTypeRegistry,
    transport: &'a dyn ServiceManagement,
}

impl<'a> CredentialImporter<'a> {
    pub fn new(
        store: &'a ConfigStore,
        registry: &'a ResourceTypeRegistry,
        transport: &'a dyn ServiceManagement,
    ) -> Self {
        Self {
            store,
            registry,
            transport,
        }
    }

    pub async fn import_file<P: AsRef<Path>>(
        &self,
        path: P,
        options: ImportOptions,
    ) -> Result<ImportReport> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .await
            .map_err(|e| AccountError::io_operation("read credential file", path, e))?;
        debug!("Importing {} ({} bytes)", path.display(), bytes.len());
        self.import_bytes(&bytes, options).await
    }

    pub async fn import_bytes(&self, bytes: &[u8], options: ImportOptions) -> Result<ImportReport> {
        let kind = detect_kind(bytes);
        debug!("Detected {}", kind);

        match kind {
            CredentialKind::PemPair => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    AccountError::CertificateFormat(format!("PEM file is not valid UTF-8: {}", e))
                })?;
                let material = certificate::split_pem_pair(text).ok_or_else(|| {
                    AccountError::CertificateFormat(
                        "PEM file must contain a private key and a certificate".to_string(),
                    )
                })?;
                self.store.write_credential_material(&material).await?;
                info!("Imported management certificate from PEM");
                Ok(ImportReport::credential_only(kind))
            }
            CredentialKind::Pfx => {
                let material = certificate::pfx_to_pem(bytes)?;
                self.store.write_credential_material(&material).await?;
                info!("Imported management certificate from PKCS#12");
                Ok(ImportReport::credential_only(kind))
            }
            CredentialKind::PublishSettings => self.import_publish_settings(bytes, options).await,
        }
    }

    async fn import_publish_settings(
        &self,
        bytes: &[u8],
        options: ImportOptions,
    ) -> Result<ImportReport> {
        let profile = publish_settings::parse(bytes)?;
        let resolver = SubscriptionResolver::new(self.store);

        let Some(first) = profile.subscriptions.first() else {
            self.store.write_publish_settings_file(bytes).await?;
            resolver.unset_current().await?;
            warn!("The publish settings file contains no subscriptions");
            return Ok(ImportReport {
                kind: CredentialKind::PublishSettings,
                subscriptions: Vec::new(),
                current_subscription: None,
                registration: RegistrationStatus::Skipped,
            });
        };

        // Decode before replacing anything on disk.
        let material = credential_for(first)?;
        self.store.write_publish_settings_file(bytes).await?;
        resolver.activate(first, material.as_ref()).await?;
        let current = first.clone();

        let registration = if options.skip_register {
            debug!("Resource provider registration skipped on request");
            RegistrationStatus::Skipped
        } else {
            self.register(&current.id).await
        };

        Ok(ImportReport {
            kind: CredentialKind::PublishSettings,
            subscriptions: profile.subscriptions,
            current_subscription: Some(current),
            registration,
        })
    }

    async fn register(&self, subscription_id: &str) -> RegistrationStatus {
        let registrar = ResourceTypeRegistrar::new(self.transport);
        match registrar.register_all(subscription_id, self.registry).await {
            Ok(report) => {
                if let Some(summary) = report.failure_summary() {
                    warn!("Some resource providers could not be registered: {}", summary);
                }
                RegistrationStatus::Completed(report)
            }
            Err(e) => {
                warn!("Resource provider registration aborted: {}", e);
                RegistrationStatus::Aborted(e.to_string())
            }
        }
    }
}
