//! On-disk account state.
//!
//! [`ConfigStore`] owns every file this crate persists inside the configuration
//! directory:
//!
//! - `config.json`: the [`PersistedConfig`] record (endpoint, current subscription)
//! - `publishSettings.xml`: the last imported publish-settings document, verbatim
//! - `managementCertificate.pem`: PEM key and certificate for the current subscription
//!
//! Reads never fail because a file is absent. Writes create the directory on
//! demand. There is no locking; one process is expected to own the directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{AccountError, Result};
use crate::models::{CredentialMaterial, PersistedConfig};

pub const CONFIG_FILE: &str = "config.json";
pub const PUBLISH_SETTINGS_FILE: &str = "publishSettings.xml";
pub const CREDENTIAL_FILE: &str = "managementCertificate.pem";

const LEGACY_PORT_KEY: &str = "port";
const LEGACY_SUBSCRIPTION_KEY: &str = "Subscription";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn publish_settings_path(&self) -> PathBuf {
        self.root.join(PUBLISH_SETTINGS_FILE)
    }

    pub fn credential_path(&self) -> PathBuf {
        self.root.join(CREDENTIAL_FILE)
    }

    /// Loads the config record, upgrading legacy layouts in place.
    ///
    /// A missing or empty file yields [`PersistedConfig::default`]. When a legacy
    /// layout is found the upgraded record is written back before returning.
    pub async fn read_config(&self) -> Result<PersistedConfig> {
        let path = self.config_path();
        let Some(content) = read_optional(&path, "read config").await? else {
            debug!("No config at {}, using defaults", path.display());
            return Ok(PersistedConfig::default());
        };
        let content = String::from_utf8_lossy(&content);
        if content.trim().is_empty() {
            return Ok(PersistedConfig::default());
        }

        let mut raw: Map<String, Value> = serde_json::from_str(&content)?;
        let migrated = migrate_legacy(&mut raw);
        let config: PersistedConfig = serde_json::from_value(Value::Object(raw))?;

        if migrated {
            info!("Upgraded legacy configuration at {}", path.display());
            self.write_config(&config).await?;
        }

        Ok(config)
    }

    pub async fn write_config(&self, config: &PersistedConfig) -> Result<()> {
        self.ensure_root().await?;
        let path = self.config_path();
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&path, content)
            .await
            .map_err(|e| AccountError::io_operation("write config", &path, e))?;
        debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// Returns the stored publish-settings document, if one was imported.
    pub async fn read_publish_settings_file(&self) -> Result<Option<Vec<u8>>> {
        read_optional(&self.publish_settings_path(), "read publish settings").await
    }

    pub async fn write_publish_settings_file(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_root().await?;
        let path = self.publish_settings_path();
        fs::write(&path, bytes)
            .await
            .map_err(|e| AccountError::io_operation("write publish settings", &path, e))?;
        debug!("Publish settings saved to {}", path.display());
        Ok(())
    }

    /// Replaces the credential file. Owner-only permissions on Unix.
    pub async fn write_credential_material(&self, material: &CredentialMaterial) -> Result<()> {
        self.ensure_root().await?;
        let path = self.credential_path();
        fs::write(&path, material.to_pem_string())
            .await
            .map_err(|e| AccountError::io_operation("write credential", &path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| AccountError::io_operation("restrict credential", &path, e))?;
        }

        debug!("Credential material saved to {}", path.display());
        Ok(())
    }

    pub async fn read_credential_material(&self) -> Result<Option<String>> {
        let path = self.credential_path();
        Ok(read_optional(&path, "read credential")
            .await?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Deletes config, credential material and publish settings.
    ///
    /// Returns whether any file was removed. Failures are logged as warnings.
    pub async fn clear(&self) -> bool {
        let mut removed = false;

        for path in [
            self.config_path(),
            self.credential_path(),
            self.publish_settings_path(),
        ] {
            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Removed {}", path.display());
                    removed = true;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        match fs::remove_dir(&self.root).await {
            Ok(()) => debug!("Removed configuration directory {}", self.root.display()),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::DirectoryNotEmpty) => {}
            Err(e) => warn!(
                "Could not remove configuration directory {}: {}",
                self.root.display(),
                e
            ),
        }

        removed
    }

    async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AccountError::io_operation("create config directory", &self.root, e))
    }
}

async fn read_optional(path: &Path, operation: &str) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AccountError::io_operation(operation, path, e)),
    }
}

/// Rewrites legacy keys. Returns true when anything changed.
///
/// Older releases stored a bare host in `endpoint` with the port in a separate
/// `port` key, and used a capitalised `Subscription` key.
fn migrate_legacy(raw: &mut Map<String, Value>) -> bool {
    let mut changed = false;

    let port = raw.remove(LEGACY_PORT_KEY).map(|value| {
        changed = true;
        match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_string(),
            _ => String::new(),
        }
    });

    let upgraded = match raw.get("endpoint") {
        Some(Value::String(endpoint)) => {
            let upgraded = absolute_endpoint(endpoint, port.as_deref().unwrap_or_default());
            (upgraded != *endpoint).then_some(upgraded)
        }
        _ => None,
    };
    if let Some(endpoint) = upgraded {
        raw.insert("endpoint".to_string(), Value::String(endpoint));
        changed = true;
    }

    if raw.remove(LEGACY_SUBSCRIPTION_KEY).is_some() {
        changed = true;
    }

    changed
}

/// Folds a legacy `port` value into the endpoint URL.
///
/// An endpoint that already names a port keeps it. The port is written out
/// even when it is the scheme default, which `Url` serialization would drop.
fn absolute_endpoint(endpoint: &str, port: &str) -> String {
    let endpoint = endpoint.trim();
    let base = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint.trim_end_matches('/'))
    };

    let port = port.trim();
    if port.is_empty() {
        return base;
    }
    let Ok(port) = port.parse::<u16>() else {
        warn!("Ignoring invalid legacy port '{}' for {}", port, base);
        return base;
    };

    let url = match Url::parse(&base) {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot upgrade legacy endpoint '{}': {}", base, e);
            return base;
        }
    };
    let Some(host) = url.host_str() else {
        return base;
    };
    if url.port().is_some() || authority_has_port(&base) {
        return base;
    }

    let mut upgraded = format!("{}://{}:{}", url.scheme(), host, port);
    if url.path() != "/" {
        upgraded.push_str(url.path());
    }
    if let Some(query) = url.query() {
        upgraded.push('?');
        upgraded.push_str(query);
    }
    upgraded
}

/// Whether the authority spells out a port, including a scheme-default one.
fn authority_has_port(url: &str) -> bool {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    host_port
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}
