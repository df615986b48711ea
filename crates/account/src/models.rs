use serde::{Deserialize, Serialize};

/// Endpoint used when neither the config nor the imported profile names one.
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.core.windows.net";

/// Unicode-aware case-insensitive equality, without allocating.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// A subscription declared in a publish-settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    /// Base64 encoded PKCS#12 container.
    pub management_certificate: Option<String>,
    pub service_management_url: Option<String>,
}

impl Subscription {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            management_certificate: None,
            service_management_url: None,
        }
    }

    pub fn with_certificate(mut self, certificate: impl Into<String>) -> Self {
        self.management_certificate = Some(certificate.into());
        self
    }

    pub fn with_service_management_url(mut self, url: impl Into<String>) -> Self {
        self.service_management_url = Some(url.into());
        self
    }

    /// Case-insensitive name comparison.
    pub fn name_matches(&self, name: &str) -> bool {
        eq_ignore_case(&self.name, name)
    }
}

/// Root of a parsed publish-settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishProfile {
    pub endpoint_url: Option<String>,
    pub schema_version: Option<String>,
    pub subscriptions: Vec<Subscription>,
}

impl PublishProfile {
    pub fn find_by_name(&self, name: &str) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.name_matches(name))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.id == id)
    }
}

/// The small key/value record kept in `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

impl PersistedConfig {
    pub fn effective_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or(DEFAULT_MANAGEMENT_ENDPOINT)
    }

    pub fn is_empty(&self) -> bool {
        self.endpoint.is_none() && self.subscription.is_none()
    }
}

/// PEM encoded private key and certificate derived from a PFX container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialMaterial {
    pub key: String,
    pub cert: String,
}

impl CredentialMaterial {
    /// Key first, then certificate, as stored on disk.
    pub fn to_pem_string(&self) -> String {
        let mut out = String::with_capacity(self.key.len() + self.cert.len() + 1);
        out.push_str(&self.key);
        if !self.key.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.cert);
        out
    }
}
