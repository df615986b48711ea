//! Name-or-id subscription lookup and current-subscription selection.

use tracing::{debug, info};

use crate::certificate;
use crate::config_store::ConfigStore;
use crate::error::{AccountError, Result};
use crate::models::{CredentialMaterial, PublishProfile, Subscription};
use crate::publish_settings;

pub struct SubscriptionResolver<'a> {
    store: &'a ConfigStore,
}

impl<'a> SubscriptionResolver<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        Self { store }
    }

    /// Subscriptions from the stored publish settings; empty if none imported.
    pub async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self.load_profile().await?.subscriptions)
    }

    /// Maps a name or id to a subscription id.
    ///
    /// With no token this is the current subscription, if any. Otherwise names
    /// are tried first (ignoring case), then ids. A token matching neither is
    /// handed back unchanged for the caller to reject further down.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Option<String>> {
        let Some(token) = token else {
            return Ok(self.store.read_config().await?.subscription);
        };

        let profile = self.load_profile().await?;
        let resolved = profile
            .find_by_name(token)
            .or_else(|| profile.find_by_id(token))
            .map(|s| s.id.clone());

        match resolved {
            Some(id) => {
                debug!("Resolved '{}' to subscription {}", token, id);
                Ok(Some(id))
            }
            None => {
                debug!("'{}' matches no known subscription, using it verbatim", token);
                Ok(Some(token.to_string()))
            }
        }
    }

    /// Makes `subscription_id` the current subscription.
    ///
    /// The certificate is decoded before anything is written. The credential
    /// file is written before the config record, and the config record
    /// (endpoint and id together) is the last write, so a failure never leaves
    /// the id pointing at a subscription whose certificate was not stored.
    pub async fn set_current(&self, subscription_id: &str) -> Result<Subscription> {
        let profile = self.load_profile().await?;
        let subscription = profile
            .find_by_id(subscription_id)
            .cloned()
            .ok_or_else(|| AccountError::UnknownSubscription(subscription_id.to_string()))?;

        let material = credential_for(&subscription)?;
        self.activate(&subscription, material.as_ref()).await?;
        Ok(subscription)
    }

    /// Persists endpoint, credential and id for a subscription whose
    /// certificate has already been decoded.
    pub(crate) async fn activate(
        &self,
        subscription: &Subscription,
        material: Option<&CredentialMaterial>,
    ) -> Result<()> {
        let mut config = self.store.read_config().await?;

        if let Some(url) = subscription.service_management_url.as_deref() {
            let current = config.endpoint.as_deref().map(|e| e.trim_end_matches('/'));
            if current != Some(url.trim_end_matches('/')) {
                info!("Switching service management endpoint to {}", url);
                config.endpoint = Some(url.to_string());
            }
        }

        if let Some(material) = material {
            self.store.write_credential_material(material).await?;
        }

        config.subscription = Some(subscription.id.clone());
        self.store.write_config(&config).await?;
        info!(
            "Current subscription is now '{}' ({})",
            subscription.name, subscription.id
        );
        Ok(())
    }

    /// Forgets the current subscription, keeping the endpoint.
    pub(crate) async fn unset_current(&self) -> Result<()> {
        let mut config = self.store.read_config().await?;
        if let Some(previous) = config.subscription.take() {
            info!("Current subscription '{}' is no longer known", previous);
            self.store.write_config(&config).await?;
        }
        Ok(())
    }

    async fn load_profile(&self) -> Result<PublishProfile> {
        match self.store.read_publish_settings_file().await? {
            Some(bytes) => publish_settings::parse(&bytes),
            None => Ok(PublishProfile::default()),
        }
    }
}

/// Decodes the management certificate a subscription carries, if any.
pub(crate) fn credential_for(subscription: &Subscription) -> Result<Option<CredentialMaterial>> {
    subscription
        .management_certificate
        .as_deref()
        .map(certificate::encoded_pfx_to_pem)
        .transpose()
}
