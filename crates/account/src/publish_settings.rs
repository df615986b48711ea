//! Publish-settings document parsing.
//!
//! Two document generations are in circulation:
//!
//! ```xml
//! <!-- schema 1: one certificate for the whole profile -->
//! <PublishData>
//!   <PublishProfile Url="https://management.core.windows.net/" ManagementCertificate="MIIK...">
//!     <Subscription Id="..." Name="..." />
//!   </PublishProfile>
//! </PublishData>
//!
//! <!-- schema 2.0: certificate and endpoint per subscription -->
//! <PublishData>
//!   <PublishProfile SchemaVersion="2.0">
//!     <Subscription Id="..." Name="..." ServiceManagementUrl="..." ManagementCertificate="MIIK..." />
//!   </PublishProfile>
//! </PublishData>
//! ```
//!
//! Both are normalized into a [`PublishProfile`] whose subscriptions each carry
//! their own certificate and endpoint.

use tracing::debug;

use crate::error::{AccountError, Result};
use crate::models::{PublishProfile, Subscription};
use crate::xml::{self, Element};

pub const PUBLISH_DATA: &str = "PublishData";
pub const PUBLISH_PROFILE: &str = "PublishProfile";
pub const SUBSCRIPTION: &str = "Subscription";
pub const SCHEMA_VERSION_2: &str = "2.0";

/// Parses a publish-settings document.
///
/// # Errors
///
/// - [`AccountError::XmlParse`] when the bytes are not well-formed XML
/// - [`AccountError::InvalidPublishSettings`] when the `PublishProfile` element
///   is missing, a schema 1 profile has no `ManagementCertificate`, or a
///   subscription has no `Id`
pub fn parse(xml_bytes: &[u8]) -> Result<PublishProfile> {
    let root = xml::parse_document(xml_bytes)?;
    let profile = locate_profile(&root)?;

    let schema_version = profile.non_empty_attribute("SchemaVersion").map(str::to_string);
    let endpoint_url = profile.non_empty_attribute("Url").map(str::to_string);
    let profile_certificate = profile.non_empty_attribute("ManagementCertificate");

    let is_v2 = schema_version.as_deref() == Some(SCHEMA_VERSION_2);
    if !is_v2 && profile_certificate.is_none() {
        return Err(AccountError::InvalidPublishSettings(
            "PublishProfile has no ManagementCertificate attribute".to_string(),
        ));
    }

    let subscriptions = profile
        .field(SUBSCRIPTION)
        .normalize()
        .into_iter()
        .map(|element| -> Result<Subscription> {
            let mut subscription = subscription_from(element)?;
            if !is_v2 {
                if subscription.management_certificate.is_none() {
                    subscription.management_certificate = profile_certificate.map(str::to_string);
                }
                if subscription.service_management_url.is_none() {
                    subscription.service_management_url = endpoint_url.clone();
                }
            }
            Ok(subscription)
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Parsed publish settings (schema {}) with {} subscription(s)",
        schema_version.as_deref().unwrap_or("1"),
        subscriptions.len()
    );

    Ok(PublishProfile {
        endpoint_url,
        schema_version,
        subscriptions,
    })
}

fn locate_profile(root: &Element) -> Result<&Element> {
    if root.name == PUBLISH_PROFILE {
        return Ok(root);
    }
    if root.name == PUBLISH_DATA {
        if let Some(profile) = root.field(PUBLISH_PROFILE).normalize().into_iter().next() {
            return Ok(profile);
        }
    }
    Err(AccountError::InvalidPublishSettings(format!(
        "expected a {} element, found <{}>",
        PUBLISH_PROFILE, root.name
    )))
}

fn subscription_from(element: &Element) -> Result<Subscription> {
    let id = element.non_empty_attribute("Id").ok_or_else(|| {
        AccountError::InvalidPublishSettings("Subscription element has no Id".to_string())
    })?;
    let name = element.non_empty_attribute("Name").unwrap_or(id);

    Ok(Subscription {
        id: id.to_string(),
        name: name.to_string(),
        management_certificate: element
            .non_empty_attribute("ManagementCertificate")
            .map(str::to_string),
        service_management_url: element
            .non_empty_attribute("ServiceManagementUrl")
            .map(str::to_string),
    })
}
