//! HTTP implementation of [`ServiceManagement`].
//!
//! Requests are authenticated with the management certificate held by the
//! [`ConfigStore`]. The client is built on first use, so constructing the
//! transport before an import has written any credential is fine.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Identity, Response, StatusCode};
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use super::{ResourceTypeState, ServiceManagement, TransportError};
use crate::config_store::ConfigStore;
use crate::xml;

pub const API_VERSION: &str = "2012-03-01";
pub const USER_AGENT: &str = concat!("cloudacct/", env!("CARGO_PKG_VERSION"));

struct Connection {
    client: Client,
    endpoint: Url,
}

pub struct HttpServiceManagement {
    store: ConfigStore,
    connection: OnceCell<Connection>,
}

impl HttpServiceManagement {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<&Connection, TransportError> {
        self.connection
            .get_or_try_init(|| connect(&self.store))
            .await
    }
}

async fn connect(store: &ConfigStore) -> Result<Connection, TransportError> {
    let config = store
        .read_config()
        .await
        .map_err(|e| TransportError::Credentials(e.to_string()))?;
    let pem = store
        .read_credential_material()
        .await
        .map_err(|e| TransportError::Credentials(e.to_string()))?
        .ok_or_else(|| {
            TransportError::Credentials("no management certificate has been imported".to_string())
        })?;

    let endpoint = Url::parse(config.effective_endpoint()).map_err(|e| {
        TransportError::Credentials(format!(
            "invalid endpoint '{}': {}",
            config.effective_endpoint(),
            e
        ))
    })?;
    let identity =
        Identity::from_pem(pem.as_bytes()).map_err(|e| TransportError::Credentials(e.to_string()))?;

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(30))
        .identity(identity)
        .build()
        .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {}", e)))?;

    debug!("Service management client ready for {}", endpoint);
    Ok(Connection { client, endpoint })
}

fn services_url(endpoint: &Url, subscription_id: &str) -> String {
    format!(
        "{}/{}/services",
        endpoint.as_str().trim_end_matches('/'),
        subscription_id
    )
}

#[async_trait]
impl ServiceManagement for HttpServiceManagement {
    async fn list_resource_types(
        &self,
        subscription_id: &str,
        names: &[String],
    ) -> Result<Vec<ResourceTypeState>, TransportError> {
        let connection = self.connection().await?;
        let url = services_url(&connection.endpoint, subscription_id);
        debug!("Listing resource types {:?} via {}", names, url);

        let response = connection
            .client
            .get(&url)
            .header("x-ms-version", API_VERSION)
            .query(&[
                ("servicetype", names.join(",")),
                ("expandlist", "ServiceResource".to_string()),
            ])
            .send()
            .await
            .map_err(|e| TransportError::Network(format!("GET {} failed: {}", url, e)))?;

        let body = read_success(response).await?;
        parse_resource_types(&body)
    }

    async fn register_resource_provider(
        &self,
        subscription_id: &str,
        name: &str,
    ) -> Result<(), TransportError> {
        let connection = self.connection().await?;
        let url = services_url(&connection.endpoint, subscription_id);
        debug!("Registering resource provider {} via {}", name, url);

        let response = connection
            .client
            .put(&url)
            .header("x-ms-version", API_VERSION)
            .query(&[("service", name), ("action", "register")])
            .body(Vec::new())
            .send()
            .await
            .map_err(|e| TransportError::Network(format!("PUT {} failed: {}", url, e)))?;

        read_success(response).await.map(|_| ())
    }
}

async fn read_success(response: Response) -> Result<Vec<u8>, TransportError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| TransportError::Network(format!("Failed to read response body: {}", e)))?;

    if status.is_success() {
        Ok(body.to_vec())
    } else {
        Err(service_error(status, &body))
    }
}

/// Decodes `<Error><Code/><Message/></Error>`, falling back to the status line.
fn service_error(status: StatusCode, body: &[u8]) -> TransportError {
    let parsed = xml::parse_document(body).ok().and_then(|root| {
        root.descendants()
            .into_iter()
            .find(|element| element.name == "Error")
            .and_then(|error| {
                Some((
                    error.child_text("Code")?.to_string(),
                    error.child_text("Message").unwrap_or_default().to_string(),
                ))
            })
    });

    let (code, message) = parsed.unwrap_or_else(|| {
        (
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .replace(' ', ""),
            String::from_utf8_lossy(body).trim().to_string(),
        )
    });

    TransportError::Service {
        status: Some(status.as_u16()),
        code,
        message,
    }
}

fn parse_resource_types(body: &[u8]) -> Result<Vec<ResourceTypeState>, TransportError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let root = xml::parse_document(body)
        .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

    Ok(root
        .descendants()
        .into_iter()
        .filter_map(|element| {
            Some(ResourceTypeState::new(
                element.child_text("Type")?,
                element.child_text("State")?,
            ))
        })
        .collect())
}
