//! Service-management transport.
//!
//! The registrar only needs two remote operations, so the transport is a small
//! trait object. [`http::HttpServiceManagement`] talks to the real API; tests
//! substitute an in-memory double.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::eq_ignore_case;

pub use http::HttpServiceManagement;

/// Registration state of one resource type, as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeState {
    pub resource_type: String,
    pub state: String,
}

impl ResourceTypeState {
    pub fn new(resource_type: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            state: state.into(),
        }
    }

    pub fn is_unregistered(&self) -> bool {
        eq_ignore_case(&self.state, "UNREGISTERED")
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{code}: {message}")]
    Service {
        status: Option<u16>,
        code: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Client credentials unavailable: {0}")]
    Credentials(String),
}

impl TransportError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Service {
            status: None,
            code: code.into(),
            message: message.into(),
        }
    }

    /// The service's way of saying it does not know a resource type.
    ///
    /// Decided by the error code alone; other 400 answers, such as a malformed
    /// subscription id, are real failures.
    pub fn is_unknown_resource_type(&self) -> bool {
        match self {
            TransportError::Service { code, .. } => eq_ignore_case(code, "BadRequest"),
            _ => false,
        }
    }
}

#[async_trait]
pub trait ServiceManagement: Send + Sync {
    /// Current registration state of the named resource types.
    async fn list_resource_types(
        &self,
        subscription_id: &str,
        names: &[String],
    ) -> std::result::Result<Vec<ResourceTypeState>, TransportError>;

    /// Enables one resource provider on the subscription.
    async fn register_resource_provider(
        &self,
        subscription_id: &str,
        name: &str,
    ) -> std::result::Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_resource_type_signal() {
        assert!(TransportError::service("BadRequest", "Service type foo is invalid.")
            .is_unknown_resource_type());
        assert!(TransportError::service("badrequest", "x").is_unknown_resource_type());
        assert!(
            !TransportError::Service {
                status: Some(400),
                code: "ResourceNotFound".into(),
                message: "The subscription id is malformed.".into(),
            }
            .is_unknown_resource_type()
        );

        assert!(!TransportError::service("ForbiddenError", "x").is_unknown_resource_type());
        assert!(!TransportError::Network("reset".into()).is_unknown_resource_type());
    }

    #[test]
    fn test_state_comparison_ignores_case() {
        assert!(ResourceTypeState::new("website", "Unregistered").is_unregistered());
        assert!(!ResourceTypeState::new("website", "Registered").is_unregistered());
    }
}
