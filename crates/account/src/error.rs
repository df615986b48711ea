use thiserror::Error;

use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Malformed XML: {0}")]
    XmlParse(String),

    #[error("Invalid publish settings: {0}")]
    InvalidPublishSettings(String),

    #[error("Invalid certificate container: {0}")]
    CertificateFormat(String),

    #[error("Subscription '{0}' not found")]
    UnknownSubscription(String),

    #[error("No management certificate configured: {0}")]
    MissingCredentials(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO operation '{operation}' failed on path '{path}': {source}")]
    IoOperation {
        operation: String,
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service management call failed: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, AccountError>;

impl AccountError {
    pub(crate) fn io_operation(
        operation: &str,
        path: impl Into<std::path::PathBuf>,
        source: std::io::Error,
    ) -> Self {
        AccountError::IoOperation {
            operation: operation.to_string(),
            path: path.into(),
            source,
        }
    }

    /// Errors caused by what the user supplied rather than by the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AccountError::XmlParse(_)
                | AccountError::InvalidPublishSettings(_)
                | AccountError::CertificateFormat(_)
                | AccountError::UnknownSubscription(_)
                | AccountError::MissingCredentials(_)
        )
    }
}

impl From<quick_xml::Error> for AccountError {
    fn from(err: quick_xml::Error) -> Self {
        AccountError::XmlParse(err.to_string())
    }
}
