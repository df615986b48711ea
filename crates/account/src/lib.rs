//! Cloudacct Account - credential import and subscription management
//!
//! This crate handles the account side of the `cloudacct` tool: importing
//! publish-settings bundles and management certificates, keeping the current
//! subscription and endpoint on disk, and enabling resource providers on a
//! freshly imported subscription.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cloudacct_account::{
//!     ConfigStore, CredentialImporter, HttpServiceManagement, ImportOptions,
//!     ResourceTypeRegistry,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ConfigStore::new("./.cloudacct");
//! let registry: ResourceTypeRegistry = ["website", "servicebus"].into_iter().collect();
//! let transport = HttpServiceManagement::new(store.clone());
//!
//! let importer = CredentialImporter::new(&store, &registry, &transport);
//! let report = importer
//!     .import_file("my.publishsettings", ImportOptions::default())
//!     .await?;
//! println!("Imported {} subscription(s)", report.subscriptions.len());
//! # Ok(())
//! # }
//! ```
pub mod certificate;
pub mod config_store;
pub mod error;
pub mod ingestion;
pub mod models;
pub mod publish_settings;
pub mod registrar;
pub mod resolver;
pub mod transport;
pub mod xml;

pub use config_store::ConfigStore;
pub use error::{AccountError, Result};
pub use ingestion::{
    CredentialImporter, CredentialKind, ImportOptions, ImportReport, RegistrationStatus,
};
pub use models::{CredentialMaterial, PersistedConfig, PublishProfile, Subscription};
pub use registrar::{
    RegistrationOutcome, RegistrationReport, ResourceTypeRegistrar, ResourceTypeRegistry,
};
pub use resolver::SubscriptionResolver;
pub use transport::{HttpServiceManagement, ResourceTypeState, ServiceManagement, TransportError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
