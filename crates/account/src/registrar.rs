//! Resource-provider registration.
//!
//! A subscription must have a resource provider enabled before the matching
//! operations can be called. Registration runs in two strictly ordered phases:
//!
//! 1. **List**: query the state of every known resource type, one call per
//!    type. A "bad request" answer means the service does not know the type,
//!    which is recorded as a skip. Any other failure aborts the whole run.
//! 2. **Register**: every type reported as `UNREGISTERED` is registered, one
//!    call at a time. Individual failures are recorded and the loop moves on.
//!
//! Calls are never issued concurrently; the provider endpoint serializes
//! mutations per subscription.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::eq_ignore_case;
use crate::transport::ServiceManagement;

/// Ordered, append-only set of resource-type names.
///
/// Built once at start-up by whoever knows which providers the tool depends on,
/// then handed to the importer by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTypeRegistry {
    names: Vec<String>,
}

impl ResourceTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a name unless an equal one (ignoring case) is already present.
    pub fn register(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| eq_ignore_case(n, name))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ResourceTypeRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut registry = Self::new();
        for name in iter {
            registry.register(name);
        }
        registry
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    AlreadyRegistered,
    Registered,
    /// The service does not recognise the type. Not an error.
    UnknownType,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub outcomes: Vec<(String, RegistrationOutcome)>,
}

impl RegistrationReport {
    pub fn outcome(&self, name: &str) -> Option<&RegistrationOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Types for which a register call was issued, in call order.
    pub fn attempted(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| {
                matches!(
                    outcome,
                    RegistrationOutcome::Registered | RegistrationOutcome::Failed(_)
                )
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                RegistrationOutcome::Failed(message) => Some((name.as_str(), message.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures().is_empty()
    }

    /// All failure messages joined into one line, if there were any.
    pub fn failure_summary(&self) -> Option<String> {
        let failures = self.failures();
        if failures.is_empty() {
            return None;
        }
        Some(
            failures
                .iter()
                .map(|(name, message)| format!("{}: {}", name, message))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn record(&mut self, name: &str, outcome: RegistrationOutcome) {
        match self.outcomes.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = outcome,
            None => self.outcomes.push((name.to_string(), outcome)),
        }
    }
}

pub struct ResourceTypeRegistrar<'a> {
    transport: &'a dyn ServiceManagement,
}

impl<'a> ResourceTypeRegistrar<'a> {
    pub fn new(transport: &'a dyn ServiceManagement) -> Self {
        Self { transport }
    }

    /// Lists, then registers, every type in `registry` for `subscription_id`.
    ///
    /// # Errors
    ///
    /// Only a list-phase failure other than "unknown type" is returned.
    /// Register-phase failures end up in the report.
    pub async fn register_all(
        &self,
        subscription_id: &str,
        registry: &ResourceTypeRegistry,
    ) -> Result<RegistrationReport> {
        let mut report = RegistrationReport::default();
        let mut pending = Vec::new();

        for name in registry.names() {
            let states = match self
                .transport
                .list_resource_types(subscription_id, std::slice::from_ref(name))
                .await
            {
                Ok(states) => states,
                Err(e) if e.is_unknown_resource_type() => {
                    debug!("Resource type '{}' is not known to the service: {}", name, e);
                    report.record(name, RegistrationOutcome::UnknownType);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match states
                .iter()
                .find(|s| eq_ignore_case(&s.resource_type, name))
            {
                Some(state) if state.is_unregistered() => pending.push(name.as_str()),
                Some(state) => {
                    debug!("Resource type '{}' is {}", name, state.state);
                    report.record(name, RegistrationOutcome::AlreadyRegistered);
                }
                None => report.record(name, RegistrationOutcome::UnknownType),
            }
        }

        for name in pending {
            match self
                .transport
                .register_resource_provider(subscription_id, name)
                .await
            {
                Ok(()) => {
                    info!("Registered resource provider '{}'", name);
                    report.record(name, RegistrationOutcome::Registered);
                }
                Err(e) => {
                    warn!("Failed to register resource provider '{}': {}", name, e);
                    report.record(name, RegistrationOutcome::Failed(e.to_string()));
                }
            }
        }

        report
            .outcomes
            .sort_by_key(|(name, _)| registry.names().iter().position(|n| n == name));
        Ok(report)
    }
}
