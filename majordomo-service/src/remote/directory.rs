//! Known remote capability providers.

use std::collections::HashSet;

use crate::config::ProviderSpec;
use crate::error::{ServiceError, ServiceResult};

/// Providers that may be connected, in configuration order
#[derive(Debug, Clone, Default)]
pub struct ProviderDirectory {
    providers: Vec<ProviderSpec>,
}

impl ProviderDirectory {
    /// Validate and index provider specs.
    ///
    /// Ids become part of namespaced capability names, so they must be
    /// non-empty, unique and free of the `_` separator.
    pub fn from_specs(providers: Vec<ProviderSpec>) -> ServiceResult<Self> {
        let mut seen = HashSet::new();
        for spec in &providers {
            if spec.id.is_empty() || spec.id.contains('_') {
                return Err(ServiceError::Config {
                    message: format!(
                        "remote provider id '{}' must be non-empty and must not contain '_'",
                        spec.id
                    ),
                });
            }
            if !seen.insert(spec.id.as_str()) {
                return Err(ServiceError::Config {
                    message: format!("remote provider id '{}' is listed twice", spec.id),
                });
            }
        }
        Ok(Self { providers })
    }

    pub fn get(&self, provider_id: &str) -> Option<&ProviderSpec> {
        self.providers.iter().find(|p| p.id == provider_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.providers.iter()
    }
}
