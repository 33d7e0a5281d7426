//! The capability catalog handed to the model for one turn.
//!
//! A catalog is a fresh snapshot: built-ins in declaration order, then the
//! namespaced capabilities of every connected remote provider. Building one
//! never talks to a provider.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::IntoEnumIterator;

use super::builtins::BuiltinCapabilities;
use crate::remote::RemoteRegistry;
use crate::tools::registry::{Category, REGISTRY};
use crate::tools::CapabilityDescriptor;

/// Group label for capabilities from remote providers
pub const REMOTE_GROUP: &str = "Remote";

pub fn build_catalog(
    builtins: &BuiltinCapabilities,
    remote: &RemoteRegistry,
    include_remote: bool,
) -> Vec<CapabilityDescriptor> {
    let mut catalog = builtins.descriptors();
    if include_remote {
        catalog.extend(remote.catalog_entries());
    }
    catalog
}

/// One catalog entry for the tools listing
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
}

/// Catalog grouped by category, built-in categories first then remote
pub fn group_by_category(catalog: &[CapabilityDescriptor]) -> Vec<(String, Vec<CatalogEntry>)> {
    let mut groups: BTreeMap<usize, (String, Vec<CatalogEntry>)> = BTreeMap::new();
    let order: Vec<Category> = Category::iter().collect();

    for descriptor in catalog {
        let (rank, label) = match REGISTRY.get_by_str(&descriptor.name) {
            Some(meta) => (
                order.iter().position(|c| *c == meta.category).unwrap_or(0),
                meta.category.to_string(),
            ),
            None => (order.len(), REMOTE_GROUP.to_string()),
        };

        groups
            .entry(rank)
            .or_insert_with(|| (label, Vec::new()))
            .1
            .push(CatalogEntry {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
            });
    }

    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::remote::tests::{FakeTransport, provider, registry, tool};
    use crate::service::builtins::tests::unlinked_context;

    #[tokio::test]
    async fn test_catalog_names_unique_with_remote() {
        let builtins = BuiltinCapabilities::new(unlinked_context());
        let transport = FakeTransport::default().with_provider(
            "https://zerodha.example/mcp",
            // Same bare name as a built-in
            vec![tool("get_weather"), tool("get_holdings")],
        );
        let (remote, _) = registry(vec![provider("zerodha")], transport);
        remote.connect("zerodha", None).await.unwrap();

        let catalog = build_catalog(&builtins, &remote, true);
        let names: HashSet<_> = catalog.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), catalog.len());
        assert!(names.contains("get_weather"));
        assert!(names.contains("mcp_zerodha_get_weather"));

        let local_only = build_catalog(&builtins, &remote, false);
        assert_eq!(local_only.len(), builtins.len());
    }

    #[tokio::test]
    async fn test_grouping_puts_remote_last() {
        let builtins = BuiltinCapabilities::new(unlinked_context());
        let transport =
            FakeTransport::default().with_provider("https://zerodha.example/mcp", vec![tool("get_holdings")]);
        let (remote, _) = registry(vec![provider("zerodha")], transport);
        remote.connect("zerodha", None).await.unwrap();

        let groups = group_by_category(&build_catalog(&builtins, &remote, true));
        let labels: Vec<_> = groups.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels.first(), Some(&"Tasks"));
        assert_eq!(labels.last(), Some(&REMOTE_GROUP));
        assert_eq!(groups.last().unwrap().1[0].name, "mcp_zerodha_get_holdings");
    }
}
