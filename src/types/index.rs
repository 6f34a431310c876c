use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::registration::PackageRegistration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub service_count: usize,
    pub total_data_sources: usize,
    pub total_resources: usize,
    pub legacy_resources: usize,
    pub modern_resources: usize,
    pub ephemeral_resources: usize,
}

impl Statistics {
    pub fn from_registrations<'a, I>(registrations: I) -> Self
    where
        I: IntoIterator<Item = &'a PackageRegistration>,
    {
        let mut stats = Self::default();
        for registration in registrations {
            stats.record(registration);
        }
        stats
    }

    /// Add one package's counts. `total_resources` is kept in sync on every call.
    pub fn record(&mut self, registration: &PackageRegistration) {
        self.service_count += 1;
        self.legacy_resources += registration.supported_resources.len();
        self.modern_resources += registration.resources.len();
        self.ephemeral_resources += registration.ephemeral_resources.len();
        self.total_data_sources +=
            registration.supported_data_sources.len() + registration.data_sources.len();
        self.total_resources =
            self.legacy_resources + self.modern_resources + self.ephemeral_resources;
    }
}

/// The result of one scan. Built once by the scanner and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderIndex {
    pub version: String,
    pub services: Vec<PackageRegistration>,
    pub statistics: Statistics,
}

impl ProviderIndex {
    pub fn new(version: impl Into<String>, services: Vec<PackageRegistration>) -> Self {
        let statistics = Statistics::from_registrations(&services);
        Self {
            version: version.into(),
            services,
            statistics,
        }
    }

    pub fn find_package(&self, service_name: &str) -> Option<&PackageRegistration> {
        self.services.iter().find(|s| s.service_name == service_name)
    }

    /// Provider-wide legacy resource table. Later packages win on collisions.
    pub fn resource_mappings(&self) -> BTreeMap<String, String> {
        self.services
            .iter()
            .flat_map(|s| s.supported_resources.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn data_source_mappings(&self) -> BTreeMap<String, String> {
        self.services
            .iter()
            .flat_map(|s| s.supported_data_sources.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn entity_count(&self) -> usize {
        self.services.iter().map(PackageRegistration::entity_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registration(legacy: usize, modern: usize, ephemeral: usize, data: usize) -> PackageRegistration {
        let mut reg = PackageRegistration::new("svc", "p/svc");
        for i in 0..legacy {
            reg.supported_resources.insert(format!("x_legacy_{}", i), format!("resource{}", i));
        }
        for i in 0..modern {
            reg.resources.push(format!("Modern{}Resource", i));
        }
        for i in 0..ephemeral {
            reg.ephemeral_resources.push(format!("NewEphemeral{}", i));
        }
        for i in 0..data {
            reg.data_sources.push(format!("Data{}DataSource", i));
        }
        reg
    }

    #[test]
    fn test_statistics_from_registrations() {
        let regs = vec![registration(2, 1, 1, 3), registration(0, 4, 0, 1)];
        let stats = Statistics::from_registrations(&regs);

        assert_eq!(stats.service_count, 2);
        assert_eq!(stats.legacy_resources, 2);
        assert_eq!(stats.modern_resources, 5);
        assert_eq!(stats.ephemeral_resources, 1);
        assert_eq!(stats.total_resources, 8);
        assert_eq!(stats.total_data_sources, 4);
    }

    #[test]
    fn test_global_mappings_merge() {
        let mut a = PackageRegistration::new("a", "p/a");
        a.supported_resources.insert("x_one".to_string(), "resourceOne".to_string());
        let mut b = PackageRegistration::new("b", "p/b");
        b.supported_resources.insert("x_one".to_string(), "resourceOneAgain".to_string());
        b.supported_data_sources.insert("x_two".to_string(), "dataSourceTwo".to_string());

        let index = ProviderIndex::new("v1.0.0", vec![a, b]);
        assert_eq!(index.resource_mappings()["x_one"], "resourceOneAgain");
        assert_eq!(index.data_source_mappings().len(), 1);
        assert!(index.find_package("b").is_some());
        assert!(index.find_package("c").is_none());
        assert_eq!(index.entity_count(), 3);
    }

    proptest! {
        #[test]
        fn total_resources_is_sum_of_categories(
            shapes in proptest::collection::vec((0usize..20, 0usize..20, 0usize..20, 0usize..20), 0..12)
        ) {
            let regs: Vec<_> = shapes
                .iter()
                .map(|&(l, m, e, d)| registration(l, m, e, d))
                .collect();
            let stats = Statistics::from_registrations(&regs);

            prop_assert_eq!(
                stats.total_resources,
                stats.legacy_resources + stats.modern_resources + stats.ephemeral_resources
            );
            prop_assert_eq!(stats.service_count, regs.len());
        }
    }
}
