use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Callback names pulled from a legacy `*pluginsdk.Resource` literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyResourceCrudMethods {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub create_method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub read_method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub update_method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub delete_method: String,
}

impl LegacyResourceCrudMethods {
    pub fn is_empty(&self) -> bool {
        self.create_method.is_empty()
            && self.read_method.is_empty()
            && self.update_method.is_empty()
            && self.delete_method.is_empty()
    }
}

/// Legacy data sources only carry a read callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyDataSourceMethods {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub read_method: String,
}

impl From<LegacyResourceCrudMethods> for LegacyDataSourceMethods {
    fn from(methods: LegacyResourceCrudMethods) -> Self {
        Self {
            read_method: methods.read_method,
        }
    }
}

/// Everything found in one service package, merged across its files.
///
/// Legacy tables map external identifier -> implementation function. Modern
/// lists keep literal order and duplicates; their `*_terraform_types` maps hold
/// whatever identifiers the type resolver could recover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageRegistration {
    pub service_name: String,
    pub package_path: String,
    #[serde(default)]
    pub supported_resources: BTreeMap<String, String>,
    #[serde(default)]
    pub supported_data_sources: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub data_sources: Vec<String>,
    #[serde(default)]
    pub ephemeral_resources: Vec<String>,
    #[serde(default)]
    pub resource_crud_methods: BTreeMap<String, LegacyResourceCrudMethods>,
    #[serde(default)]
    pub data_source_methods: BTreeMap<String, LegacyDataSourceMethods>,
    #[serde(default)]
    pub resource_terraform_types: BTreeMap<String, String>,
    #[serde(default)]
    pub data_source_terraform_types: BTreeMap<String, String>,
    #[serde(default)]
    pub ephemeral_terraform_types: BTreeMap<String, String>,
    /// Ephemeral constructor -> the struct type it builds, when recoverable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ephemeral_struct_types: BTreeMap<String, String>,
}

impl PackageRegistration {
    pub fn new(service_name: impl Into<String>, package_path: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            package_path: package_path.into(),
            ..Self::default()
        }
    }

    /// True when none of the five registration shapes matched anything.
    pub fn is_empty(&self) -> bool {
        self.supported_resources.is_empty()
            && self.supported_data_sources.is_empty()
            && self.resources.is_empty()
            && self.data_sources.is_empty()
            && self.ephemeral_resources.is_empty()
    }

    /// Number of entity documents this package contributes.
    pub fn entity_count(&self) -> usize {
        self.supported_resources.len()
            + self.supported_data_sources.len()
            + self.resources.len()
            + self.data_sources.len()
            + self.ephemeral_resources.len()
    }

    /// Resolved identifier for a modern resource, falling back to the struct name.
    pub fn resource_type_for(&self, struct_type: &str) -> String {
        self.resource_terraform_types
            .get(struct_type)
            .cloned()
            .unwrap_or_else(|| struct_type.to_string())
    }

    pub fn data_source_type_for(&self, struct_type: &str) -> String {
        self.data_source_terraform_types
            .get(struct_type)
            .cloned()
            .unwrap_or_else(|| struct_type.to_string())
    }

    pub fn ephemeral_type_for(&self, name: &str) -> String {
        self.ephemeral_terraform_types
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registration() {
        let reg = PackageRegistration::new("network", "example.com/provider/network");
        assert!(reg.is_empty());
        assert_eq!(reg.entity_count(), 0);
    }

    #[test]
    fn test_terraform_type_fallback() {
        let mut reg = PackageRegistration::new("compute", "p/compute");
        reg.resources.push("VirtualMachineResource".to_string());
        reg.resources.push("UnresolvedResource".to_string());
        reg.resource_terraform_types.insert(
            "VirtualMachineResource".to_string(),
            "azurerm_virtual_machine".to_string(),
        );

        assert!(!reg.is_empty());
        assert_eq!(reg.resource_type_for("VirtualMachineResource"), "azurerm_virtual_machine");
        assert_eq!(reg.resource_type_for("UnresolvedResource"), "UnresolvedResource");
    }

    #[test]
    fn test_crud_methods_skip_empty_fields() {
        let methods = LegacyResourceCrudMethods {
            create_method: "create".to_string(),
            read_method: "read".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&methods).unwrap();
        assert_eq!(json["create_method"], "create");
        assert!(json.get("update_method").is_none());
        assert!(json.get("delete_method").is_none());
    }
}
