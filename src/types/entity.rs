use serde::{Deserialize, Serialize};
use std::fmt;

use super::registration::PackageRegistration;

pub const SDK_LEGACY: &str = "legacy_pluginsdk";
pub const SDK_MODERN: &str = "modern_sdk";
pub const SDK_EPHEMERAL: &str = "ephemeral";

/// The five declaration shapes the recognizers understand, named after the
/// registration method that carries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationShape {
    SupportedResources,
    SupportedDataSources,
    Resources,
    DataSources,
    EphemeralResources,
}

impl RegistrationShape {
    pub const ALL: [RegistrationShape; 5] = [
        RegistrationShape::SupportedResources,
        RegistrationShape::SupportedDataSources,
        RegistrationShape::Resources,
        RegistrationShape::DataSources,
        RegistrationShape::EphemeralResources,
    ];

    pub fn method_name(self) -> &'static str {
        match self {
            Self::SupportedResources => "SupportedResources",
            Self::SupportedDataSources => "SupportedDataSources",
            Self::Resources => "Resources",
            Self::DataSources => "DataSources",
            Self::EphemeralResources => "EphemeralResources",
        }
    }

    pub fn sdk_type(self) -> &'static str {
        match self {
            Self::SupportedResources | Self::SupportedDataSources => SDK_LEGACY,
            Self::Resources | Self::DataSources => SDK_MODERN,
            Self::EphemeralResources => SDK_EPHEMERAL,
        }
    }

    pub fn category(self) -> EntityCategory {
        match self {
            Self::SupportedResources | Self::Resources => EntityCategory::Resource,
            Self::SupportedDataSources | Self::DataSources => EntityCategory::DataSource,
            Self::EphemeralResources => EntityCategory::Ephemeral,
        }
    }
}

impl fmt::Display for RegistrationShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Which output directory an entity lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    Resource,
    DataSource,
    Ephemeral,
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Resource => "resource",
            Self::DataSource => "data source",
            Self::Ephemeral => "ephemeral",
        };
        f.write_str(label)
    }
}

fn func_ref(name: &str) -> Option<String> {
    (!name.is_empty()).then(|| format!("func.{}.goindex", name))
}

fn method_ref(object: &str, method: &str) -> Option<String> {
    (!object.is_empty()).then(|| format!("method.{}.{}.goindex", object, method))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub terraform_type: String,
    pub struct_type: String,
    pub namespace: String,
    pub registered_by: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub registration_method: String,
    pub sdk_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_index: Option<String>,
}

impl ResourceRecord {
    pub fn legacy(terraform_type: &str, function: &str, service: &PackageRegistration) -> Self {
        let crud = service
            .resource_crud_methods
            .get(terraform_type)
            .cloned()
            .unwrap_or_default();

        Self {
            terraform_type: terraform_type.to_string(),
            struct_type: String::new(),
            namespace: service.package_path.clone(),
            registered_by: RegistrationShape::SupportedResources.method_name().to_string(),
            registration_method: function.to_string(),
            sdk_type: SDK_LEGACY.to_string(),
            schema_index: func_ref(function),
            create_index: func_ref(&crud.create_method),
            read_index: func_ref(&crud.read_method),
            update_index: func_ref(&crud.update_method),
            delete_index: func_ref(&crud.delete_method),
            attribute_index: func_ref(function),
        }
    }

    pub fn modern(struct_type: &str, service: &PackageRegistration) -> Self {
        Self {
            terraform_type: service.resource_type_for(struct_type),
            struct_type: struct_type.to_string(),
            namespace: service.package_path.clone(),
            registered_by: RegistrationShape::Resources.method_name().to_string(),
            registration_method: String::new(),
            sdk_type: SDK_MODERN.to_string(),
            schema_index: method_ref(struct_type, "Arguments"),
            create_index: method_ref(struct_type, "Create"),
            read_index: method_ref(struct_type, "Read"),
            update_index: method_ref(struct_type, "Update"),
            delete_index: method_ref(struct_type, "Delete"),
            attribute_index: method_ref(struct_type, "Attributes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceRecord {
    pub terraform_type: String,
    pub struct_type: String,
    pub namespace: String,
    pub registered_by: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub registration_method: String,
    pub sdk_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_index: Option<String>,
}

impl DataSourceRecord {
    pub fn legacy(terraform_type: &str, function: &str, service: &PackageRegistration) -> Self {
        let read = service
            .data_source_methods
            .get(terraform_type)
            .map(|m| m.read_method.as_str())
            .unwrap_or_default();

        Self {
            terraform_type: terraform_type.to_string(),
            struct_type: String::new(),
            namespace: service.package_path.clone(),
            registered_by: RegistrationShape::SupportedDataSources.method_name().to_string(),
            registration_method: function.to_string(),
            sdk_type: SDK_LEGACY.to_string(),
            schema_index: func_ref(function),
            read_index: func_ref(read),
            attribute_index: func_ref(function),
        }
    }

    pub fn modern(struct_type: &str, service: &PackageRegistration) -> Self {
        Self {
            terraform_type: service.data_source_type_for(struct_type),
            struct_type: struct_type.to_string(),
            namespace: service.package_path.clone(),
            registered_by: RegistrationShape::DataSources.method_name().to_string(),
            registration_method: String::new(),
            sdk_type: SDK_MODERN.to_string(),
            schema_index: method_ref(struct_type, "Arguments"),
            read_index: method_ref(struct_type, "Read"),
            attribute_index: method_ref(struct_type, "Attributes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralRecord {
    pub terraform_type: String,
    pub struct_type: String,
    pub namespace: String,
    pub registered_by: String,
    pub sdk_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renew_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_index: Option<String>,
}

impl EphemeralRecord {
    /// `name` is the registered constructor. Lifecycle references point at the
    /// struct it builds when that was recovered, else at the constructor name.
    pub fn new(name: &str, service: &PackageRegistration) -> Self {
        let target = service
            .ephemeral_struct_types
            .get(name)
            .map(String::as_str)
            .unwrap_or(name);

        Self {
            terraform_type: service.ephemeral_type_for(name),
            struct_type: name.to_string(),
            namespace: service.package_path.clone(),
            registered_by: RegistrationShape::EphemeralResources.method_name().to_string(),
            sdk_type: SDK_EPHEMERAL.to_string(),
            schema_index: method_ref(target, "Schema"),
            open_index: method_ref(target, "Open"),
            renew_index: method_ref(target, "Renew"),
            close_index: method_ref(target, "Close"),
        }
    }
}

/// One emitted entity document.
///
/// Serialized flat, without a tag. The variants overlap in shape, so documents
/// are read back through the concrete record type for their directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntityRecord {
    Resource(ResourceRecord),
    DataSource(DataSourceRecord),
    Ephemeral(EphemeralRecord),
}

impl EntityRecord {
    pub fn terraform_type(&self) -> &str {
        match self {
            Self::Resource(r) => &r.terraform_type,
            Self::DataSource(d) => &d.terraform_type,
            Self::Ephemeral(e) => &e.terraform_type,
        }
    }

    pub fn category(&self) -> EntityCategory {
        match self {
            Self::Resource(_) => EntityCategory::Resource,
            Self::DataSource(_) => EntityCategory::DataSource,
            Self::Ephemeral(_) => EntityCategory::Ephemeral,
        }
    }
}
