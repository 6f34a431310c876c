//! Per-package merge of recognizer output.

use tracing::debug;

use crate::analyzers::{recognize, CrudResolver, TypeResolver};
use crate::parser::PackageSource;
use crate::types::PackageRegistration;

/// Merge every file of `source` into one registration.
///
/// Tables merge last-write-wins in file order and lists append. Returns
/// `None` when no file matched any registration shape.
pub fn aggregate(source: &PackageSource, crud: &CrudResolver) -> Option<PackageRegistration> {
    let mut registration = PackageRegistration::new(&source.service_name, &source.import_path);

    for unit in &source.units {
        let findings = recognize(unit);
        registration.supported_resources.extend(findings.supported_resources);
        registration.supported_data_sources.extend(findings.supported_data_sources);
        registration.resources.extend(findings.resources);
        registration.data_sources.extend(findings.data_sources);
        registration.ephemeral_resources.extend(findings.ephemeral_resources);
    }

    if registration.is_empty() {
        return None;
    }

    let types = TypeResolver::new(source);
    for name in &registration.resources {
        if let Some(found) = types.resolve(name) {
            registration.resource_terraform_types.insert(name.clone(), found);
        }
    }
    for name in &registration.data_sources {
        if let Some(found) = types.resolve(name) {
            registration.data_source_terraform_types.insert(name.clone(), found);
        }
    }
    for name in &registration.ephemeral_resources {
        let (found, struct_type) = types.resolve_ephemeral(name);
        if let Some(found) = found {
            registration.ephemeral_terraform_types.insert(name.clone(), found);
        }
        if let Some(struct_type) = struct_type {
            registration.ephemeral_struct_types.insert(name.clone(), struct_type);
        }
    }

    for (terraform_type, function) in &registration.supported_resources {
        if let Some(methods) = crud.resolve(source, function) {
            registration.resource_crud_methods.insert(terraform_type.clone(), methods);
        }
    }
    for (terraform_type, function) in &registration.supported_data_sources {
        if let Some(methods) = crud.resolve_data_source(source, function) {
            registration.data_source_methods.insert(terraform_type.clone(), methods);
        }
    }

    debug!(
        "Package {}: {} legacy resources, {} legacy data sources, {} resources, {} data sources, {} ephemeral",
        registration.service_name,
        registration.supported_resources.len(),
        registration.supported_data_sources.len(),
        registration.resources.len(),
        registration.data_sources.len(),
        registration.ephemeral_resources.len()
    );

    Some(registration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use std::path::Path;

    fn package(files: &[(&str, &str)]) -> PackageSource {
        PackageSource {
            service_name: "svc".to_string(),
            import_path: "example.com/provider/services/svc".to_string(),
            units: files
                .iter()
                .map(|(name, src)| parse_source(Path::new(name), src).unwrap())
                .collect(),
        }
    }

    #[test]
    fn test_package_without_matches_is_dropped() {
        let pkg = package(&[("helpers.go", "package svc\n\nfunc helper() string { return \"x\" }\n")]);
        assert!(aggregate(&pkg, &CrudResolver::default()).is_none());
    }

    #[test]
    fn test_merges_files_in_order() {
        let pkg = package(&[
            (
                "a_registration.go",
                r#"package svc

func (r Registration) SupportedResources() map[string]*pluginsdk.Resource {
	return map[string]*pluginsdk.Resource{
		"azurerm_shared": resourceSharedOld(),
		"azurerm_first":  resourceFirst(),
	}
}

func (r Registration) Resources() []sdk.Resource {
	return []sdk.Resource{AlphaResource{}}
}
"#,
            ),
            (
                "b_registration.go",
                r#"package svc

func (r OtherRegistration) SupportedResources() map[string]*pluginsdk.Resource {
	return map[string]*pluginsdk.Resource{
		"azurerm_shared": resourceSharedNew(),
	}
}

func (r OtherRegistration) Resources() []sdk.Resource {
	return []sdk.Resource{BetaResource{}}
}

func (r BetaResource) ResourceType() string {
	return "azurerm_beta"
}

func resourceSharedNew() *pluginsdk.Resource {
	return &pluginsdk.Resource{
		Create: sharedCreate,
		Read:   sharedRead,
	}
}
"#,
            ),
        ]);

        let reg = aggregate(&pkg, &CrudResolver::default()).unwrap();
        assert_eq!(reg.service_name, "svc");
        assert_eq!(reg.supported_resources.len(), 2);
        assert_eq!(reg.supported_resources["azurerm_shared"], "resourceSharedNew");
        assert_eq!(reg.resources, vec!["AlphaResource", "BetaResource"]);

        assert_eq!(reg.resource_terraform_types.len(), 1);
        assert_eq!(reg.resource_type_for("BetaResource"), "azurerm_beta");
        assert_eq!(reg.resource_type_for("AlphaResource"), "AlphaResource");

        // resourceFirst has no declaration in the package.
        assert_eq!(reg.resource_crud_methods.len(), 1);
        assert_eq!(reg.resource_crud_methods["azurerm_shared"].create_method, "sharedCreate");
    }
}
