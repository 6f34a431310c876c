//! Recovers the external identifier a modern implementation object exposes.

use tracing::debug;

use crate::parser::ast::{Expr, FuncDecl};
use crate::parser::visit;
use crate::parser::PackageSource;

const RESOURCE_TYPE_METHOD: &str = "ResourceType";
const METADATA_METHOD: &str = "Metadata";
const TYPE_NAME_FIELD: &str = "TypeName";

/// Looks up `ResourceType`/`Metadata` methods across a whole package.
pub struct TypeResolver<'a> {
    source: &'a PackageSource,
}

impl<'a> TypeResolver<'a> {
    pub fn new(source: &'a PackageSource) -> Self {
        Self { source }
    }

    /// Identifier for the receiver type `type_name`.
    ///
    /// `ResourceType` returning a string literal wins over a `Metadata` body
    /// assigning one to `.TypeName`. Within each form the last match wins.
    pub fn resolve(&self, type_name: &str) -> Option<String> {
        let mut direct = None;
        let mut metadata = None;

        for decl in self.source.declarations() {
            if !decl.has_receiver_type(type_name) {
                continue;
            }
            match decl.name.as_str() {
                RESOURCE_TYPE_METHOD => {
                    if let Some(found) = returned_string(decl) {
                        direct = Some(found);
                    }
                }
                METADATA_METHOD => {
                    if let Some(found) = assigned_type_name(decl) {
                        metadata = Some(found);
                    }
                }
                _ => {}
            }
        }

        direct.or(metadata)
    }

    /// The struct built by the package function `constructor`, from a
    /// `return &T{}` or `return T{}`.
    pub fn constructed_type(&self, constructor: &str) -> Option<String> {
        let mut found = None;
        for decl in self.source.functions().filter(|f| f.name == constructor) {
            for value in visit::returned_values(decl) {
                let value = match value {
                    Expr::AddressOf(inner) => inner.as_ref(),
                    other => other,
                };
                if let Some(name) = value
                    .as_composite()
                    .and_then(|lit| lit.ty.as_ref())
                    .and_then(|ty| ty.base_name())
                {
                    found = Some(name.to_string());
                }
            }
        }
        found
    }

    /// Ephemeral entries are usually constructor functions rather than types.
    /// Returns the resolved identifier and, when the name went through a
    /// constructor, the struct type it builds.
    pub fn resolve_ephemeral(&self, name: &str) -> (Option<String>, Option<String>) {
        if let Some(found) = self.resolve(name) {
            return (Some(found), None);
        }

        match self.constructed_type(name) {
            Some(struct_type) => {
                debug!("Ephemeral constructor {} builds {}", name, struct_type);
                (self.resolve(&struct_type), Some(struct_type))
            }
            None => (None, None),
        }
    }
}

fn returned_string(decl: &FuncDecl) -> Option<String> {
    visit::returned_values(decl)
        .into_iter()
        .filter_map(|expr| match expr {
            Expr::Str(s) => Some(s.clone()),
            _ => None,
        })
        .last()
}

fn assigned_type_name(decl: &FuncDecl) -> Option<String> {
    visit::assignments(decl)
        .into_iter()
        .filter(|(target, _)| target.field_name() == Some(TYPE_NAME_FIELD))
        .filter_map(|(_, value)| match value {
            Expr::Str(s) => Some(s.clone()),
            _ => None,
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use std::path::Path;

    fn package(files: &[&str]) -> PackageSource {
        let units = files
            .iter()
            .enumerate()
            .map(|(i, src)| parse_source(Path::new(&format!("f{}.go", i)), src).unwrap())
            .collect();
        PackageSource {
            service_name: "svc".to_string(),
            import_path: "p/svc".to_string(),
            units,
        }
    }

    #[test]
    fn test_value_and_pointer_receivers_resolve_alike() {
        let pkg = package(&[
            r#"package svc

func (r ValueResource) ResourceType() string {
	return "azurerm_value"
}

func (r *PointerResource) ResourceType() string {
	return "azurerm_pointer"
}
"#,
        ]);
        let resolver = TypeResolver::new(&pkg);

        assert_eq!(resolver.resolve("ValueResource").as_deref(), Some("azurerm_value"));
        assert_eq!(resolver.resolve("PointerResource").as_deref(), Some("azurerm_pointer"));
        assert_eq!(resolver.resolve("MissingResource"), None);
    }

    #[test]
    fn test_metadata_type_name_across_files() {
        let pkg = package(&[
            "package svc\n\ntype FooDataSource struct{}\n",
            r#"package svc

func (d *FooDataSource) Metadata(ctx context.Context, req datasource.MetadataRequest, resp *datasource.MetadataResponse) {
	resp.TypeName = "azurerm_foo"
}
"#,
        ]);

        assert_eq!(
            TypeResolver::new(&pkg).resolve("FooDataSource").as_deref(),
            Some("azurerm_foo")
        );
    }

    #[test]
    fn test_direct_return_beats_metadata() {
        let pkg = package(&[r#"package svc

func (r BothResource) ResourceType() string {
	return "azurerm_direct"
}

func (r BothResource) Metadata(ctx context.Context, req MetadataRequest, resp *MetadataResponse) {
	resp.TypeName = "azurerm_metadata"
}
"#]);

        assert_eq!(
            TypeResolver::new(&pkg).resolve("BothResource").as_deref(),
            Some("azurerm_direct")
        );
    }

    #[test]
    fn test_ephemeral_constructor() {
        let pkg = package(&[r#"package svc

func NewSecretEphemeralResource() ephemeral.EphemeralResource {
	return &SecretEphemeralResource{}
}

func (e *SecretEphemeralResource) Metadata(ctx context.Context, req MetadataRequest, resp *MetadataResponse) {
	resp.TypeName = "azurerm_key_vault_secret"
}

func NewUnresolvedEphemeral() ephemeral.EphemeralResource {
	return UnresolvedEphemeral{}
}
"#]);
        let resolver = TypeResolver::new(&pkg);

        assert_eq!(
            resolver.resolve_ephemeral("NewSecretEphemeralResource"),
            (
                Some("azurerm_key_vault_secret".to_string()),
                Some("SecretEphemeralResource".to_string())
            )
        );
        assert_eq!(
            resolver.resolve_ephemeral("NewUnresolvedEphemeral"),
            (None, Some("UnresolvedEphemeral".to_string()))
        );
        assert_eq!(resolver.resolve_ephemeral("Nothing"), (None, None));
    }
}
