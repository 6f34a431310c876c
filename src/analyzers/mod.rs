pub mod crud;
pub mod registration;
pub mod type_resolver;

pub use crud::{CrudResolver, DEFAULT_RESOURCE_CONFIG_TYPES};
pub use registration::{
    extract_function_list, extract_struct_list, extract_table, recognize, FileFindings,
};
pub use type_resolver::TypeResolver;
