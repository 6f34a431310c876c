pub mod entity;
pub mod errors;
pub mod index;
pub mod registration;

pub use entity::{
    DataSourceRecord, EntityCategory, EntityRecord, EphemeralRecord, RegistrationShape,
    ResourceRecord, SDK_EPHEMERAL, SDK_LEGACY, SDK_MODERN,
};
pub use errors::{IndexError, Result};
pub use index::{ProviderIndex, Statistics};
pub use registration::{LegacyDataSourceMethods, LegacyResourceCrudMethods, PackageRegistration};
