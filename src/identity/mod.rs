//! Durable identity management: name-to-oid resolution against the system
//! catalogs, and the composite identifier that persists a grant resource.

pub mod composite;
pub mod resolver;

pub use composite::GrantId;
