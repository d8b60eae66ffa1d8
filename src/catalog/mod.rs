//! Read-side access to the system catalogs: given resolved numeric
//! identities, fetch the names and packed ACL blobs the codec decodes.

pub mod reader;

pub use reader::{AclRow, default_table_acls, schema_acl, select_default_entry};
