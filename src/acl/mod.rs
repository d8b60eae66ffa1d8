//! Encode/decode between named privilege sets and the packed ACL string
//! representation stored in the Redshift system catalogs.

pub mod codec;
pub mod privilege;

pub use codec::{AclEntry, decode, parse_blob};
pub use privilege::{Privilege, PrivilegeSet, TargetKind};
