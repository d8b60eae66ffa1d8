pub mod acl;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod grant;
pub mod identity;
pub mod reconcile;
