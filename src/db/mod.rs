pub mod connection;

pub use connection::{ConnectionConfig, connect_with_retry};
