//! Secret retrieval boundary.
//!
//! The engine never reaches into ambient state for passwords; whatever
//! supplies them (environment, a secrets manager, an operator prompt) is
//! handed in through configuration as a [`CredentialProvider`].

use anyhow::{Context, Result};

pub trait CredentialProvider: Send + Sync {
    /// Retrieve the password for a principal.
    fn password(&self, user: &str) -> Result<String>;
}

/// Reads the password from a single environment variable, regardless of
/// principal. Suitable for the CLI and CI use.
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentials {
    fn password(&self, user: &str) -> Result<String> {
        std::env::var(&self.var)
            .with_context(|| format!("no password for {user:?}: {} is not set", self.var))
    }
}
