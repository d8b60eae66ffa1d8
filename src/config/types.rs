use serde::Deserialize;

/// Raw configuration file shape (`redgrant.yaml`). Everything is optional;
/// the merge in `ClusterConfig::resolve` fills the gaps from environment
/// variables and defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigInput {
    pub cluster: Option<ClusterInput>,
    pub credentials: Option<CredentialsInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterInput {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub database: Option<String>,
    pub sslmode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsInput {
    /// Environment variable holding the cluster password.
    pub password_env: Option<String>,
}
