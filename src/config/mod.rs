//! Configuration loading and merge: CLI arguments override environment
//! variables, which override the config file, which overrides defaults.

pub mod types;

pub use types::*;

use anyhow::{Context, Result, bail};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::path::Path;

/// Environment variable holding the cluster password unless the config
/// file points elsewhere.
pub const DEFAULT_PASSWORD_ENV: &str = "REDGRANT_PASSWORD";

const DEFAULT_PORT: u16 = 5439;
const DEFAULT_DATABASE: &str = "dev";
const DEFAULT_SSLMODE: &str = "require";

/// Load the yaml config file, tolerating its absence.
pub fn load_config(config_file: &str) -> Result<ConfigInput> {
    if !Path::new(config_file).exists() {
        return Ok(ConfigInput::default());
    }

    let contents = std::fs::read_to_string(config_file)
        .with_context(|| format!("Failed to read config file {config_file}"))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {config_file}"))
}

/// Cluster connection arguments, flattened into every subcommand.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ClusterArgs {
    /// Cluster endpoint host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Cluster port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Login user performing the reconciliation
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Database to connect to
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// TLS mode (disable, allow, prefer, require, verify-ca, verify-full)
    #[arg(long, global = true)]
    pub sslmode: Option<String>,
}

/// Fully resolved cluster connection settings. The password is deliberately
/// not part of this struct; it comes from the credential provider at
/// connect time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
    pub sslmode: String,
}

impl ClusterConfig {
    /// Merge CLI args over environment over file over defaults. Host and
    /// user have no defaults and must come from one of the sources.
    pub fn resolve(file: &ConfigInput, args: &ClusterArgs) -> Result<Self> {
        let file = file.cluster.clone().unwrap_or_default();

        let host = args
            .host
            .clone()
            .or_else(|| std::env::var("REDGRANT_HOST").ok())
            .or(file.host)
            .context("cluster host not configured (--host, REDGRANT_HOST, or config file)")?;

        let user = args
            .user
            .clone()
            .or_else(|| std::env::var("REDGRANT_USER").ok())
            .or(file.user)
            .context("cluster user not configured (--user, REDGRANT_USER, or config file)")?;

        let port = args
            .port
            .or_else(|| {
                std::env::var("REDGRANT_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
            })
            .or(file.port)
            .unwrap_or(DEFAULT_PORT);

        let database = args
            .database
            .clone()
            .or_else(|| std::env::var("REDGRANT_DATABASE").ok())
            .or(file.database)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let sslmode = args
            .sslmode
            .clone()
            .or_else(|| std::env::var("REDGRANT_SSLMODE").ok())
            .or(file.sslmode)
            .unwrap_or_else(|| DEFAULT_SSLMODE.to_string());

        // Fail on a bad sslmode here, not at connect time
        parse_ssl_mode(&sslmode)?;

        Ok(Self {
            host,
            port,
            user,
            database,
            sslmode,
        })
    }

    /// Build driver options with the password supplied by the credential
    /// provider.
    pub fn connect_options(&self, password: &str) -> Result<PgConnectOptions> {
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(password)
            .database(&self.database)
            .ssl_mode(parse_ssl_mode(&self.sslmode)?))
    }
}

fn parse_ssl_mode(mode: &str) -> Result<PgSslMode> {
    Ok(match mode.to_ascii_lowercase().as_str() {
        "disable" => PgSslMode::Disable,
        "allow" => PgSslMode::Allow,
        "prefer" => PgSslMode::Prefer,
        "require" => PgSslMode::Require,
        "verify-ca" => PgSslMode::VerifyCa,
        "verify-full" => PgSslMode::VerifyFull,
        other => bail!("unknown sslmode {other:?}"),
    })
}

/// The environment variable the credential provider should read.
pub fn password_env(file: &ConfigInput) -> String {
    file.credentials
        .as_ref()
        .and_then(|c| c.password_env.clone())
        .unwrap_or_else(|| DEFAULT_PASSWORD_ENV.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_override_file() {
        let file = ConfigInput {
            cluster: Some(ClusterInput {
                host: Some("file-host".into()),
                port: Some(5555),
                user: Some("file-user".into()),
                database: None,
                sslmode: None,
            }),
            credentials: None,
        };
        let args = ClusterArgs {
            host: Some("cli-host".into()),
            ..Default::default()
        };

        let config = ClusterConfig::resolve(&file, &args).unwrap();
        assert_eq!(config.host, "cli-host");
        assert_eq!(config.user, "file-user");
        assert_eq!(config.port, 5555);
        assert_eq!(config.database, "dev");
        assert_eq!(config.sslmode, "require");
    }

    #[test]
    fn missing_host_is_an_error() {
        let err = ClusterConfig::resolve(&ConfigInput::default(), &ClusterArgs::default())
            .unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn bad_sslmode_fails_at_resolve_time() {
        let args = ClusterArgs {
            host: Some("h".into()),
            user: Some("u".into()),
            sslmode: Some("sideways".into()),
            ..Default::default()
        };
        assert!(ClusterConfig::resolve(&ConfigInput::default(), &args).is_err());
    }

    #[test]
    fn password_env_defaults() {
        assert_eq!(password_env(&ConfigInput::default()), DEFAULT_PASSWORD_ENV);

        let file = ConfigInput {
            cluster: None,
            credentials: Some(CredentialsInput {
                password_env: Some("MY_SECRET".into()),
            }),
        };
        assert_eq!(password_env(&file), "MY_SECRET");
    }

    #[test]
    fn config_file_parses() {
        let yaml = r#"
cluster:
  host: cluster.example
  user: reconciler
  port: 5439
credentials:
  password_env: CLUSTER_PASSWORD
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redgrant.yaml");
        std::fs::write(&path, yaml).unwrap();

        let input = load_config(path.to_str().unwrap()).unwrap();
        let cluster = input.cluster.as_ref().unwrap();
        assert_eq!(cluster.host.as_deref(), Some("cluster.example"));
        assert_eq!(cluster.port, Some(5439));
        assert_eq!(password_env(&input), "CLUSTER_PASSWORD");
    }

    #[test]
    fn missing_config_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let input = load_config(path.to_str().unwrap()).unwrap();
        assert!(input.cluster.is_none());
        assert!(input.credentials.is_none());
    }
}
