use anyhow::Result;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Cluster connection retry configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Maximum number of retries for cluster connections
    pub max_retries: u32,
    /// Delay between connection retries
    pub retry_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay: Duration::from_millis(200),
        }
    }
}

/// Connect with retry logic, covering cluster resume timing and other
/// transient connection problems.
pub async fn connect_with_retry(options: PgConnectOptions) -> Result<PgPool> {
    connect_with_retry_config(options, &ConnectionConfig::default()).await
}

/// Connect with custom retry configuration
pub async fn connect_with_retry_config(
    options: PgConnectOptions,
    config: &ConnectionConfig,
) -> Result<PgPool> {
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        match PgPoolOptions::new().connect_with(options.clone()).await {
            Ok(pool) => {
                if attempt > 0 {
                    info!(
                        "✅ Connected to cluster (after {} retry{})",
                        attempt,
                        if attempt == 1 { "" } else { "ies" }
                    );
                } else {
                    info!("✅ Connected to cluster");
                }
                return Ok(pool);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < config.max_retries {
                    if attempt == 0 {
                        info!("🔄 Cluster not ready, retrying...");
                    }
                    tokio::time::sleep(config.retry_delay).await;
                }
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to connect to cluster after {} attempts: {}",
        config.max_retries + 1,
        last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no error recorded".to_string())
    ))
}
