use anyhow::{Context, Result};
use log::debug;
use std::time::Duration;

use crate::http::{ClientConfig, RequestExecutor};

/// Connection settings gathered from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub base_url: Option<String>,
    pub user: String,
    pub password: String,
    pub timeout_secs: Option<u64>,
}

pub struct Config {
    pub executor: RequestExecutor,
}

impl Config {
    pub fn new(settings: Settings) -> Result<Self> {
        let base_url = settings
            .base_url
            .context("No API base URL given; pass --base-url or set RESTCALL_BASE_URL")?;

        let mut client_config = ClientConfig::new(&base_url, settings.user, settings.password)
            .with_context(|| format!("Invalid API base URL {:?}", base_url))?;
        if let Some(secs) = settings.timeout_secs {
            client_config = client_config.with_timeout(Duration::from_secs(secs));
        }
        debug!("Using {:?}", client_config);

        let executor =
            RequestExecutor::new(client_config).context("Failed to initialise HTTP client")?;

        Ok(Self { executor })
    }
}
