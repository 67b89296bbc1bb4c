//! Serve command handler.
//!
//! Runs the completion relay HTTP server.

use clap::Args;
use sitechat_core::{config::AppConfig, AppResult};

/// Run the completion relay server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Bind address (host:port)
    #[arg(short, long, env = "SITECHAT_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut config = config.clone();

        if let Some(ref bind) = self.bind {
            config.bind = bind.clone();
        }

        if config.resolve_api_key().is_none() {
            // The relay also rejects per-request, but warn early so a
            // misconfigured deployment is visible at startup
            tracing::warn!(
                "No provider credential found in {}; chat requests will fail",
                config.api_key_env
            );
        }

        sitechat_relay::run_server(&config).await
    }
}
