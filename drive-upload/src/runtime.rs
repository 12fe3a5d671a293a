use anyhow::Context;
use gdrive_core::{DRIVE_SCOPE, DriveClient};
use tracing::info;

use crate::config::UploadConfig;
use crate::orchestrator::{self, RunReport};
use crate::pattern;
use crate::remote::DriveRemote;
use crate::token_provider::TokenProvider;

const API_URL_ENV: &str = "DRIVE_UPLOAD_API_URL";

pub struct UploadRuntime {
    config: UploadConfig,
    remote: DriveRemote,
}

impl UploadRuntime {
    /// Builds the Drive client and verifies the credentials before any file is
    /// touched.
    pub async fn bootstrap(config: UploadConfig) -> anyhow::Result<Self> {
        let base_url = std::env::var(API_URL_ENV).ok();
        Self::bootstrap_with_base_url(config, base_url.as_deref()).await
    }

    pub async fn bootstrap_with_base_url(
        config: UploadConfig,
        base_url: Option<&str>,
    ) -> anyhow::Result<Self> {
        let client = match base_url {
            Some(url) => DriveClient::with_base_url(url, "")?,
            None => DriveClient::new("")?,
        };
        let tokens = TokenProvider::new(config.credentials.clone(), DRIVE_SCOPE);
        let remote = DriveRemote::new(client, tokens);
        remote
            .authenticate()
            .await
            .context("failed to authenticate with Google Drive")?;
        info!("authenticated with Google Drive");

        Ok(Self { config, remote })
    }

    pub async fn run(&self) -> anyhow::Result<RunReport> {
        let files = pattern::expand(&self.config.pattern)
            .with_context(|| format!("failed to expand pattern '{}'", self.config.pattern))?;
        info!(count = files.len(), pattern = %self.config.pattern, "matched files");
        for file in &files {
            info!(path = %file.display(), "matched");
        }

        let report = orchestrator::run(&self.remote, &files, &self.config.options).await?;
        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "upload finished"
        );
        Ok(report)
    }
}
