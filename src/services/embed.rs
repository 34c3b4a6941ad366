//! Read-only collaborators for the presentation layer: the dashboard embed
//! URL and download-link issuance. Neither touches the resource caches.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PortalConfig;
use crate::models::DashboardEmbed;

/// The backend answers with either `url` or `embedUrl`; both may be relative.
#[derive(Debug, Deserialize)]
struct EmbedWire {
    url: Option<String>,
    #[serde(rename = "embedUrl")]
    embed_url: Option<String>,
    #[serde(rename = "expiresAt")]
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct DownloadRequest<'a> {
    key: &'a str,
}

#[derive(Debug, Deserialize)]
struct DownloadWire {
    #[serde(rename = "downloadUrl")]
    download_url: Url,
}

pub struct EmbedClient {
    client: Client,
    config: PortalConfig,
}

impl EmbedClient {
    pub fn new(client: Client, config: PortalConfig) -> Self {
        Self { client, config }
    }

    /// Fetches the dashboard embed target and resolves it against the API
    /// base, so relative and absolute answers both come back absolute.
    pub async fn dashboard_embed(&self) -> Result<DashboardEmbed> {
        let wire: EmbedWire = self
            .client
            .get(self.config.embed_url())
            .send()
            .await
            .context("embed endpoint unreachable")?
            .error_for_status()
            .context("embed endpoint rejected the request")?
            .json()
            .await
            .context("malformed embed response")?;

        let raw = wire
            .url
            .or(wire.embed_url)
            .ok_or_else(|| anyhow!("embed response carried neither url nor embedUrl"))?;

        let base = Url::parse(&self.config.api_base).context("invalid API base URL")?;
        let url = base.join(&raw).context("invalid embed URL")?;

        Ok(DashboardEmbed {
            url,
            expires_at: wire.expires_at,
        })
    }

    /// Exchanges a stored file key for a time-limited download link.
    pub async fn issue_download_url(&self, key: &str) -> Result<Url> {
        let wire: DownloadWire = self
            .client
            .post(self.config.presign_get_url())
            .json(&DownloadRequest { key })
            .send()
            .await
            .context("download-link endpoint unreachable")?
            .error_for_status()
            .context("download-link endpoint rejected the request")?
            .json()
            .await
            .context("malformed download-link response")?;

        Ok(wire.download_url)
    }
}
