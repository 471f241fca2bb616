//! HTTP client for the counting engine

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};

use crate::domain::{LiveCounts, Zone};

/// Remote side of an analysis: receives the configuration, reports counts
pub trait Engine: Clone + Send + Sync + 'static {
    /// Send the media file and the zone list, replacing any previous run
    fn upload_config(
        &self,
        media: &Path,
        zones: &[Zone],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Latest per-zone, per-class counts
    fn fetch_counts(&self) -> impl Future<Output = Result<LiveCounts>> + Send;

    /// Processed video feed, with a cache-busting suffix
    fn feed_url(&self) -> String;
}

/// Serialize zones the way the engine expects them in the `zones` form field
pub fn zones_payload(zones: &[Zone]) -> Result<String> {
    serde_json::to_string(zones).context("Failed to serialize zones")
}

#[derive(Clone, Debug)]
pub struct EngineClient {
    client: reqwest::Client,
    base: String,
}

impl EngineClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base, endpoint)
    }
}

impl Engine for EngineClient {
    async fn upload_config(&self, media: &Path, zones: &[Zone]) -> Result<()> {
        let bytes = tokio::fs::read(media)
            .await
            .with_context(|| format!("Failed to read media file: {}", media.display()))?;
        let file_name = media
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        let form = Form::new()
            .part("video", Part::bytes(bytes).file_name(file_name))
            .text("zones", zones_payload(zones)?);

        let url = self.url("upload_config");
        log::info!("Uploading configuration ({} zones) to {}", zones.len(), url);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Upload to {} failed", url))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            anyhow::bail!("Engine rejected configuration ({}): {}", status, body);
        }
        Ok(())
    }

    async fn fetch_counts(&self) -> Result<LiveCounts> {
        let url = self.url("get_counts");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Counts request to {} failed", url))?
            .error_for_status()
            .context("Engine returned an error for counts")?;
        response
            .json::<LiveCounts>()
            .await
            .context("Unreadable counts payload")
    }

    fn feed_url(&self) -> String {
        format!(
            "{}?t={}",
            self.url("video_feed"),
            chrono::Utc::now().timestamp_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassId, ClassSelection, Point, ToolKind};

    #[test]
    fn test_zones_payload_shape() {
        let zone = Zone::new(
            "Carril 1",
            ToolKind::Line,
            vec![Point::new(10.0, 20.0), Point::new(30.0, 40.0)],
            &ClassSelection::new([ClassId::Auto]),
        )
        .unwrap();
        let payload: serde_json::Value =
            serde_json::from_str(&zones_payload(&[zone]).unwrap()).unwrap();
        assert_eq!(payload[0]["name"], "Carril 1");
        assert_eq!(payload[0]["type"], "Line");
        assert_eq!(payload[0]["points"][1]["x"], 30.0);
        assert_eq!(payload[0]["classes"][0], "Auto");
    }

    #[test]
    fn test_urls_are_joined_on_base() {
        let client = EngineClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("get_counts"), "http://localhost:8000/get_counts");

        let feed = client.feed_url();
        let millis = feed
            .strip_prefix("http://localhost:8000/video_feed?t=")
            .unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);
    }
}
