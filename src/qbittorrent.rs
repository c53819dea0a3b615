//! qBittorrent Web API v2 client.
//!
//! Implements [`TorrentDataSource`] over the endpoints the details view
//! needs: content listing, trackers, the torrent summary row, and the bulk
//! file-priority update. Authentication is the WebUI's SID cookie, kept by
//! reqwest's cookie store.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::model::{ContentEntry, Priority, TorrentSummary, TrackerRecord};
use crate::source::TorrentDataSource;

fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .cookie_store(true)
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(8)
        .tcp_keepalive(Duration::from_secs(30))
        .build()
}

/// Authenticated client for one qBittorrent WebUI instance.
pub struct QbtClient {
    http: reqwest::Client,
    base_url: String,
}

impl QbtClient {
    /// Logs in and returns a ready client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when the WebUI rejects the credentials and
    /// [`Error::Http`] on transport failures.
    pub async fn connect(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let client = Self {
            http: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        };
        client.login(username, password).await?;
        Ok(client)
    }

    async fn login(&self, username: &str, password: &str) -> Result<()> {
        let url = format!("{}/api/v2/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            // The WebUI refuses logins without a matching Referer.
            .header(reqwest::header::REFERER, self.base_url.as_str())
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        if body.trim() != "Ok." {
            return Err(Error::Auth(format!(
                "login rejected for user {username}: {body}"
            )));
        }
        log::debug!("authenticated against {}", self.base_url);
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches the torrent's summary row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with status 404 when the hash is unknown to
    /// the server.
    pub async fn summary(&self, hash: &str) -> Result<TorrentSummary> {
        let rows: Vec<TorrentSummary> = self
            .get_json("/api/v2/torrents/info", &[("hashes", hash)])
            .await?;
        rows.into_iter().next().ok_or_else(|| Error::Api {
            status: 404,
            message: format!("torrent {hash} not found"),
        })
    }
}

#[async_trait]
impl TorrentDataSource for QbtClient {
    async fn content_entries(&self, hash: &str) -> Result<Vec<ContentEntry>> {
        self.get_json("/api/v2/torrents/files", &[("hash", hash)])
            .await
    }

    async fn trackers(&self, hash: &str) -> Result<Vec<TrackerRecord>> {
        self.get_json("/api/v2/torrents/trackers", &[("hash", hash)])
            .await
    }

    async fn torrent_progress(&self, hash: &str) -> Result<f64> {
        Ok(self.summary(hash).await?.progress)
    }

    async fn set_file_priority(
        &self,
        hash: &str,
        indexes: &BTreeSet<i64>,
        priority: Priority,
    ) -> Result<()> {
        let url = format!("{}/api/v2/torrents/filePrio", self.base_url);
        let ids = join_indexes(indexes);
        let priority_value = priority.as_i64().to_string();
        let response = self
            .http
            .post(&url)
            .form(&[
                ("hash", hash),
                ("id", ids.as_str()),
                ("priority", priority_value.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

/// Joins indexes with `|`, the separator the filePrio endpoint expects.
fn join_indexes(indexes: &BTreeSet<i64>) -> String {
    let mut out = String::new();
    for (i, index) in indexes.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        out.push_str(&index.to_string());
    }
    out
}
