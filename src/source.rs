//! Data-source abstraction consumed by the refresh and priority paths.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ContentEntry, Priority, TrackerRecord};

/// Narrow contract over whatever backend serves torrent details.
///
/// Implementations are free to fail any call; callers treat failures as
/// transient and retry on the next refresh tick.
#[async_trait]
pub trait TorrentDataSource: Send + Sync {
    /// Fetches the flat per-file content listing of a torrent.
    async fn content_entries(&self, hash: &str) -> Result<Vec<ContentEntry>>;

    /// Fetches the tracker list of a torrent.
    async fn trackers(&self, hash: &str) -> Result<Vec<TrackerRecord>>;

    /// Returns the authoritative torrent-level progress in `0..=1`.
    async fn torrent_progress(&self, hash: &str) -> Result<f64>;

    /// Applies one priority to every listed file index in a single request.
    async fn set_file_priority(
        &self,
        hash: &str,
        indexes: &BTreeSet<i64>,
        priority: Priority,
    ) -> Result<()>;
}
