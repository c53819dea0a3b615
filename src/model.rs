//! Records exchanged with the torrent data source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Download priority of a single file, in the qBittorrent Web API encoding.
///
/// The API reports 0 (skip), 1 or 4 (normal, depending on server version),
/// 6 (high) and 7 (maximum). Unknown values collapse to `Normal` rather than
/// failing the whole listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Priority {
    /// Do not download.
    Skip,
    /// Default priority.
    Normal,
    /// High priority.
    High,
    /// Maximal priority.
    Maximum,
}

impl Priority {
    /// Canonical wire value sent back in priority updates.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Skip => 0,
            Self::Normal => 1,
            Self::High => 6,
            Self::Maximum => 7,
        }
    }
}

impl From<i64> for Priority {
    fn from(raw: i64) -> Self {
        match raw {
            0 => Self::Skip,
            6 => Self::High,
            7 => Self::Maximum,
            _ => Self::Normal,
        }
    }
}

impl From<Priority> for i64 {
    fn from(priority: Priority) -> Self {
        priority.as_i64()
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" | "0" => Ok(Self::Skip),
            "normal" | "1" => Ok(Self::Normal),
            "high" | "6" => Ok(Self::High),
            "max" | "maximum" | "7" => Ok(Self::Maximum),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// One file as reported by `GET /api/v2/torrents/files`.
///
/// The API calls the path field `name`; it holds the full delimited path
/// within the torrent, not a basename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Stable identifier used in priority-update requests, unique per torrent.
    pub index: i64,
    /// Delimited path, e.g. `movie/subs/en.srt`.
    #[serde(rename = "name")]
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Completion fraction in `0..=1`.
    pub progress: f64,
    /// Current download priority.
    pub priority: Priority,
    /// Piece availability as reported by the server.
    #[serde(default)]
    pub availability: f64,
}

/// One tracker row from `GET /api/v2/torrents/trackers`.
///
/// The refresh path passes these through untouched; the explicit shape is
/// for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerRecord {
    /// Tracker announce URL.
    pub url: String,
    /// 0 disabled, 1 not contacted, 2 working, 3 updating, 4 not working.
    pub status: i32,
    /// Tracker tier; special rows (DHT, PeX) report nonsense here.
    #[serde(default)]
    pub tier: i32,
    #[serde(default)]
    pub num_peers: i32,
    #[serde(default)]
    pub num_seeds: i32,
    #[serde(default)]
    pub num_leeches: i32,
    #[serde(default)]
    pub num_downloaded: i32,
    /// Last message from the tracker, empty if none.
    #[serde(default)]
    pub msg: String,
}

impl TrackerRecord {
    /// True if the tracker answered the last announce.
    #[must_use]
    pub const fn is_working(&self) -> bool {
        self.status == 2
    }
}

/// Torrent-level summary row from `GET /api/v2/torrents/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentSummary {
    pub hash: String,
    pub name: String,
    /// Authoritative completion fraction; replaces the tree aggregate at the
    /// root of the displayed sequence.
    pub progress: f64,
    pub total_size: u64,
    pub downloaded: u64,
    pub uploaded: u64,
    pub dlspeed: u64,
    pub upspeed: u64,
    pub ratio: f64,
    pub state: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub added_on: DateTime<Utc>,
    /// Raw completion timestamp; garbage until the torrent completes.
    pub completion_on: i64,
}

impl TorrentSummary {
    /// Completion time, if the torrent has finished.
    #[must_use]
    pub fn completed_on(&self) -> Option<DateTime<Utc>> {
        if self.completion_on > 0 {
            DateTime::from_timestamp(self.completion_on, 0)
        } else {
            None
        }
    }
}
