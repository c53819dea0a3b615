//! qbt-inspect - live details for a single qBittorrent torrent.
//!
//! This library rebuilds a torrent's flat content listing into a
//! file/directory tree, keeps it refreshed on a periodic schedule, and
//! supports cascading priority updates over whole sub-trees, abstracted
//! from any specific UI framework.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use qbt_inspect::{QbtClient, QualityTier, RefreshScheduler, TorrentDetails};
//!
//! # async fn example() -> qbt_inspect::Result<()> {
//! // Authenticate against the WebUI
//! let client = Arc::new(QbtClient::connect("http://localhost:8080", "admin", "secret").await?);
//!
//! let mut details = TorrentDetails::new("d0d14c926e6e99761a2fdcff27b403d96376eff6");
//! let mut scheduler = RefreshScheduler::start(
//!     client.clone(),
//!     details.hash().to_string(),
//!     QualityTier::Medium.refresh_interval(),
//! );
//!
//! while let Some(event) = scheduler.recv().await {
//!     details.apply(event);
//!     // hand details.serialized_tree() to the presentation layer
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod details;
pub mod error;
pub mod format;
pub mod model;
pub mod network;
pub mod qbittorrent;
pub mod refresh;
pub mod serialize;
pub mod source;
pub mod tree;

// Re-export main types for convenience
pub use config::{InspectConfig, RefreshConfig, WebUiConfig};
pub use details::TorrentDetails;
pub use error::{Error, Result};
pub use model::{ContentEntry, Priority, TorrentSummary, TrackerRecord};
pub use network::QualityTier;
pub use qbittorrent::QbtClient;
pub use refresh::{FetchKind, RefreshEvent, RefreshScheduler};
pub use serialize::{SerializedNode, collect_indexes, override_root_progress, serialize};
pub use source::TorrentDataSource;
pub use tree::{ContentTree, NodeData, NodeKind, detect_delimiter};
