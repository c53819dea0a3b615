//! Displayed state for one torrent's detail view.
//!
//! `TorrentDetails` is the single place refresh results are applied. The
//! tree and tracker list are replaced wholesale on every applied event, so
//! nothing downstream may hold references across refreshes; per-node UI
//! state (the open-panel set) is keyed by path strings for that reason.

use std::collections::HashSet;

use crate::error::Result;
use crate::model::{Priority, TrackerRecord};
use crate::refresh::RefreshEvent;
use crate::serialize::{SerializedNode, collect_indexes, override_root_progress, serialize};
use crate::source::TorrentDataSource;
use crate::tree::{ContentTree, DEFAULT_DELIMITER, detect_delimiter};

/// Live details of a single torrent, identified by its info hash.
pub struct TorrentDetails {
    hash: String,
    nodes: Vec<SerializedNode>,
    trackers: Vec<TrackerRecord>,
    panels_open: HashSet<String>,
    paused: bool,
    loaded: bool,
    // Newest applied tick per branch; older responses are dropped.
    content_tick: u64,
    tracker_tick: u64,
}

impl TorrentDetails {
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            nodes: Vec::new(),
            trackers: Vec::new(),
            panels_open: HashSet::new(),
            paused: false,
            loaded: false,
            content_tick: 0,
            tracker_tick: 0,
        }
    }

    /// Info hash this view is bound to.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Applies one refresh event.
    ///
    /// Content events rebuild the tree from scratch and are dropped while
    /// paused or when a newer response was already applied. Tracker events
    /// are applied even while paused; pausing affects only the content
    /// branch. Failures leave the displayed state untouched.
    pub fn apply(&mut self, event: RefreshEvent) {
        match event {
            RefreshEvent::Content {
                tick,
                entries,
                torrent_progress,
            } => {
                if self.paused {
                    log::debug!("paused, ignoring content from tick {tick}");
                    return;
                }
                if tick < self.content_tick {
                    log::debug!(
                        "dropping stale content from tick {tick} (newest applied: {})",
                        self.content_tick
                    );
                    return;
                }
                self.content_tick = tick;

                let delimiter = entries
                    .first()
                    .map_or(DEFAULT_DELIMITER, |e| detect_delimiter(&e.path));
                let tree = ContentTree::build(&entries, delimiter);
                let mut nodes = serialize(&tree);
                override_root_progress(&mut nodes, torrent_progress);
                self.nodes = nodes;
                self.loaded = true;
            }
            RefreshEvent::Trackers { tick, trackers } => {
                if tick < self.tracker_tick {
                    log::debug!(
                        "dropping stale trackers from tick {tick} (newest applied: {})",
                        self.tracker_tick
                    );
                    return;
                }
                self.tracker_tick = tick;
                self.trackers = trackers;
            }
            RefreshEvent::FetchFailed { tick, kind, error } => {
                log::warn!("refresh tick {tick}: {kind:?} fetch failed: {error}");
            }
        }
    }

    /// Current display snapshot; element 0 is the root once loaded, and the
    /// slice is empty before the first applied content event.
    #[must_use]
    pub fn serialized_tree(&self) -> &[SerializedNode] {
        &self.nodes
    }

    /// Current tracker list.
    #[must_use]
    pub fn trackers(&self) -> &[TrackerRecord] {
        &self.trackers
    }

    /// True once a content event has been applied.
    #[must_use]
    pub const fn has_loaded(&self) -> bool {
        self.loaded
    }

    /// Flips the pause flag and returns the new value. While paused, fetches
    /// keep running but content results are discarded on arrival.
    pub const fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Suppresses content application until [`resume`](Self::resume).
    pub const fn pause(&mut self) {
        self.paused = true;
    }

    /// Re-enables content application.
    pub const fn resume(&mut self) {
        self.paused = false;
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Cascades `priority` over `node` and everything beneath it in one bulk
    /// request.
    ///
    /// No local state changes on success; the next refresh tick reports the
    /// new priorities back. Returns the number of file indexes updated.
    ///
    /// # Errors
    ///
    /// Propagates the data source's failure. Nothing is rolled back because
    /// nothing was mutated.
    pub async fn change_priority(
        &self,
        source: &dyn TorrentDataSource,
        node: &SerializedNode,
        priority: Priority,
    ) -> Result<usize> {
        let indexes = collect_indexes(node);
        if indexes.is_empty() {
            log::debug!("no files under {}, skipping priority update", node.path);
            return Ok(0);
        }
        source
            .set_file_priority(&self.hash, &indexes, priority)
            .await?;
        log::info!(
            "updated priority of {} file(s) under '{}'",
            indexes.len(),
            if node.path.is_empty() { "<root>" } else { node.path.as_str() }
        );
        Ok(indexes.len())
    }

    /// Marks a panel open. Panels are keyed by path because nodes are
    /// rebuilt on every refresh.
    pub fn open_panel(&mut self, path: impl Into<String>) {
        self.panels_open.insert(path.into());
    }

    pub fn close_panel(&mut self, path: &str) {
        self.panels_open.remove(path);
    }

    #[must_use]
    pub fn is_panel_open(&self, path: &str) -> bool {
        self.panels_open.contains(path)
    }
}
