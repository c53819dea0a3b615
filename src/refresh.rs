//! Periodic refresh of content and tracker data.
//!
//! The scheduler owns a repeating timer for one torrent. Every tick issues
//! the content branch (listing plus authoritative progress) and the tracker
//! branch concurrently; each branch pushes its own [`RefreshEvent`] as soon
//! as it completes, so the two can arrive in either order. Ticks never block
//! on a slow server: a fetch may still be in flight when the next tick
//! fires, which is why every event carries the tick id that issued it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::model::{ContentEntry, TrackerRecord};
use crate::source::TorrentDataSource;

/// Which of a tick's two independent fetches an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Content,
    Trackers,
}

/// Events pushed from the refresh task to whoever owns the displayed state.
#[derive(Debug)]
pub enum RefreshEvent {
    /// Fresh content listing plus the torrent-level progress fetched in the
    /// same tick.
    Content {
        tick: u64,
        entries: Vec<ContentEntry>,
        torrent_progress: f64,
    },
    /// Fresh tracker list.
    Trackers {
        tick: u64,
        trackers: Vec<TrackerRecord>,
    },
    /// One branch of a tick failed; displayed state stays as it was and the
    /// next tick retries.
    FetchFailed {
        tick: u64,
        kind: FetchKind,
        error: String,
    },
}

impl RefreshEvent {
    /// Tick id that issued this event.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        match self {
            Self::Content { tick, .. }
            | Self::Trackers { tick, .. }
            | Self::FetchFailed { tick, .. } => *tick,
        }
    }
}

/// Owns the repeating refresh timer for one torrent.
///
/// The timer keeps firing while the consumer is paused; suppression happens
/// where events are applied, not where they are produced. [`stop`] cancels
/// the timer only: fetches already in flight run to completion and their
/// sends land on a closed channel, where they are dropped.
///
/// [`stop`]: Self::stop
pub struct RefreshScheduler {
    events: mpsc::UnboundedReceiver<RefreshEvent>,
    token: CancellationToken,
}

impl RefreshScheduler {
    /// Starts the refresh loop. The first tick fires immediately, so the
    /// view populates without waiting a full interval.
    #[must_use]
    pub fn start(
        source: Arc<dyn TorrentDataSource>,
        hash: impl Into<String>,
        interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let hash = hash.into();
        let loop_token = token.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick: u64 = 0;
            loop {
                tokio::select! {
                    () = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        tick += 1;
                        tokio::spawn(run_tick(
                            Arc::clone(&source),
                            hash.clone(),
                            tick,
                            tx.clone(),
                        ));
                    }
                }
            }
            log::debug!("refresh loop for {hash} stopped after {tick} tick(s)");
        });

        Self { events: rx, token }
    }

    /// Waits for the next refresh event. Returns `None` once the scheduler
    /// is stopped and all buffered events are drained.
    pub async fn recv(&mut self) -> Option<RefreshEvent> {
        self.events.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<RefreshEvent> {
        self.events.try_recv().ok()
    }

    /// Cancels the repeating timer. Idempotent.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// True once [`stop`](Self::stop) has been called (or the scheduler
    /// dropped).
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// One tick: both branches are issued together and complete independently.
async fn run_tick(
    source: Arc<dyn TorrentDataSource>,
    hash: String,
    tick: u64,
    tx: mpsc::UnboundedSender<RefreshEvent>,
) {
    let content_tx = tx.clone();
    let content_source = Arc::clone(&source);
    let content_hash = hash.clone();
    let content = async move {
        let event = match futures::future::try_join(
            content_source.content_entries(&content_hash),
            content_source.torrent_progress(&content_hash),
        )
        .await
        {
            Ok((entries, torrent_progress)) => RefreshEvent::Content {
                tick,
                entries,
                torrent_progress,
            },
            Err(e) => RefreshEvent::FetchFailed {
                tick,
                kind: FetchKind::Content,
                error: e.to_string(),
            },
        };
        // Receiver gone means the view was torn down; drop the result.
        let _ = content_tx.send(event);
    };

    let trackers = async move {
        let event = match source.trackers(&hash).await {
            Ok(trackers) => RefreshEvent::Trackers { tick, trackers },
            Err(e) => RefreshEvent::FetchFailed {
                tick,
                kind: FetchKind::Trackers,
                error: e.to_string(),
            },
        };
        let _ = tx.send(event);
    };

    futures::future::join(content, trackers).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::Priority;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use async_trait::async_trait;

    struct MockSource {
        fail_content: AtomicBool,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                fail_content: AtomicBool::new(false),
            }
        }

        fn failing_content() -> Self {
            Self {
                fail_content: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl TorrentDataSource for MockSource {
        async fn content_entries(&self, _hash: &str) -> Result<Vec<ContentEntry>> {
            if self.fail_content.load(Ordering::SeqCst) {
                return Err(Error::Auth("boom".to_string()));
            }
            Ok(vec![ContentEntry {
                index: 0,
                path: "a/b.txt".to_string(),
                size: 10,
                progress: 0.5,
                priority: Priority::Normal,
                availability: 0.0,
            }])
        }

        async fn trackers(&self, _hash: &str) -> Result<Vec<TrackerRecord>> {
            Ok(vec![TrackerRecord {
                url: "udp://t.example:6969".to_string(),
                status: 2,
                tier: 0,
                num_peers: 1,
                num_seeds: 1,
                num_leeches: 0,
                num_downloaded: 0,
                msg: String::new(),
            }])
        }

        async fn torrent_progress(&self, _hash: &str) -> Result<f64> {
            Ok(0.75)
        }

        async fn set_file_priority(
            &self,
            _hash: &str,
            _indexes: &BTreeSet<i64>,
            _priority: Priority,
        ) -> Result<()> {
            Ok(())
        }
    }

    async fn next_event(scheduler: &mut RefreshScheduler) -> RefreshEvent {
        tokio::time::timeout(Duration::from_secs(5), scheduler.recv())
            .await
            .expect("event within the timeout")
            .expect("channel still open")
    }

    #[tokio::test]
    async fn first_tick_emits_both_branches() {
        let mut scheduler = RefreshScheduler::start(
            Arc::new(MockSource::new()),
            "hash",
            Duration::from_secs(60),
        );

        let mut got_content = false;
        let mut got_trackers = false;
        for _ in 0..2 {
            match next_event(&mut scheduler).await {
                RefreshEvent::Content {
                    tick,
                    entries,
                    torrent_progress,
                } => {
                    assert_eq!(tick, 1);
                    assert_eq!(entries.len(), 1);
                    assert!((torrent_progress - 0.75).abs() < f64::EPSILON);
                    got_content = true;
                }
                RefreshEvent::Trackers { tick, trackers } => {
                    assert_eq!(tick, 1);
                    assert_eq!(trackers.len(), 1);
                    got_trackers = true;
                }
                RefreshEvent::FetchFailed { error, .. } => panic!("unexpected failure: {error}"),
            }
        }
        assert!(got_content && got_trackers);
        scheduler.stop();
    }

    #[tokio::test]
    async fn content_failure_does_not_stop_the_trackers_branch_or_later_ticks() {
        let mut scheduler = RefreshScheduler::start(
            Arc::new(MockSource::failing_content()),
            "hash",
            Duration::from_millis(20),
        );

        let mut failures = 0;
        let mut tracker_batches = 0;
        let mut last_tick = 0;
        while failures < 2 || tracker_batches < 2 {
            match next_event(&mut scheduler).await {
                RefreshEvent::FetchFailed { tick, kind, error } => {
                    assert_eq!(kind, FetchKind::Content);
                    assert!(error.contains("boom"));
                    last_tick = last_tick.max(tick);
                    failures += 1;
                }
                RefreshEvent::Trackers { tick, .. } => {
                    last_tick = last_tick.max(tick);
                    tracker_batches += 1;
                }
                RefreshEvent::Content { .. } => panic!("content fetch should fail"),
            }
        }
        // More than one tick ran despite the failures.
        assert!(last_tick >= 2);
        scheduler.stop();
    }

    #[tokio::test]
    async fn stop_closes_the_event_stream() {
        let mut scheduler = RefreshScheduler::start(
            Arc::new(MockSource::new()),
            "hash",
            Duration::from_millis(10),
        );

        let _ = next_event(&mut scheduler).await;
        scheduler.stop();
        assert!(scheduler.is_stopped());

        // Buffered and in-flight events drain, then the stream ends.
        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while scheduler.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok(), "stream should end after stop");
    }

    #[tokio::test]
    async fn tick_ids_increase() {
        let mut scheduler = RefreshScheduler::start(
            Arc::new(MockSource::new()),
            "hash",
            Duration::from_millis(10),
        );

        let mut ticks = Vec::new();
        for _ in 0..6 {
            ticks.push(next_event(&mut scheduler).await.tick());
        }
        assert_eq!(ticks.iter().min(), Some(&1));
        assert!(*ticks.iter().max().unwrap() >= 2);
        scheduler.stop();
    }
}
