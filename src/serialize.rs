//! Display-facing projection of a content tree.
//!
//! Serialization walks the tree depth first, parent before children, and
//! emits a sequence whose element 0 is the torrent root. Directory sizes and
//! progress are aggregated from their descendants on the way out; the root's
//! progress is then overwritten with the torrent-level figure, which accounts
//! for piece state the flat listing cannot represent.

use std::collections::BTreeSet;

use indextree::{Arena, NodeId};

use crate::model::Priority;
use crate::tree::{ContentTree, NodeData, NodeKind};

/// One node of the display tree.
///
/// Children nest structurally; the flat part of the contract is the
/// top-level `Vec` returned by [`serialize`], indexable by position.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedNode {
    /// Last path segment; empty for the root.
    pub name: String,
    /// Full path from the torrent root.
    pub path: String,
    /// Full path of the containing directory.
    pub parent_path: String,
    pub kind: NodeKind,
    /// File size, or the summed descendant size for directories.
    pub size: u64,
    /// File progress, or the size-weighted descendant average for
    /// directories (0 when the subtree is empty).
    pub progress: f64,
    pub priority: Priority,
    /// Content-entry index; `Some` only for files.
    pub index: Option<i64>,
    pub children: Vec<SerializedNode>,
}

impl SerializedNode {
    /// True for file nodes.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Number of file nodes at or below this node.
    #[must_use]
    pub fn file_count(&self) -> usize {
        let own = usize::from(self.is_file());
        own + self.children.iter().map(Self::file_count).sum::<usize>()
    }
}

/// Serializes a tree into its display sequence.
///
/// Pure: the same tree serializes to structurally identical output every
/// time. Element 0 is always the root.
#[must_use]
pub fn serialize(tree: &ContentTree) -> Vec<SerializedNode> {
    vec![serialize_node(tree.arena(), tree.root())]
}

#[allow(clippy::cast_precision_loss)]
fn serialize_node(arena: &Arena<NodeData>, id: NodeId) -> SerializedNode {
    let data = arena[id].get();
    let children: Vec<SerializedNode> = id
        .children(arena)
        .map(|child| serialize_node(arena, child))
        .collect();

    let mut node = SerializedNode {
        name: data.name.clone(),
        path: data.path.clone(),
        parent_path: data.parent_path.clone(),
        kind: data.kind,
        size: data.size,
        progress: data.progress,
        priority: data.priority,
        index: data.index,
        children,
    };

    if node.kind == NodeKind::Directory {
        // Children are already aggregated, so weighting by their sizes is
        // equivalent to weighting by every descendant file.
        let total: u64 = node.children.iter().map(|c| c.size).sum();
        node.size = total;
        node.progress = if total == 0 {
            0.0
        } else {
            node.children
                .iter()
                .map(|c| c.size as f64 * c.progress)
                .sum::<f64>()
                / total as f64
        };
    }

    node
}

/// Replaces the root's progress with the torrent-level value.
///
/// The server's figure is authoritative; the aggregated value stays on
/// sub-directories only.
pub fn override_root_progress(nodes: &mut [SerializedNode], torrent_progress: f64) {
    if let Some(root) = nodes.first_mut() {
        root.progress = torrent_progress;
    }
}

/// Collects the content-entry indexes of every file at or below `node`.
///
/// Directories contribute nothing of their own. The set form deduplicates
/// defensively and gives the bulk-update request a deterministic order.
#[must_use]
pub fn collect_indexes(node: &SerializedNode) -> BTreeSet<i64> {
    let mut indexes = BTreeSet::new();
    collect_into(node, &mut indexes);
    indexes
}

fn collect_into(node: &SerializedNode, indexes: &mut BTreeSet<i64>) {
    if let Some(index) = node.index {
        indexes.insert(index);
    }
    for child in &node.children {
        collect_into(child, indexes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentEntry;

    fn entry(index: i64, path: &str, size: u64, progress: f64) -> ContentEntry {
        ContentEntry {
            index,
            path: path.to_string(),
            size,
            progress,
            priority: Priority::Normal,
            availability: 0.0,
        }
    }

    fn serialize_entries(entries: &[ContentEntry]) -> Vec<SerializedNode> {
        serialize(&ContentTree::build(entries, '/'))
    }

    #[test]
    fn root_is_element_zero() {
        let nodes = serialize_entries(&[entry(0, "a/b.txt", 10, 0.0)]);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, NodeKind::Directory);
        assert!(nodes[0].path.is_empty());
    }

    #[test]
    fn round_trip_preserves_every_file() {
        let entries = vec![
            entry(0, "a/b.txt", 100, 1.0),
            entry(1, "a/c/d.txt", 200, 0.25),
            entry(2, "top.iso", 300, 0.5),
        ];
        let nodes = serialize_entries(&entries);
        assert_eq!(nodes[0].file_count(), entries.len());

        fn find<'a>(node: &'a SerializedNode, path: &str) -> Option<&'a SerializedNode> {
            if node.path == path {
                return Some(node);
            }
            node.children.iter().find_map(|c| find(c, path))
        }

        for e in &entries {
            let file = find(&nodes[0], &e.path).expect("file survives the round trip");
            assert_eq!(file.index, Some(e.index));
            assert_eq!(file.size, e.size);
            assert!((file.progress - e.progress).abs() < f64::EPSILON);
            assert_eq!(file.priority, e.priority);
        }
    }

    #[test]
    fn directory_aggregates_size_and_weighted_progress() {
        let entries = vec![
            entry(0, "a/b.txt", 100, 1.0),
            entry(1, "a/c.txt", 300, 0.5),
        ];
        let nodes = serialize_entries(&entries);
        let a = &nodes[0].children[0];
        assert_eq!(a.path, "a");
        assert_eq!(a.size, 400);
        // (100 * 1.0 + 300 * 0.5) / 400
        assert!((a.progress - 0.625).abs() < 1e-9);
    }

    #[test]
    fn aggregation_spans_nested_directories() {
        let entries = vec![
            entry(0, "a/x/f1", 100, 1.0),
            entry(1, "a/x/f2", 100, 0.0),
            entry(2, "a/f3", 200, 0.5),
        ];
        let nodes = serialize_entries(&entries);
        let a = &nodes[0].children[0];
        assert_eq!(a.size, 400);
        // x aggregates to 0.5 over 200 bytes, f3 is 0.5 over 200 bytes
        assert!((a.progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_directory_reports_zero_progress() {
        let entries = vec![entry(0, "a/empty.txt", 0, 1.0)];
        let nodes = serialize_entries(&entries);
        let a = &nodes[0].children[0];
        assert_eq!(a.size, 0);
        assert!((a.progress - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn root_override_beats_the_aggregate() {
        let entries = vec![entry(0, "a/b.txt", 100, 1.0)];
        let mut nodes = serialize_entries(&entries);
        assert!((nodes[0].progress - 1.0).abs() < f64::EPSILON);
        override_root_progress(&mut nodes, 0.42);
        assert!((nodes[0].progress - 0.42).abs() < f64::EPSILON);
        // Children keep their aggregated values.
        assert!((nodes[0].children[0].progress - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn serialization_is_repeatable() {
        let entries = vec![
            entry(0, "a/b.txt", 100, 0.5),
            entry(1, "a/c/d.txt", 50, 0.25),
        ];
        let tree = ContentTree::build(&entries, '/');
        assert_eq!(serialize(&tree), serialize(&tree));
    }

    #[test]
    fn cascade_collects_every_descendant_index() {
        let entries = vec![
            entry(0, "a/b.txt", 1, 0.0),
            entry(1, "a/c/d.txt", 1, 0.0),
            entry(2, "a/c/e.txt", 1, 0.0),
            entry(3, "other.txt", 1, 0.0),
        ];
        let nodes = serialize_entries(&entries);
        let a = &nodes[0].children[0];
        assert_eq!(collect_indexes(a), BTreeSet::from([0, 1, 2]));
        assert_eq!(
            collect_indexes(&nodes[0]),
            BTreeSet::from([0, 1, 2, 3])
        );
    }

    #[test]
    fn cascade_deduplicates_repeated_indexes() {
        // Two entries with the same index under one directory, as a
        // misbehaving server could produce.
        let entries = vec![entry(7, "a/dup.bin", 1, 0.0), entry(7, "a/dup.bin", 1, 0.0)];
        let nodes = serialize_entries(&entries);
        let a = &nodes[0].children[0];
        assert_eq!(a.file_count(), 2);
        assert_eq!(collect_indexes(a), BTreeSet::from([7]));
    }

    #[test]
    fn file_node_cascade_is_itself() {
        let nodes = serialize_entries(&[entry(5, "solo.bin", 1, 0.0)]);
        let file = &nodes[0].children[0];
        assert_eq!(collect_indexes(file), BTreeSet::from([5]));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_entries() -> impl Strategy<Value = Vec<ContentEntry>> {
            let segment = prop_oneof![
                Just("a".to_string()),
                Just("b".to_string()),
                Just("dir".to_string()),
                Just("file.bin".to_string()),
            ];
            let path = prop::collection::vec(segment, 1..5).prop_map(|s| s.join("/"));
            prop::collection::vec(
                (0i64..1000, path, 0u64..1_000_000, 0.0f64..=1.0),
                0..40,
            )
            .prop_map(|raw| {
                raw.into_iter()
                    .map(|(index, path, size, progress)| ContentEntry {
                        index,
                        path,
                        size,
                        progress,
                        priority: Priority::Normal,
                        availability: 0.0,
                    })
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn every_entry_survives_as_a_file(entries in arb_entries()) {
                let nodes = serialize_entries(&entries);
                prop_assert_eq!(nodes[0].file_count(), entries.len());
            }

            #[test]
            fn root_size_is_the_total(entries in arb_entries()) {
                let nodes = serialize_entries(&entries);
                let total: u64 = entries.iter().map(|e| e.size).sum();
                prop_assert_eq!(nodes[0].size, total);
            }

            #[test]
            fn directory_progress_stays_in_range(entries in arb_entries()) {
                fn check(node: &SerializedNode) {
                    // Small tolerance for summation rounding.
                    assert!(node.progress >= 0.0 && node.progress <= 1.0 + 1e-9);
                    node.children.iter().for_each(check);
                }
                let nodes = serialize_entries(&entries);
                check(&nodes[0]);
            }
        }
    }
}
