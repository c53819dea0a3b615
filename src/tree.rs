//! Flat-to-tree reconstruction of a torrent's content listing.
//!
//! The data source reports files as a flat list of delimited paths. This
//! module rebuilds the implied directory hierarchy over an index-addressed
//! arena so the whole structure can be rebuilt and discarded wholesale on
//! every refresh.

use std::collections::HashMap;

use indextree::{Arena, NodeId};

use crate::model::{ContentEntry, Priority};

/// Path separator assumed when a sample gives no better hint.
pub const DEFAULT_DELIMITER: char = '/';

/// Picks the path delimiter used by a content listing.
///
/// Listings use `/` on most platforms and `\` on Windows; whichever occurs
/// in the sample wins, `/` if neither does.
#[must_use]
pub fn detect_delimiter(sample: &str) -> char {
    if sample.contains('/') {
        '/'
    } else if sample.contains('\\') {
        '\\'
    } else {
        DEFAULT_DELIMITER
    }
}

/// Whether a node is a file or a reconstructed directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// Payload of one arena node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Last path segment; empty for the root.
    pub name: String,
    /// Full path from the torrent root.
    pub path: String,
    /// Full path of the containing directory; empty for top-level nodes.
    pub parent_path: String,
    pub kind: NodeKind,
    /// Own size for files; directories carry 0 here and are aggregated at
    /// serialization time.
    pub size: u64,
    pub progress: f64,
    pub priority: Priority,
    /// Content-entry index; `Some` only for files.
    pub index: Option<i64>,
}

impl NodeData {
    fn directory(name: &str, path: String, parent_path: String) -> Self {
        Self {
            name: name.to_string(),
            path,
            parent_path,
            kind: NodeKind::Directory,
            size: 0,
            progress: 0.0,
            priority: Priority::Normal,
            index: None,
        }
    }

    fn file(name: &str, path: String, parent_path: String, entry: &ContentEntry) -> Self {
        Self {
            name: name.to_string(),
            path,
            parent_path,
            kind: NodeKind::File,
            size: entry.size,
            progress: entry.progress,
            priority: entry.priority,
            index: Some(entry.index),
        }
    }
}

/// A torrent's content listing rebuilt as a rooted tree.
///
/// Directory nodes are deduplicated by full path; file nodes are inserted
/// once per entry, in input order, even when two entries resolve to the same
/// path. The tree owns all of its nodes and is cheap to drop.
pub struct ContentTree {
    arena: Arena<NodeData>,
    root: NodeId,
    dirs: HashMap<String, NodeId>,
}

impl ContentTree {
    /// Builds the tree for `entries`, splitting paths on `delimiter`.
    ///
    /// Runs in time linear in the total number of path segments; directory
    /// lookup is a hash-map hit, not a sibling scan.
    #[must_use]
    pub fn build(entries: &[ContentEntry], delimiter: char) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData::directory("", String::new(), String::new()));
        let mut dirs = HashMap::new();
        dirs.insert(String::new(), root);

        let mut tree = Self { arena, root, dirs };
        for entry in entries {
            tree.insert(entry, delimiter);
        }
        tree
    }

    fn insert(&mut self, entry: &ContentEntry, delimiter: char) {
        let mut segments: Vec<&str> = entry
            .path
            .split(delimiter)
            .filter(|s| !s.is_empty())
            .collect();
        // Empty or delimiter-only paths degrade to a file directly under
        // root, named by the raw path string.
        if segments.is_empty() {
            segments.push(entry.path.as_str());
        }

        let mut parent = self.root;
        let mut prefix = String::new();
        for &segment in &segments[..segments.len() - 1] {
            let full = join_path(&prefix, segment, delimiter);
            parent = match self.dirs.get(&full) {
                Some(&id) => id,
                None => {
                    let id = self
                        .arena
                        .new_node(NodeData::directory(segment, full.clone(), prefix.clone()));
                    parent.append(id, &mut self.arena);
                    self.dirs.insert(full.clone(), id);
                    id
                }
            };
            prefix = full;
        }

        let name = segments[segments.len() - 1];
        let full = join_path(&prefix, name, delimiter);
        let file = self
            .arena
            .new_node(NodeData::file(name, full, prefix, entry));
        parent.append(file, &mut self.arena);
    }

    /// Root node id; always a directory with an empty path.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// The backing arena, for traversal.
    #[must_use]
    pub const fn arena(&self) -> &Arena<NodeData> {
        &self.arena
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.count()
    }

    /// Looks up a directory node by its full path.
    #[must_use]
    pub fn directory(&self, path: &str) -> Option<NodeId> {
        self.dirs.get(path).copied()
    }
}

fn join_path(prefix: &str, segment: &str, delimiter: char) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}{delimiter}{segment}")
    }
}
