//! Arena view over a set of records and the nested tree built from it.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use bytecloud_core::types::FileId;

use super::model::FileRecord;

/// A node in a nested file tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    /// Record ID.
    pub id: FileId,
    /// Display name.
    pub name: String,
    /// Full path.
    pub path: String,
    /// Folder or file.
    pub is_folder: bool,
    /// Depth below the tree root (0 for roots).
    pub depth: u32,
    /// Number of direct children.
    pub child_count: u64,
    /// Child nodes, folders first then by name.
    pub children: Vec<FileNode>,
}

/// A complete tree rooted at one record or at the user's root level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTree {
    /// The root node(s) of the tree.
    pub roots: Vec<FileNode>,
    /// Total number of nodes in the tree.
    pub total_nodes: u64,
}

impl FileTree {
    /// Create an empty tree.
    pub fn empty() -> Self {
        Self {
            roots: Vec::new(),
            total_nodes: 0,
        }
    }
}

/// Records keyed by id, with the parent→children index kept as a derived view.
///
/// A record whose parent is not part of the arena is treated as a root, so
/// a forest can be built from any subset (a single subtree, one user's
/// records, ...). Traversals track visited ids and terminate even if the
/// stored links contain a cycle.
#[derive(Debug, Clone, Default)]
pub struct FileForest {
    records: HashMap<FileId, FileRecord>,
    children: HashMap<FileId, Vec<FileId>>,
    roots: Vec<FileId>,
}

impl FileForest {
    /// Build the arena and its indices.
    pub fn new(records: impl IntoIterator<Item = FileRecord>) -> Self {
        let records: HashMap<FileId, FileRecord> =
            records.into_iter().map(|r| (r.id, r)).collect();

        let mut children: HashMap<FileId, Vec<FileId>> = HashMap::new();
        let mut roots = Vec::new();
        for record in records.values() {
            match record.parent_id {
                Some(parent) if records.contains_key(&parent) => {
                    children.entry(parent).or_default().push(record.id)
                }
                _ => roots.push(record.id),
            }
        }

        let order = |ids: &mut Vec<FileId>| {
            ids.sort_by(|a, b| {
                let (ra, rb) = (&records[a], &records[b]);
                rb.is_folder
                    .cmp(&ra.is_folder)
                    .then_with(|| ra.name.to_lowercase().cmp(&rb.name.to_lowercase()))
                    .then_with(|| ra.id.as_uuid().cmp(rb.id.as_uuid()))
            })
        };
        order(&mut roots);
        for ids in children.values_mut() {
            order(ids);
        }

        Self {
            records,
            children,
            roots,
        }
    }

    /// Number of records in the arena.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record.
    pub fn get(&self, id: FileId) -> Option<&FileRecord> {
        self.records.get(&id)
    }

    /// Records without a parent inside the arena.
    pub fn roots(&self) -> impl Iterator<Item = &FileRecord> {
        self.roots.iter().map(|id| &self.records[id])
    }

    /// Direct children of `id`.
    pub fn children(&self, id: FileId) -> impl Iterator<Item = &FileRecord> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .map(|child| &self.records[child])
    }

    /// Ancestor chain of `id`, nearest parent first.
    pub fn ancestors(&self, id: FileId) -> Vec<&FileRecord> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.records.get(&id).and_then(|r| r.parent_id);

        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                break;
            }
            let Some(parent) = self.records.get(&parent_id) else {
                break;
            };
            chain.push(parent);
            current = parent.parent_id;
        }
        chain
    }

    /// Every record below `id`, breadth first.
    pub fn descendants(&self, id: FileId) -> Vec<&FileRecord> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            for child in self.children(current) {
                if seen.insert(child.id) {
                    out.push(child);
                    queue.push_back(child.id);
                }
            }
        }
        out
    }

    /// Whether re-parenting `id` under `new_parent` would close a loop.
    pub fn would_create_cycle(&self, id: FileId, new_parent: Option<FileId>) -> bool {
        match new_parent {
            None => false,
            Some(parent) if parent == id => true,
            Some(parent) => self.ancestors(parent).iter().any(|a| a.id == id),
        }
    }

    /// Nested tree below `root`, or below the arena roots when `None`.
    pub fn tree(&self, root: Option<FileId>) -> FileTree {
        let mut seen = HashSet::new();
        let roots: Vec<FileNode> = match root {
            Some(id) => self
                .records
                .get(&id)
                .map(|r| self.node(r, 0, &mut seen))
                .into_iter()
                .collect(),
            None => self
                .roots()
                .map(|r| self.node(r, 0, &mut seen))
                .collect(),
        };

        FileTree {
            roots,
            total_nodes: seen.len() as u64,
        }
    }

    fn node(&self, record: &FileRecord, depth: u32, seen: &mut HashSet<FileId>) -> FileNode {
        seen.insert(record.id);
        let mut children = Vec::new();
        for child in self.children(record.id) {
            if !seen.contains(&child.id) {
                children.push(self.node(child, depth + 1, seen));
            }
        }

        FileNode {
            id: record.id,
            name: record.name.clone(),
            path: record.path.clone(),
            is_folder: record.is_folder,
            depth,
            child_count: children.len() as u64,
            children,
        }
    }
}

/// Give `root_id` the path `root_path` and recompute every descendant path from it.
///
/// `records` is the subtree of `root_id`; records outside it keep their path.
pub fn rebase_paths(
    root_id: FileId,
    mut records: Vec<FileRecord>,
    root_path: String,
) -> Vec<FileRecord> {
    let forest = FileForest::new(records.iter().cloned());
    let mut paths = HashMap::from([(root_id, root_path)]);
    for record in forest.descendants(root_id) {
        let Some(parent_path) = record.parent_id.and_then(|p| paths.get(&p)) else {
            continue;
        };
        let path = format!("{}/{}", parent_path.trim_end_matches('/'), record.name);
        paths.insert(record.id, path);
    }

    for record in &mut records {
        if let Some(path) = paths.remove(&record.id) {
            record.path = path;
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::file::model::{CreateFileRecord, FOLDER_TYPE};

    fn make(name: &str, parent: Option<&FileRecord>, is_folder: bool) -> FileRecord {
        CreateFileRecord {
            name: name.to_string(),
            path: parent
                .map(|p| p.child_path(name))
                .unwrap_or_else(|| FileRecord::root_path(name)),
            size: if is_folder { 0 } else { 10 },
            file_type: (if is_folder { FOLDER_TYPE } else { "text/plain" }).to_string(),
            file_url: String::new(),
            thumbnail_url: None,
            user_id: "user_1".to_string(),
            parent_id: parent.map(|p| p.id),
            is_folder,
        }
        .into_record(Utc::now())
    }

    #[test]
    fn test_indices_and_traversals() {
        let docs = make("docs", None, true);
        let work = make("work", Some(&docs), true);
        let report = make("report.txt", Some(&work), false);
        let notes = make("notes.txt", None, false);

        let forest = FileForest::new(vec![
            docs.clone(),
            work.clone(),
            report.clone(),
            notes.clone(),
        ]);

        let roots: Vec<_> = forest.roots().map(|r| r.name.as_str()).collect();
        assert_eq!(roots, vec!["docs", "notes.txt"]);

        let ancestors: Vec<_> = forest.ancestors(report.id).iter().map(|r| r.id).collect();
        assert_eq!(ancestors, vec![work.id, docs.id]);

        let descendants: Vec<_> = forest.descendants(docs.id).iter().map(|r| r.id).collect();
        assert_eq!(descendants, vec![work.id, report.id]);
    }

    #[test]
    fn test_cycle_detection() {
        let a = make("a", None, true);
        let b = make("b", Some(&a), true);
        let c = make("c", Some(&b), true);
        let forest = FileForest::new(vec![a.clone(), b.clone(), c.clone()]);

        assert!(forest.would_create_cycle(a.id, Some(a.id)));
        assert!(forest.would_create_cycle(a.id, Some(c.id)));
        assert!(!forest.would_create_cycle(c.id, Some(a.id)));
        assert!(!forest.would_create_cycle(b.id, None));
    }

    #[test]
    fn test_rebase_paths_follows_new_root() {
        let a = make("a", None, true);
        let b = make("b", Some(&a), true);
        let c = make("c.txt", Some(&b), false);

        let rebased = rebase_paths(b.id, vec![b.clone(), c.clone()], "/x/b".to_string());
        let paths: Vec<_> = rebased.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/x/b", "/x/b/c.txt"]);
    }

    #[test]
    fn test_traversals_terminate_on_corrupt_links() {
        let mut a = make("a", None, true);
        let b = make("b", Some(&a), true);
        a.parent_id = Some(b.id);

        let forest = FileForest::new(vec![a.clone(), b.clone()]);
        assert_eq!(forest.ancestors(a.id).len(), 1);
        assert_eq!(forest.descendants(a.id).len(), 1);
        assert_eq!(forest.tree(Some(a.id)).total_nodes, 2);
    }

    #[test]
    fn test_tree_orders_folders_first() {
        let root = make("root", None, true);
        let file = make("a.txt", Some(&root), false);
        let folder = make("z", Some(&root), true);
        let forest = FileForest::new(vec![root.clone(), file, folder]);

        let tree = forest.tree(Some(root.id));
        assert_eq!(tree.total_nodes, 3);
        let names: Vec<_> = tree.roots[0].children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a.txt"]);
        assert_eq!(tree.roots[0].children[0].depth, 1);
    }
}
