//! Hierarchy reconstruction from the flat entry table.
//!
//! The tree is rebuilt in memory from a single read of all entries, keyed by
//! parent id.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::{Database, StoreSummary};
use crate::error::Result;
use crate::models::entry::{display_order, Entry};

/// Every entry reachable from a root, level by level.
///
/// Level 0 holds the roots. Within a level entries are ordered directories
/// first, then by name. Entries whose parent chain does not lead back to a
/// root are not emitted.
pub fn full_hierarchy(db: &Database) -> Result<Vec<Entry>> {
    Ok(order_by_level(db.all_entries()?))
}

/// Breadth-first expansion of a flat entry list.
#[must_use]
pub fn order_by_level(entries: Vec<Entry>) -> Vec<Entry> {
    let mut by_parent = index_by_parent(entries);
    let mut ordered = Vec::new();
    let mut level = by_parent.remove(&None).unwrap_or_default();

    while !level.is_empty() {
        level.sort_by(display_order);
        let mut next = Vec::new();
        for entry in &level {
            if let Some(children) = by_parent.remove(&Some(entry.id)) {
                next.extend(children);
            }
        }
        ordered.append(&mut level);
        level = next;
    }

    ordered
}

fn index_by_parent(entries: Vec<Entry>) -> HashMap<Option<i64>, Vec<Entry>> {
    let mut by_parent: HashMap<Option<i64>, Vec<Entry>> = HashMap::new();
    for entry in entries {
        by_parent.entry(entry.parent_id).or_default().push(entry);
    }
    by_parent
}

/// A node in the nested tree view.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub entry: Entry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

/// Build a nested tree of everything in the store, one node per root.
pub fn build_tree(db: &Database) -> Result<Vec<TreeNode>> {
    let mut by_parent = index_by_parent(db.all_entries()?);
    let roots = by_parent.remove(&None).unwrap_or_default();
    Ok(attach_children(roots, &mut by_parent))
}

fn attach_children(
    mut entries: Vec<Entry>,
    by_parent: &mut HashMap<Option<i64>, Vec<Entry>>,
) -> Vec<TreeNode> {
    entries.sort_by(display_order);
    entries
        .into_iter()
        .map(|entry| {
            let children = by_parent.remove(&Some(entry.id)).unwrap_or_default();
            TreeNode {
                children: attach_children(children, by_parent),
                entry,
            }
        })
        .collect()
}

/// Format a tree as a string with indentation and file sizes.
#[must_use]
pub fn format_tree(nodes: &[TreeNode], indent: usize) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    for node in nodes {
        let prefix = "  ".repeat(indent);
        if node.entry.is_dir() {
            let _ = writeln!(out, "{prefix}{}/", node.entry.name.trim_end_matches('/'));
            out.push_str(&format_tree(&node.children, indent + 1));
        } else {
            let size = node.entry.size.unwrap_or(0);
            let _ = writeln!(out, "{prefix}{}  ({})", node.entry.name, format_size(size));
        }
    }
    out
}

/// Human-readable byte count (`B`, `KB`, `MB`, `GB`) with up to two decimals.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".into();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

/// One-line footer for a rendered tree, e.g. `3 directories, 3 files, 15 B`.
#[must_use]
pub fn format_summary(summary: &StoreSummary) -> String {
    format!(
        "{} directories, {} files, {}",
        summary.directories,
        summary.files,
        format_size(summary.total_bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewEntry;

    fn ts() -> String {
        "2024-01-01T00:00:00.000Z".into()
    }

    fn add_dir(db: &Database, path: &str, parent: Option<i64>) -> i64 {
        let name = path.rsplit('/').next().unwrap().to_string();
        db.insert_entry(&NewEntry::directory(name, path.into(), parent, ts(), ts()))
            .unwrap()
    }

    fn add_file(db: &Database, path: &str, parent: i64, size: u64) -> i64 {
        let name = path.rsplit('/').next().unwrap().to_string();
        db.insert_entry(&NewEntry::file(name, path.into(), Some(parent), size, ts(), ts()))
            .unwrap()
    }

    fn sample(db: &Database) {
        let root = add_dir(db, "/r", None);
        add_file(db, "/r/b.txt", root, 10);
        let z = add_dir(db, "/r/z", Some(root));
        let a = add_dir(db, "/r/a", Some(root));
        add_file(db, "/r/z/inner.txt", z, 1);
        add_dir(db, "/r/a/deep", Some(a));
    }

    #[test]
    fn full_hierarchy_is_level_ordered() {
        let db = Database::open_in_memory().unwrap();
        sample(&db);
        let paths: Vec<String> = full_hierarchy(&db)
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(
            paths,
            ["/r", "/r/a", "/r/z", "/r/b.txt", "/r/a/deep", "/r/z/inner.txt"]
        );
    }

    #[test]
    fn full_hierarchy_tolerates_multiple_roots() {
        let db = Database::open_in_memory().unwrap();
        let b = add_dir(&db, "/b", None);
        let a = add_dir(&db, "/a", None);
        add_file(&db, "/b/x", b, 1);
        add_file(&db, "/a/y", a, 1);
        let paths: Vec<String> = full_hierarchy(&db)
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        // Ordering applies across the whole level, not per parent.
        assert_eq!(paths, ["/a", "/b", "/b/x", "/a/y"]);
    }

    #[test]
    fn order_by_level_drops_unreachable_entries() {
        let db = Database::open_in_memory().unwrap();
        sample(&db);
        let mut entries = db.all_entries().unwrap();
        // Detach the `a` subtree from any root.
        for e in &mut entries {
            if e.path == "/r/a" {
                e.parent_id = Some(9_999);
            }
        }
        let ordered = order_by_level(entries);
        assert!(ordered.iter().all(|e| !e.path.starts_with("/r/a")));
        assert_eq!(ordered.len(), 4);
    }

    #[test]
    fn build_tree_nests_children() {
        let db = Database::open_in_memory().unwrap();
        sample(&db);
        let tree = build_tree(&db).unwrap();
        assert_eq!(tree.len(), 1);
        let names: Vec<&str> = tree[0]
            .children
            .iter()
            .map(|n| n.entry.name.as_str())
            .collect();
        assert_eq!(names, ["a", "z", "b.txt"]);

        let text = format_tree(&tree, 0);
        assert!(text.starts_with("r/\n  a/\n    deep/\n  z/\n"));
        assert!(text.contains("    inner.txt  (1 B)"));
        assert!(text.contains("  b.txt  (10 B)"));
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(10), "10 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn summary_footer_uses_store_counts() {
        let db = Database::open_in_memory().unwrap();
        sample(&db);
        assert_eq!(
            format_summary(&db.summary().unwrap()),
            "4 directories, 2 files, 11 B"
        );
    }
}
