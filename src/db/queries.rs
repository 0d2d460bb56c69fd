use rusqlite::{ffi, params, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{DirscanError, Result};
use crate::models::entry::{Entry, NewEntry};
use crate::models::timestamp::now_iso8601;
use crate::models::AppState;

use super::Database;

const ENTRY_COLUMNS: &str = "id, name, path, parent_id, kind, size, created_at, modified_at";

impl Database {
    // ─── Entry operations ───

    /// Insert a new entry. Returns the generated row ID.
    ///
    /// Constraint failures are reported as distinct errors: a duplicate path,
    /// a parent that does not exist, and a parent that is a file.
    pub fn insert_entry(&self, entry: &NewEntry) -> Result<i64> {
        self.conn()
            .execute(
                "INSERT INTO entries (name, path, parent_id, kind, size, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.name,
                    entry.path,
                    entry.parent_id,
                    entry.kind,
                    entry.size.map(|s| s as i64),
                    entry.created_at,
                    entry.modified_at,
                ],
            )
            .map_err(|e| map_insert_error(e, entry))?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Direct children of `parent_id` (`None` selects roots), directories
    /// first, then by name in byte order.
    pub fn children_of(&self, parent_id: Option<i64>) -> Result<Vec<Entry>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries
             WHERE parent_id IS ?1
             ORDER BY CASE kind WHEN 'directory' THEN 0 ELSE 1 END, name, id"
        ))?;
        Self::map_entries(&mut stmt, params![parent_id])
    }

    /// Get an entry by its exact path.
    pub fn find_by_path(&self, path: &str) -> Result<Option<Entry>> {
        let entry = self
            .conn()
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE path = ?1"),
                params![path],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Get an entry by ID.
    pub fn get_entry(&self, id: i64) -> Result<Option<Entry>> {
        let entry = self
            .conn()
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
                params![id],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Every entry in insertion order.
    pub fn all_entries(&self) -> Result<Vec<Entry>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY id"))?;
        Self::map_entries(&mut stmt, [])
    }

    /// The whole tree, level by level from the roots.
    pub fn full_hierarchy(&self) -> Result<Vec<Entry>> {
        crate::hierarchy::full_hierarchy(self)
    }

    /// Delete one entry. Descendants go with it through the cascade.
    pub fn delete_entry(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM entries WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Delete every entry. Safe to call on an empty store.
    pub fn clear_all(&self) -> Result<usize> {
        let rows = self.conn().execute("DELETE FROM entries", [])?;
        Ok(rows)
    }

    pub fn count_entries(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))?;
        Ok(count as u64)
    }

    fn map_entries(
        stmt: &mut rusqlite::Statement,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Entry>> {
        let rows = stmt.query_map(params, entry_from_row)?;
        let mut entries = Vec::new();
        for r in rows {
            entries.push(r?);
        }
        Ok(entries)
    }

    // ─── Statistics ───

    /// Counts by kind and the total size of all files.
    pub fn summary(&self) -> Result<StoreSummary> {
        let (directories, files, total_bytes): (i64, i64, i64) = self.conn().query_row(
            "SELECT
                COALESCE(SUM(kind = 'directory'), 0),
                COALESCE(SUM(kind = 'file'), 0),
                COALESCE(SUM(size), 0)
             FROM entries",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;
        let root_count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM entries WHERE parent_id IS NULL",
            [],
            |r| r.get(0),
        )?;
        Ok(StoreSummary {
            directories: directories as u64,
            files: files as u64,
            total: (directories + files) as u64,
            total_bytes: total_bytes as u64,
            roots: root_count as u64,
        })
    }

    /// Verify the stored hierarchy and return a report.
    pub fn verify_integrity(&self) -> Result<IntegrityReport> {
        let mut report = IntegrityReport::default();

        let integrity: String = self
            .conn()
            .query_row("PRAGMA integrity_check", [], |r| r.get(0))?;
        report.sqlite_ok = integrity == "ok";
        if !report.sqlite_ok {
            report.sqlite_error = Some(integrity);
        }

        let duplicate_paths: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM (SELECT path FROM entries GROUP BY path HAVING COUNT(*) > 1)",
            [],
            |r| r.get(0),
        )?;
        report.duplicate_paths = duplicate_paths as u64;

        let orphans: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM entries
             WHERE parent_id IS NOT NULL AND parent_id NOT IN (SELECT id FROM entries)",
            [],
            |r| r.get(0),
        )?;
        report.orphan_entries = orphans as u64;

        let file_parents: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM entries c JOIN entries p ON c.parent_id = p.id
             WHERE p.kind <> 'directory'",
            [],
            |r| r.get(0),
        )?;
        report.file_parents = file_parents as u64;

        let roots: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM entries WHERE parent_id IS NULL",
            [],
            |r| r.get(0),
        )?;
        report.roots = roots as u64;

        Ok(report)
    }

    // ─── App state ───

    /// The last completed scan, if any.
    pub fn get_app_state(&self) -> Result<Option<AppState>> {
        let state = self
            .conn()
            .query_row(
                "SELECT last_scanned_path, scan_completed, updated_at FROM app_state WHERE id = 1",
                [],
                |row| {
                    Ok(AppState {
                        last_scanned_path: row.get(0)?,
                        scan_completed: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    pub fn save_app_state(&self, path: &str, scan_completed: bool) -> Result<()> {
        self.conn().execute(
            "INSERT INTO app_state (id, last_scanned_path, scan_completed, updated_at)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET last_scanned_path=?1, scan_completed=?2, updated_at=?3",
            params![path, scan_completed, now_iso8601()],
        )?;
        Ok(())
    }

    pub fn clear_app_state(&self) -> Result<()> {
        self.conn().execute("DELETE FROM app_state", [])?;
        Ok(())
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        parent_id: row.get(3)?,
        kind: row.get(4)?,
        size: row.get::<_, Option<i64>>(5)?.map(|s| s as u64),
        created_at: row.get(6)?,
        modified_at: row.get(7)?,
    })
}

fn map_insert_error(err: rusqlite::Error, entry: &NewEntry) -> DirscanError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        match (failure.extended_code, entry.parent_id) {
            (ffi::SQLITE_CONSTRAINT_UNIQUE, _) => {
                return DirscanError::DuplicatePath {
                    path: entry.path.clone(),
                };
            }
            (ffi::SQLITE_CONSTRAINT_FOREIGNKEY, Some(parent_id)) => {
                return DirscanError::DanglingParent { parent_id };
            }
            (ffi::SQLITE_CONSTRAINT_TRIGGER, Some(parent_id)) => {
                return DirscanError::ParentNotDirectory { parent_id };
            }
            _ => {}
        }
    }
    DirscanError::Database(err)
}

/// Report from hierarchy integrity verification.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    /// Whether `SQLite` integrity check passed.
    pub sqlite_ok: bool,
    /// `SQLite` error message if integrity check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite_error: Option<String>,
    /// Paths stored more than once.
    pub duplicate_paths: u64,
    /// Entries whose `parent_id` points nowhere.
    pub orphan_entries: u64,
    /// Entries whose parent is a file.
    pub file_parents: u64,
    /// Number of entries without a parent.
    pub roots: u64,
}

impl IntegrityReport {
    /// Returns true if all checks passed. An empty store has no roots and is fine.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.sqlite_ok
            && self.duplicate_paths == 0
            && self.orphan_entries == 0
            && self.file_parents == 0
            && self.roots <= 1
    }
}

/// Store-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub directories: u64,
    pub files: u64,
    pub total: u64,
    pub total_bytes: u64,
    pub roots: u64,
}
