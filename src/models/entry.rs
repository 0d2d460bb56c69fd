use std::cmp::Ordering;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Whether an entry is a file or a directory. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(Self::File),
            "directory" => Some(Self::Directory),
            _ => None,
        }
    }

    /// Sort rank: directories come before files.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Directory => 0,
            Self::File => 1,
        }
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl ToSql for EntryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EntryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown entry kind: {s}").into()))
    }
}

/// One scanned file or directory as stored in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Database row ID, generated on insert.
    pub id: i64,
    /// Base name of the path segment.
    pub name: String,
    /// Absolute filesystem path. Unique across the store.
    pub path: String,
    /// Parent directory entry, `None` for roots.
    pub parent_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Byte count, present only for files.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<u64>,
    /// ISO-8601 UTC creation time.
    pub created_at: String,
    /// ISO-8601 UTC modification time.
    pub modified_at: String,
}

impl Entry {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Directories first, then name in byte order, then id.
#[must_use]
pub fn display_order(a: &Entry, b: &Entry) -> Ordering {
    a.kind
        .rank()
        .cmp(&b.kind.rank())
        .then_with(|| a.name.as_bytes().cmp(b.name.as_bytes()))
        .then_with(|| a.id.cmp(&b.id))
}

/// An entry that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub name: String,
    pub path: String,
    pub parent_id: Option<i64>,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub created_at: String,
    pub modified_at: String,
}

impl NewEntry {
    #[must_use]
    pub fn file(
        name: String,
        path: String,
        parent_id: Option<i64>,
        size: u64,
        created_at: String,
        modified_at: String,
    ) -> Self {
        Self {
            name,
            path,
            parent_id,
            kind: EntryKind::File,
            size: Some(size),
            created_at,
            modified_at,
        }
    }

    #[must_use]
    pub fn directory(
        name: String,
        path: String,
        parent_id: Option<i64>,
        created_at: String,
        modified_at: String,
    ) -> Self {
        Self {
            name,
            path,
            parent_id,
            kind: EntryKind::Directory,
            size: None,
            created_at,
            modified_at,
        }
    }
}
