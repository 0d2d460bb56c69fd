/// SQL statements for creating the dirscan schema.
pub const CREATE_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    path TEXT NOT NULL UNIQUE,
    parent_id INTEGER REFERENCES entries(id) ON DELETE CASCADE,
    kind TEXT NOT NULL CHECK (kind IN ('file', 'directory')),
    size INTEGER,
    created_at TEXT NOT NULL,
    modified_at TEXT NOT NULL,
    CHECK ((kind = 'file' AND size IS NOT NULL) OR (kind = 'directory' AND size IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_entries_parent_id ON entries(parent_id);
CREATE INDEX IF NOT EXISTS idx_entries_path ON entries(path);
CREATE INDEX IF NOT EXISTS idx_entries_kind ON entries(kind);

-- A parent must be a directory. Missing parents are left to the foreign key.
CREATE TRIGGER IF NOT EXISTS entries_parent_is_dir BEFORE INSERT ON entries
WHEN NEW.parent_id IS NOT NULL
    AND (SELECT kind FROM entries WHERE id = NEW.parent_id) = 'file'
BEGIN
    SELECT RAISE(ABORT, 'parent is not a directory');
END;

CREATE TABLE IF NOT EXISTS app_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_scanned_path TEXT NOT NULL,
    scan_completed INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);
";
