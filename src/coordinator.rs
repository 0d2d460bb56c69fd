//! Request/response operations shared by the CLI and the serve loop.
//!
//! Every operation returns a [`Response`] instead of an error so callers on
//! the far side of a process boundary get a uniform success/failure shape.

use std::fmt::Display;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::models::{AppState, Entry};
use crate::scan::{ProgressSink, ScanSummary, Scanner};

pub const SCAN_SUCCESS_MESSAGE: &str = "Folder scanned successfully";
pub const STATE_CLEARED_MESSAGE: &str = "App state cleared successfully";

/// Uniform result envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<T>,
}

impl<T> Response<T> {
    #[must_use]
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }

    #[must_use]
    pub fn failure(reason: impl Display) -> Self {
        Self {
            success: false,
            message: Some(reason.to_string()),
            data: None,
        }
    }

    fn from_result(op: &str, result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::data(data),
            Err(e) => {
                error!(op, error = %e, "request failed");
                Self::failure(e)
            }
        }
    }
}

/// Owns the store and drives scans against it.
pub struct Coordinator {
    config: Config,
    db: Database,
}

impl Coordinator {
    /// Open the database named by `config`, creating the data directory if needed.
    pub fn open(config: Config) -> Result<Self> {
        config.ensure_data_dir()?;
        let db = Database::open(&config.db_path)?;
        Ok(Self { config, db })
    }

    #[must_use]
    pub fn with_database(config: Config, db: Database) -> Self {
        Self { config, db }
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Clear the store and scan `path`. Records the folder as the app state
    /// when the scan completes.
    pub fn scan_folder(&self, path: &str, sink: &mut dyn ProgressSink) -> Response<ScanSummary> {
        match self.run_scan(path, sink) {
            Ok(summary) => Response::message(SCAN_SUCCESS_MESSAGE, Some(summary)),
            Err(e) if e.is_integrity() => {
                error!(path, error = %e, "store rejected a scanned entry");
                Response::failure(e)
            }
            Err(e) => {
                warn!(path, error = %e, "error scanning folder");
                Response::failure(e)
            }
        }
    }

    fn run_scan(&self, path: &str, sink: &mut dyn ProgressSink) -> Result<ScanSummary> {
        let summary =
            Scanner::with_settings(&self.db, &self.config.settings.scan).scan(Path::new(path), sink)?;
        let root_path = self
            .db
            .get_entry(summary.root_id)?
            .map_or_else(|| path.to_string(), |e| e.path);
        self.db.save_app_state(&root_path, true)?;
        Ok(summary)
    }

    pub fn get_hierarchy(&self) -> Response<Vec<Entry>> {
        Response::from_result("getHierarchy", self.db.full_hierarchy())
    }

    pub fn get_children(&self, parent_id: Option<i64>) -> Response<Vec<Entry>> {
        Response::from_result("getChildren", self.db.children_of(parent_id))
    }

    pub fn find_by_path(&self, path: &str) -> Response<Option<Entry>> {
        Response::from_result("findByPath", self.db.find_by_path(path))
    }

    pub fn get_app_state(&self) -> Response<Option<AppState>> {
        Response::from_result("getState", self.db.get_app_state())
    }

    pub fn clear_app_state(&self) -> Response<()> {
        match self.db.clear_app_state() {
            Ok(()) => Response::message(STATE_CLEARED_MESSAGE, None),
            Err(e) => {
                error!(error = %e, "error clearing app state");
                Response::failure(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{NoProgress, ScanProgress};
    use std::fs;
    use tempfile::TempDir;

    fn coordinator() -> Coordinator {
        Coordinator::with_database(
            Config::with_data_dir("/nonexistent"),
            Database::open_in_memory().unwrap(),
        )
    }

    #[test]
    fn scan_success_saves_state() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        let c = coordinator();

        let mut events = 0;
        let resp = c.scan_folder(
            &tmp.path().to_string_lossy(),
            &mut |_: ScanProgress| events += 1,
        );
        assert!(resp.success);
        assert_eq!(resp.message.as_deref(), Some(SCAN_SUCCESS_MESSAGE));
        assert_eq!(events, 2);

        let state = c.get_app_state().data.flatten().unwrap();
        assert_eq!(state.last_scanned_path, tmp.path().to_string_lossy());
        assert!(state.scan_completed);
    }

    #[test]
    fn scan_failure_reports_reason_and_keeps_state() {
        let tmp = TempDir::new().unwrap();
        let c = coordinator();
        c.scan_folder(&tmp.path().to_string_lossy(), &mut NoProgress);

        let missing = tmp.path().join("missing");
        let resp = c.scan_folder(&missing.to_string_lossy(), &mut NoProgress);
        assert!(!resp.success);
        assert!(resp.message.unwrap().contains("cannot stat"));
        assert!(resp.data.is_none());

        let state = c.get_app_state().data.flatten().unwrap();
        assert_eq!(state.last_scanned_path, tmp.path().to_string_lossy());
    }

    #[test]
    fn fresh_state_is_null_and_clear_succeeds() {
        let c = coordinator();
        let resp = c.get_app_state();
        assert!(resp.success);
        assert_eq!(resp.data, Some(None));
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"success":true,"data":null}"#
        );

        let cleared = c.clear_app_state();
        assert!(cleared.success);
        assert_eq!(cleared.message.as_deref(), Some(STATE_CLEARED_MESSAGE));
    }

    #[test]
    fn hierarchy_and_children_after_scan() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("A")).unwrap();
        fs::write(tmp.path().join("b.txt"), "0123456789").unwrap();
        let c = coordinator();
        let summary = c
            .scan_folder(&tmp.path().to_string_lossy(), &mut NoProgress)
            .data
            .unwrap();

        let all = c.get_hierarchy().data.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, summary.root_id);

        let roots = c.get_children(None).data.unwrap();
        assert_eq!(roots.len(), 1);
        let kids: Vec<String> = c
            .get_children(Some(summary.root_id))
            .data
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(kids, ["A", "b.txt"]);

        let found = c
            .find_by_path(&tmp.path().join("b.txt").to_string_lossy())
            .data
            .flatten()
            .unwrap();
        assert_eq!(found.size, Some(10));
    }
}
