use serde::{Deserialize, Serialize};

/// The last folder that was scanned to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub last_scanned_path: String,
    pub scan_completed: bool,
    /// ISO-8601 UTC time the state was written.
    pub updated_at: String,
}
