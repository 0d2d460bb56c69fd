pub mod app_state;
pub mod entry;
pub mod timestamp;

pub use app_state::AppState;
pub use entry::{Entry, EntryKind, NewEntry};
