pub mod progress;
pub mod scanner;

pub use progress::{NoProgress, ProgressChannel, ProgressSink, ScanProgress};
pub use scanner::{ScanSummary, Scanner};
