use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dirscan",
    version,
    about = "Scan a folder recursively and keep its hierarchy in SQLite",
    after_help = "Every scan replaces the previous one. Symbolic links and special files \
                  are skipped. Data lives in ./.dirscan unless --data-dir is given."
)]
pub struct Cli {
    /// Directory holding index.db and config.toml (default: ./.dirscan)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clear the store and scan a folder recursively.
    ///
    /// Progress lines `{"folderCount":n,"fileCount":m}` go to stderr after
    /// every stored entry. Unreadable directories are kept without children.
    Scan {
        /// Folder to scan
        path: String,
        /// Do not print progress
        #[arg(short, long)]
        quiet: bool,
    },

    /// Every stored entry, level by level, directories first
    Hierarchy {
        /// Render as an indented tree instead of JSON
        #[arg(long)]
        tree: bool,
    },

    /// Direct children of a directory (roots when no parent is given)
    Children {
        /// Parent entry id
        #[arg(short, long)]
        parent: Option<i64>,
    },

    /// Look up one entry by its absolute path
    Find {
        /// Absolute path as stored
        path: String,
    },

    /// Show entry counts and total size
    Stats,

    /// Check the store for duplicate paths, orphans and file parents
    Verify,

    /// Show the last scanned folder
    State {
        /// Forget the last scanned folder
        #[arg(long)]
        clear: bool,
    },

    /// Remove every stored entry
    Clear,

    /// Answer JSON requests on stdin, one per line
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scan_with_global_data_dir() {
        let cli = Cli::parse_from(["dirscan", "scan", "/tmp/x", "--quiet", "--data-dir", "/d"]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/d")));
        match cli.command {
            Command::Scan { path, quiet } => {
                assert_eq!(path, "/tmp/x");
                assert!(quiet);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn children_parent_is_optional() {
        let cli = Cli::parse_from(["dirscan", "children"]);
        assert!(matches!(cli.command, Command::Children { parent: None }));
        let cli = Cli::parse_from(["dirscan", "children", "--parent", "4"]);
        assert!(matches!(cli.command, Command::Children { parent: Some(4) }));
    }
}
