// Inherit lint configuration from lib.rs for consistency
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value
)]

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dirscan::cli::commands::{Cli, Command};
use dirscan::cli::output;
use dirscan::config::Config;
use dirscan::coordinator::{Coordinator, Response};
use dirscan::hierarchy;
use dirscan::scan::ScanProgress;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

type CmdResult = Result<(), Box<dyn std::fmt::Display>>;

fn map_err(e: impl std::fmt::Display + 'static) -> Box<dyn std::fmt::Display> {
    Box::new(e.to_string())
}

fn run(cli: Cli) -> CmdResult {
    let config = match cli.data_dir {
        Some(dir) => Config::with_data_dir(dir),
        None => Config::from_cwd().map_err(map_err)?,
    };
    init_logging(&config);

    let pretty = config.settings.output.is_pretty();
    match cli.command {
        Command::Scan { path, quiet } => cmd_scan(config, &path, quiet, pretty),
        Command::Hierarchy { tree } => cmd_hierarchy(config, tree, pretty),
        Command::Children { parent } => {
            let coordinator = open(config)?;
            print_response(coordinator.get_children(parent), pretty)
        }
        Command::Find { path } => cmd_find(config, &path, pretty),
        Command::Stats => cmd_stats(config, pretty),
        Command::Verify => cmd_verify(config, pretty),
        Command::State { clear } => {
            let coordinator = open(config)?;
            if clear {
                print_response(coordinator.clear_app_state(), pretty)
            } else {
                print_response(coordinator.get_app_state(), pretty)
            }
        }
        Command::Clear => cmd_clear(config, pretty),
        Command::Serve => cmd_serve(config),
    }
}

/// Logs go to stderr; stdout carries data. `RUST_LOG` overrides the config level.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.settings.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn open(config: Config) -> Result<Coordinator, Box<dyn std::fmt::Display>> {
    Coordinator::open(config).map_err(map_err)
}

/// Print a successful response on stdout, turn a failed one into an error.
fn print_response<T: serde::Serialize>(response: Response<T>, pretty: bool) -> CmdResult {
    if !response.success {
        return Err(map_err(
            response.message.unwrap_or_else(|| "request failed".into()),
        ));
    }
    println!("{}", output::format(&response, pretty));
    Ok(())
}

fn cmd_scan(config: Config, path: &str, quiet: bool, pretty: bool) -> CmdResult {
    let coordinator = open(config)?;
    let mut report = |p: ScanProgress| {
        if !quiet {
            eprintln!("{}", output::format_json(&p));
        }
    };
    print_response(coordinator.scan_folder(path, &mut report), pretty)
}

fn cmd_hierarchy(config: Config, tree: bool, pretty: bool) -> CmdResult {
    let coordinator = open(config)?;
    if !tree {
        return print_response(coordinator.get_hierarchy(), pretty);
    }

    let db = coordinator.database();
    let nodes = hierarchy::build_tree(db).map_err(map_err)?;
    let summary = db.summary().map_err(map_err)?;
    print!("{}", hierarchy::format_tree(&nodes, 0));
    println!("{}", hierarchy::format_summary(&summary));
    Ok(())
}

fn cmd_find(config: Config, path: &str, pretty: bool) -> CmdResult {
    let coordinator = open(config)?;
    let response = coordinator.find_by_path(path);
    if response.success && matches!(response.data, Some(None)) {
        return Err(map_err(format!("no entry for path: {path}")));
    }
    print_response(response, pretty)
}

fn cmd_stats(config: Config, pretty: bool) -> CmdResult {
    let coordinator = open(config)?;
    let summary = coordinator.database().summary().map_err(map_err)?;
    println!("{}", output::format(&summary, pretty));
    Ok(())
}

fn cmd_verify(config: Config, pretty: bool) -> CmdResult {
    if !config.index_exists() {
        return Err(map_err("Index not found. Run 'dirscan scan <PATH>' first."));
    }
    let coordinator = open(config)?;
    let report = coordinator.database().verify_integrity().map_err(map_err)?;
    println!("{}", output::format(&report, pretty));
    Ok(())
}

fn cmd_clear(config: Config, pretty: bool) -> CmdResult {
    let coordinator = open(config)?;
    let removed = coordinator.database().clear_all().map_err(map_err)?;
    println!(
        "{}",
        output::format(&serde_json::json!({ "removed": removed }), pretty)
    );
    Ok(())
}

fn cmd_serve(config: Config) -> CmdResult {
    let rt = tokio::runtime::Runtime::new().map_err(map_err)?;
    rt.block_on(async { dirscan::serve::run_stdio(config).await.map_err(map_err) })
}
