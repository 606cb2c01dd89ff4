//! covlist CLI binary entry point.
//! Delegates to modules for fetching, filtering, and rendering defects.

mod cache;
mod chart;
mod cli;
mod columns;
mod config;
mod directive;
mod error;
mod filter;
mod models;
mod output;
mod session;
mod utils;

use crate::cache::DefectCache;
use crate::directive::{DirectiveOptions, DirectiveSpec};
use crate::error::{DirectiveError, RetrievalError};
use crate::models::RenderedBlock;
use crate::session::HttpSession;
use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::List {
            repo_root,
            stream,
            snapshot,
            output,
            title,
            col,
            widths,
            chart,
            checker,
            impact,
            kind,
            classification,
            action,
            component,
            cwe,
            cid,
        } => {
            let eff = resolve_or_exit(
                repo_root.as_deref(),
                stream.as_deref(),
                snapshot.as_deref(),
                output.as_deref(),
            );
            let opts = DirectiveOptions {
                title,
                col,
                widths,
                chart,
                checker,
                impact,
                kind,
                classification,
                action,
                component,
                cwe,
                cid,
            };
            let (rendered, errors) = run_blocks(&eff, &[opts]);
            output::print_blocks(&rendered, &eff.output);
            if errors > 0 {
                std::process::exit(1);
            }
        }
        Commands::Build {
            repo_root,
            report,
            stream,
            snapshot,
            output,
        } => {
            let eff = resolve_or_exit(
                repo_root.as_deref(),
                stream.as_deref(),
                snapshot.as_deref(),
                output.as_deref(),
            );
            let report_path = eff.repo_root.join(&report);
            let report = match directive::load_report(&report_path) {
                Ok(report) => report,
                Err(err) => {
                    eprintln!("{} {}", utils::error_prefix(), err);
                    std::process::exit(2);
                }
            };
            let (rendered, errors) = run_blocks(&eff, &report.blocks);
            output::print_blocks(&rendered, &eff.output);
            if errors > 0 {
                std::process::exit(1);
            }
        }
    }
}

/// Resolve the effective configuration or exit with a usage error.
fn resolve_or_exit(
    repo_root: Option<&str>,
    stream: Option<&str>,
    snapshot: Option<&str>,
    output: Option<&str>,
) -> config::Effective {
    // Friendly note if no covlist config was found
    let start = std::path::PathBuf::from(repo_root.unwrap_or("."));
    if config::load_config(&config::detect_repo_root(&start)).is_none() {
        eprintln!(
            "{} {}",
            utils::note_prefix(),
            "No covlist.toml found; using defaults."
        );
    }
    match config::resolve_effective(repo_root, stream, snapshot, output) {
        Ok(eff) => eff,
        Err(err) => {
            eprintln!("{} {}", utils::error_prefix(), err);
            std::process::exit(2);
        }
    }
}

/// Connect once, then process all blocks against one shared defect cache.
/// Returns the successfully rendered blocks and the number of failed ones.
fn run_blocks(
    eff: &config::Effective,
    blocks: &[DirectiveOptions],
) -> (Vec<RenderedBlock>, usize) {
    utils::report_info("initializing a session on the Coverity server...");
    let session =
        match HttpSession::connect(&eff.base_url(), &eff.username, &eff.password, &eff.stream) {
            Ok(session) => session,
            Err(err) => {
                eprintln!(
                    "{} {}",
                    utils::error_prefix(),
                    format!("failed to connect to Coverity server: {}", err)
                );
                std::process::exit(1);
            }
        };

    let mut eff = eff.clone();
    if let Some(snapshot) = eff.snapshot.clone() {
        eff.snapshot = session.validate_snapshot(&snapshot);
    }

    let mut cache = DefectCache::new();
    let mut rendered = Vec::new();
    let mut errors = 0usize;
    for (ix, opts) in blocks.iter().enumerate() {
        let label = opts
            .title
            .clone()
            .unwrap_or_else(|| format!("block {}", ix + 1));
        let spec = match DirectiveSpec::parse(opts) {
            Ok(spec) => spec,
            Err(err) => {
                eprintln!("{} {} ❲{}❳", utils::error_prefix(), err, label);
                errors += 1;
                continue;
            }
        };
        match directive::run(&spec, &mut cache, &session, &eff) {
            Ok(block) => rendered.push(block),
            Err(DirectiveError::Retrieval(RetrievalError::PreviouslyFailed { .. })) => {
                // Already reported once for this stream/snapshot
                eprintln!(
                    "{} skipping '{}': defect retrieval already failed",
                    utils::note_prefix(),
                    label
                );
                errors += 1;
            }
            Err(err) => {
                eprintln!("{} {} ❲{}❳", utils::error_prefix(), err, label);
                errors += 1;
            }
        }
    }
    (rendered, errors)
}
