//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "covlist",
    version,
    about = "Coverity defect listings and charts for docs",
    long_about = "covlist — fetch defects from a Coverity Connect server, filter them, and render tables or chart slices for inclusion in generated documentation.\n\nConfiguration precedence: CLI > environment > covlist.toml > defaults.",
    after_help = "Examples:\n  covlist list --classification Bug --col CID,Classification,Comment\n  covlist list --chart classification:3 --output json\n  covlist build --report docs/coverity.toml",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for rendering defect reports.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current covlist version.")]
    Version,
    /// Render one ad-hoc defect listing and/or chart
    #[command(
        about = "Render one defect listing/chart",
        long_about = "Fetch defects for the configured stream, apply the given filters, and render a table and/or chart block to stdout.",
        after_help = "Examples:\n  covlist list --classification Bug,Pending\n  covlist list --col CID,Location,Comment --widths \"10 40 50\"\n  covlist list --chart checker:5 --checker MISRA"
    )]
    List {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Stream to query (default: from covlist.toml)")]
        stream: Option<String>,
        #[arg(long, help = "Snapshot ID (default: latest snapshot)")]
        snapshot: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Block title (default: 'Coverity report')")]
        title: Option<String>,
        #[arg(long, help = "Comma-separated column names (default: CID,Classification,Action,Comment)")]
        col: Option<String>,
        #[arg(long, help = "Space-separated column width weights, one per column")]
        widths: Option<String>,
        #[arg(long, help = "Chart spec: [<attribute>:]<groups|threshold>")]
        chart: Option<String>,
        #[arg(long, help = "Filter: checker name patterns")]
        checker: Option<String>,
        #[arg(long, help = "Filter: impacts")]
        impact: Option<String>,
        #[arg(long, help = "Filter: issue kinds")]
        kind: Option<String>,
        #[arg(long, help = "Filter: classifications")]
        classification: Option<String>,
        #[arg(long, help = "Filter: actions")]
        action: Option<String>,
        #[arg(long, help = "Filter: components")]
        component: Option<String>,
        #[arg(long, help = "Filter: CWE ratings")]
        cwe: Option<String>,
        #[arg(long, help = "Filter: defect CIDs")]
        cid: Option<String>,
    },
    /// Process a report file of directive blocks
    #[command(
        about = "Process a report file",
        long_about = "Process the [[block]] entries of a TOML report file in document order. All blocks share one defect cache, so blocks on the same stream/snapshot trigger a single fetch.",
        after_help = "Examples:\n  covlist build --report docs/coverity.toml\n  covlist build --report docs/coverity.toml --output json"
    )]
    Build {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Path to the report file (required)")]
        report: String,
        #[arg(long, help = "Stream to query (default: from covlist.toml)")]
        stream: Option<String>,
        #[arg(long, help = "Snapshot ID (default: latest snapshot)")]
        snapshot: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
