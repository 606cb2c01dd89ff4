//! Directive parsing and orchestration.
//!
//! One directive block declares a title, optional table columns and widths,
//! an optional chart, and the attribute filters. Blocks arrive either as
//! `[[block]]` entries of a TOML report file or as `covlist list` flags.
//! The orchestrator runs each block through the shared defect cache, the
//! filter engine, and the table/chart builders; filters are evaluated
//! exactly once per block and both stages see the same filtered sequence.

use crate::cache::DefectCache;
use crate::chart::{self, ChartSpec};
use crate::columns::{self, RowContext, TableSpec, DEFAULT_COLUMNS};
use crate::config::Effective;
use crate::error::{ConfigError, DirectiveError};
use crate::filter::{self, FilterSpec};
use crate::models::{RenderedBlock, TableBlock};
use crate::session::Session;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_TITLE: &str = "Coverity report";

#[derive(Debug, Default, Deserialize, Clone)]
/// Raw option surface of one block, as declared.
pub struct DirectiveOptions {
    pub title: Option<String>,
    pub col: Option<String>,
    pub widths: Option<String>,
    pub chart: Option<String>,
    pub checker: Option<String>,
    pub impact: Option<String>,
    pub kind: Option<String>,
    pub classification: Option<String>,
    pub action: Option<String>,
    pub component: Option<String>,
    pub cwe: Option<String>,
    pub cid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
/// A report file: `[[block]]` entries processed in document order.
pub struct Report {
    #[serde(default, rename = "block")]
    pub blocks: Vec<DirectiveOptions>,
}

pub fn load_report(path: &Path) -> Result<Report, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|err| ConfigError::ReportRead {
        path: path.to_string_lossy().to_string(),
        reason: err.to_string(),
    })?;
    toml::from_str(&raw).map_err(|err| ConfigError::ReportParse {
        path: path.to_string_lossy().to_string(),
        reason: err.to_string(),
    })
}

#[derive(Debug)]
/// Parsed, validated form of one block.
pub struct DirectiveSpec {
    pub title: String,
    pub table: Option<TableSpec>,
    pub chart: Option<ChartSpec>,
    pub filter: FilterSpec,
}

impl DirectiveSpec {
    pub fn parse(opts: &DirectiveOptions) -> Result<Self, ConfigError> {
        let chart = opts.chart.as_deref().map(ChartSpec::parse).transpose()?;

        // `col` selects the table columns; without it a chart-only block
        // renders no table, and a block with neither option falls back to
        // the default column list.
        let table = match (&opts.col, &chart) {
            (Some(col), _) => Some(TableSpec::parse(col, opts.widths.as_deref())?),
            (None, None) => Some(TableSpec::parse(DEFAULT_COLUMNS, opts.widths.as_deref())?),
            (None, Some(_)) => None,
        };

        let filter = FilterSpec::from_options(
            opts.checker.as_deref(),
            opts.impact.as_deref(),
            opts.kind.as_deref(),
            opts.classification.as_deref(),
            opts.action.as_deref(),
            opts.component.as_deref(),
            opts.cwe.as_deref(),
            opts.cid.as_deref(),
        )?;

        Ok(DirectiveSpec {
            title: opts
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            table,
            chart,
            filter,
        })
    }
}

/// Run one block: fetch-or-reuse, filter once, then build the table and/or
/// chart against the same filtered sequence. An empty filtered result is a
/// valid outcome and renders as an empty table or chart.
pub fn run(
    spec: &DirectiveSpec,
    cache: &mut DefectCache,
    session: &dyn Session,
    eff: &Effective,
) -> Result<RenderedBlock, DirectiveError> {
    let defects = cache.get_or_fetch(session, &eff.stream, eff.snapshot.as_deref())?;
    let filtered = filter::apply(defects.iter(), &spec.filter);

    let base_url = eff.base_url();
    let table = spec.table.as_ref().map(|table_spec| {
        let ctx = RowContext {
            id_pattern: eff.id_pattern.as_ref(),
            relink: &eff.relink,
            base_url: Some(base_url.as_str()),
            stream: &eff.stream,
        };
        TableBlock {
            columns: table_spec.headers(),
            widths: table_spec.widths.clone(),
            rows: columns::build_rows(&filtered, table_spec, &ctx),
        }
    });

    let slices = spec
        .chart
        .as_ref()
        .map(|chart_spec| chart::aggregate(&filtered, chart_spec));

    Ok(RenderedBlock {
        title: spec.title.clone(),
        table,
        slices,
        total: filtered.len(),
    })
}
