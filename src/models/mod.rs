//! Shared data models: the defect record and the render-side structs the
//! output printers consume.

pub mod defect;

use serde::Serialize;

/// One fragment of a rendered cell. The renderer decides how a link or an
/// item reference becomes markup; the core only carries the structure.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Span {
    Text(String),
    Link { label: String, url: String },
    /// Cross-reference to a traceability item, after relinking.
    ItemRef { id: String },
}

/// A rendered table cell: an ordered run of spans. Empty means empty cell.
pub type Cell = Vec<Span>;

#[derive(Serialize, Debug, Clone, PartialEq)]
/// One labeled group and its count in a chart.
pub struct Slice {
    pub label: String,
    pub count: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
/// Table part of a rendered block: header labels, optional width weights,
/// and the body rows.
pub struct TableBlock {
    pub columns: Vec<String>,
    pub widths: Option<Vec<u32>>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
/// Fully processed result of one directive block, ready for rendering.
pub struct RenderedBlock {
    pub title: String,
    pub table: Option<TableBlock>,
    pub slices: Option<Vec<Slice>>,
    /// Number of defects that survived the block's filters.
    pub total: usize,
}
