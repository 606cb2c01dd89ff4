//! Column resolution and table row building.
//!
//! A requested column name resolves to one of a closed set of extraction
//! functions over a defect record. Unknown names are fatal to the block: a
//! silently missing column would misrepresent the report. Free-text columns
//! (`Comment`, `Reference`) get traceability item references and hyperlinks
//! injected as structured spans; the relink table can redirect an item
//! reference to a corrected identifier.

use crate::error::ConfigError;
use crate::models::defect::DefectRecord;
use crate::models::{Cell, Span};
use crate::session;
use regex::Regex;
use std::collections::HashMap;

/// Column list used when a block declares neither `col` nor `chart`.
pub const DEFAULT_COLUMNS: &str = "CID,Classification,Action,Comment";

const URL_PATTERN: &str = r#"https?://[^\s<>()\[\]{}"']+"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Builtin columns. `Category` and `Type` read the extra display properties
/// delivered with the defect; everything else reads a dedicated field.
pub enum Column {
    Cid,
    Checker,
    Classification,
    Action,
    Status,
    Component,
    Impact,
    Kind,
    Cwe,
    Category,
    Type,
    Location,
    Comment,
    Reference,
}

impl Column {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cid" => Ok(Column::Cid),
            "checker" => Ok(Column::Checker),
            "classification" => Ok(Column::Classification),
            "action" => Ok(Column::Action),
            "status" => Ok(Column::Status),
            "component" => Ok(Column::Component),
            "impact" => Ok(Column::Impact),
            // `Issue` is the server's display name for the issue kind.
            "kind" | "issue" => Ok(Column::Kind),
            "cwe" => Ok(Column::Cwe),
            "category" => Ok(Column::Category),
            "type" => Ok(Column::Type),
            "location" => Ok(Column::Location),
            "comment" => Ok(Column::Comment),
            "reference" => Ok(Column::Reference),
            _ => Err(ConfigError::UnknownColumn(name.trim().to_string())),
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Column::Cid => "CID",
            Column::Checker => "Checker",
            Column::Classification => "Classification",
            Column::Action => "Action",
            Column::Status => "Status",
            Column::Component => "Component",
            Column::Impact => "Impact",
            Column::Kind => "Issue",
            Column::Cwe => "CWE",
            Column::Category => "Category",
            Column::Type => "Type",
            Column::Location => "Location",
            Column::Comment => "Comment",
            Column::Reference => "Ext. Reference",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Ordered requested columns plus optional percentage width weights.
pub struct TableSpec {
    pub columns: Vec<Column>,
    pub widths: Option<Vec<u32>>,
}

impl TableSpec {
    /// Parse the `col` option (comma-separated names) and the optional
    /// `widths` option (space-separated integers, one per column).
    pub fn parse(col: &str, widths: Option<&str>) -> Result<Self, ConfigError> {
        let mut columns = Vec::new();
        for name in col.split(',') {
            columns.push(Column::parse(name)?);
        }

        let widths = match widths.map(str::trim).filter(|w| !w.is_empty()) {
            Some(raw) => {
                let mut weights = Vec::new();
                for field in raw.split_whitespace() {
                    let weight = field
                        .parse::<u32>()
                        .map_err(|_| ConfigError::InvalidWidth(field.to_string()))?;
                    weights.push(weight);
                }
                if weights.len() != columns.len() {
                    return Err(ConfigError::WidthCountMismatch {
                        expected: columns.len(),
                        got: weights.len(),
                    });
                }
                Some(weights)
            }
            None => None,
        };

        Ok(TableSpec { columns, widths })
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header().to_string()).collect()
    }
}

/// Build-wide inputs for row rendering: the traceability id pattern, the
/// relink table, and the defect-page link base.
pub struct RowContext<'a> {
    pub id_pattern: Option<&'a Regex>,
    pub relink: &'a HashMap<String, String>,
    pub base_url: Option<&'a str>,
    pub stream: &'a str,
}

/// Resolve every requested column for every defect, in request order.
pub fn build_rows(
    defects: &[&DefectRecord],
    spec: &TableSpec,
    ctx: &RowContext<'_>,
) -> Vec<Vec<Cell>> {
    let url_re = Regex::new(URL_PATTERN).expect("bad url pattern");
    defects
        .iter()
        .map(|defect| {
            spec.columns
                .iter()
                .map(|column| cell_for(*column, defect, ctx, &url_re))
                .collect()
        })
        .collect()
}

fn cell_for(column: Column, defect: &DefectRecord, ctx: &RowContext<'_>, url_re: &Regex) -> Cell {
    match column {
        Column::Cid => {
            let label = defect.cid.to_string();
            match ctx.base_url {
                Some(base) => vec![Span::Link {
                    url: session::defect_url(base, ctx.stream, defect.cid),
                    label,
                }],
                None => vec![Span::Text(label)],
            }
        }
        Column::Checker => text_cell(&defect.checker),
        Column::Classification => text_cell(&defect.classification),
        Column::Action => text_cell(&defect.action),
        Column::Status => text_cell(&defect.status),
        Column::Component => text_cell(&defect.component),
        Column::Impact => text_cell(&defect.impact),
        Column::Kind => text_cell(&defect.kind),
        Column::Cwe => text_cell(&defect.cwe),
        Column::Category => property_cell(defect, "displayCategory"),
        Column::Type => property_cell(defect, "displayType"),
        Column::Location => location_cell(defect),
        Column::Comment => linked_text(&defect.comment, ctx, url_re),
        Column::Reference => {
            let text = defect
                .checker_properties
                .get("externalReference")
                .map(String::as_str)
                .unwrap_or("");
            linked_text(text, ctx, url_re)
        }
    }
}

fn text_cell(value: &str) -> Cell {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![Span::Text(value.to_string())]
    }
}

fn property_cell(defect: &DefectRecord, key: &str) -> Cell {
    text_cell(
        defect
            .checker_properties
            .get(key)
            .map(String::as_str)
            .unwrap_or(""),
    )
}

/// `Location` joins the file path and line number with a fixed separator.
fn location_cell(defect: &DefectRecord) -> Cell {
    if defect.file_path.is_empty() {
        return Vec::new();
    }
    match defect.line_number {
        Some(line) => text_cell(&format!("{}#L{}", defect.file_path, line)),
        None => text_cell(&defect.file_path),
    }
}

/// Split free text into spans: hyperlinks become link spans, traceability
/// item identifiers become (relinked) item references.
fn linked_text(text: &str, ctx: &RowContext<'_>, url_re: &Regex) -> Cell {
    let mut cell = Cell::new();
    let mut last = 0;
    for m in url_re.find_iter(text) {
        push_item_spans(&mut cell, &text[last..m.start()], ctx);
        cell.push(Span::Link {
            label: m.as_str().to_string(),
            url: m.as_str().to_string(),
        });
        last = m.end();
    }
    push_item_spans(&mut cell, &text[last..], ctx);
    cell
}

fn push_item_spans(cell: &mut Cell, text: &str, ctx: &RowContext<'_>) {
    if text.is_empty() {
        return;
    }
    let Some(re) = ctx.id_pattern else {
        cell.push(Span::Text(text.to_string()));
        return;
    };
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            cell.push(Span::Text(text[last..m.start()].to_string()));
        }
        let id = ctx
            .relink
            .get(m.as_str())
            .cloned()
            .unwrap_or_else(|| m.as_str().to_string());
        cell.push(Span::ItemRef { id });
        last = m.end();
    }
    if last < text.len() {
        cell.push(Span::Text(text[last..].to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        id_pattern: Option<&'a Regex>,
        relink: &'a HashMap<String, String>,
    ) -> RowContext<'a> {
        RowContext {
            id_pattern,
            relink,
            base_url: None,
            stream: "main",
        }
    }

    fn item_id_regex() -> Regex {
        Regex::new(r"([A-Z_]+-[A-Z0-9_]+)").unwrap()
    }

    fn defect_with_comment(comment: &str) -> DefectRecord {
        DefectRecord {
            cid: 1,
            comment: comment.to_string(),
            ..DefectRecord::default()
        }
    }

    #[test]
    fn test_unknown_column_is_fatal() {
        let err = TableSpec::parse("CID,Bogus", None).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownColumn(name) if name == "Bogus"));
    }

    #[test]
    fn test_width_count_must_match_column_count() {
        let err = TableSpec::parse("CID,Comment", Some("10 60 30")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::WidthCountMismatch {
                expected: 2,
                got: 3
            }
        ));
        let spec = TableSpec::parse("CID,Comment", Some("40 60")).unwrap();
        assert_eq!(spec.widths, Some(vec![40, 60]));
    }

    #[test]
    fn test_default_columns_parse() {
        let spec = TableSpec::parse(DEFAULT_COLUMNS, None).unwrap();
        assert_eq!(
            spec.columns,
            vec![
                Column::Cid,
                Column::Classification,
                Column::Action,
                Column::Comment
            ]
        );
    }

    #[test]
    fn test_column_order_follows_request() {
        let relink = HashMap::new();
        let ctx = ctx(None, &relink);
        let mut defect = DefectRecord {
            cid: 9,
            ..DefectRecord::default()
        };
        defect.classification = "Bug".to_string();
        let defects = vec![&defect];

        let ab = build_rows(&defects, &TableSpec::parse("CID,Classification", None).unwrap(), &ctx);
        let ba = build_rows(&defects, &TableSpec::parse("Classification,CID", None).unwrap(), &ctx);
        assert_eq!(ab[0][0], ba[0][1]);
        assert_eq!(ab[0][1], ba[0][0]);
    }

    #[test]
    fn test_location_joins_path_and_line() {
        let relink = HashMap::new();
        let ctx = ctx(None, &relink);
        let mut defect = DefectRecord {
            cid: 1,
            file_path: "src/io.c".to_string(),
            line_number: Some(88),
            ..DefectRecord::default()
        };
        let spec = TableSpec::parse("Location", None).unwrap();
        let rows = build_rows(&[&defect], &spec, &ctx);
        assert_eq!(rows[0][0], vec![Span::Text("src/io.c#L88".to_string())]);

        defect.line_number = None;
        let rows = build_rows(&[&defect], &spec, &ctx);
        assert_eq!(rows[0][0], vec![Span::Text("src/io.c".to_string())]);
    }

    #[test]
    fn test_comment_links_traceability_ids() {
        let re = item_id_regex();
        let relink = HashMap::new();
        let ctx = ctx(Some(&re), &relink);
        let defect = defect_with_comment("see SWREQ-123 for details");
        let spec = TableSpec::parse("Comment", None).unwrap();
        let rows = build_rows(&[&defect], &spec, &ctx);
        assert_eq!(
            rows[0][0],
            vec![
                Span::Text("see ".to_string()),
                Span::ItemRef {
                    id: "SWREQ-123".to_string()
                },
                Span::Text(" for details".to_string()),
            ]
        );
    }

    #[test]
    fn test_relink_table_overrides_reference_target() {
        let re = item_id_regex();
        let mut relink = HashMap::new();
        relink.insert("SWREQ-123".to_string(), "SWREQ-200".to_string());
        let ctx = ctx(Some(&re), &relink);
        let defect = defect_with_comment("fixed per SWREQ-123");
        let spec = TableSpec::parse("Comment", None).unwrap();
        let rows = build_rows(&[&defect], &spec, &ctx);
        assert!(rows[0][0].contains(&Span::ItemRef {
            id: "SWREQ-200".to_string()
        }));
    }

    #[test]
    fn test_urls_in_comments_become_links() {
        let re = item_id_regex();
        let relink = HashMap::new();
        let ctx = ctx(Some(&re), &relink);
        let defect = defect_with_comment("triaged, see https://ticket.example.com/42 too");
        let spec = TableSpec::parse("Comment", None).unwrap();
        let rows = build_rows(&[&defect], &spec, &ctx);
        assert_eq!(
            rows[0][0],
            vec![
                Span::Text("triaged, see ".to_string()),
                Span::Link {
                    label: "https://ticket.example.com/42".to_string(),
                    url: "https://ticket.example.com/42".to_string(),
                },
                Span::Text(" too".to_string()),
            ]
        );
    }

    #[test]
    fn test_disabled_id_pattern_leaves_text_alone() {
        let relink = HashMap::new();
        let ctx = ctx(None, &relink);
        let defect = defect_with_comment("see SWREQ-123");
        let spec = TableSpec::parse("Comment", None).unwrap();
        let rows = build_rows(&[&defect], &spec, &ctx);
        assert_eq!(rows[0][0], vec![Span::Text("see SWREQ-123".to_string())]);
    }

    #[test]
    fn test_cid_cell_links_to_defect_page() {
        let relink = HashMap::new();
        let ctx = RowContext {
            id_pattern: None,
            relink: &relink,
            base_url: Some("https://cov.example.com"),
            stream: "main",
        };
        let defect = DefectRecord {
            cid: 1234,
            ..DefectRecord::default()
        };
        let spec = TableSpec::parse("CID", None).unwrap();
        let rows = build_rows(&[&defect], &spec, &ctx);
        match &rows[0][0][0] {
            Span::Link { label, url } => {
                assert_eq!(label, "1234");
                assert_eq!(
                    url,
                    "https://cov.example.com/query/defects.htm?stream=main&cid=1234"
                );
            }
            other => panic!("expected link span, got {:?}", other),
        }
    }

    #[test]
    fn test_category_reads_checker_properties() {
        let relink = HashMap::new();
        let ctx = ctx(None, &relink);
        let mut defect = DefectRecord {
            cid: 1,
            ..DefectRecord::default()
        };
        defect
            .checker_properties
            .insert("displayCategory".to_string(), "Memory".to_string());
        let spec = TableSpec::parse("Category,Type", None).unwrap();
        let rows = build_rows(&[&defect], &spec, &ctx);
        assert_eq!(rows[0][0], vec![Span::Text("Memory".to_string())]);
        assert!(rows[0][1].is_empty());
    }
}
