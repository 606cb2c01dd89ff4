//! Defect record model and deserialization from the Coverity REST response.
//!
//! One record corresponds to one row of the `issues/search` response, which
//! arrives as a list of `{"key": ..., "value": ...}` cells. Records are
//! immutable once built; the cache owns them for the whole build.

use serde::Deserialize;
use std::collections::HashMap;

/// One static-analysis finding. `cid` is stable and unique per
/// (stream, snapshot); everything else is read-only display data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefectRecord {
    pub cid: i64,
    pub checker: String,
    pub classification: String,
    pub action: String,
    pub status: String,
    pub component: String,
    pub impact: String,
    pub kind: String,
    pub cwe: String,
    pub file_path: String,
    pub line_number: Option<u32>,
    pub comment: String,
    /// Extra display properties keyed by response column key
    /// (e.g. `displayCategory`, `displayType`, `externalReference`).
    pub checker_properties: HashMap<String, String>,
}

/// One key/value cell of a response row.
#[derive(Deserialize, Debug, Clone)]
pub struct IssueCell {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Envelope of the `issues/search` response.
#[derive(Deserialize, Debug)]
pub struct IssuesResponse {
    #[serde(rename = "totalRows", default)]
    pub total_rows: i64,
    #[serde(default)]
    pub rows: Vec<Vec<IssueCell>>,
}

impl DefectRecord {
    /// Build a record from one response row. A row without a parseable
    /// `cid` cell is malformed data.
    pub fn from_cells(cells: &[IssueCell]) -> Result<Self, String> {
        let mut record = DefectRecord::default();
        let mut cid_seen = false;
        for cell in cells {
            match cell.key.as_str() {
                "cid" => {
                    record.cid = cell
                        .value
                        .parse::<i64>()
                        .map_err(|_| format!("unparseable cid '{}'", cell.value))?;
                    cid_seen = true;
                }
                "checker" | "checkerName" => record.checker = cell.value.clone(),
                "classification" => record.classification = cell.value.clone(),
                "action" => record.action = cell.value.clone(),
                "status" => record.status = cell.value.clone(),
                "component" | "displayComponent" | "componentName" => {
                    record.component = cell.value.clone()
                }
                "impact" | "displayImpact" => record.impact = cell.value.clone(),
                "kind" | "displayIssueKind" => record.kind = cell.value.clone(),
                "cwe" => record.cwe = cell.value.clone(),
                "displayFile" | "filePathname" => record.file_path = cell.value.clone(),
                "lineNumber" => record.line_number = cell.value.parse::<u32>().ok(),
                "lastTriageComment" => record.comment = cell.value.clone(),
                _ => {
                    record
                        .checker_properties
                        .insert(cell.key.clone(), cell.value.clone());
                }
            }
        }
        if !cid_seen {
            return Err("row is missing the required 'cid' cell".to_string());
        }
        Ok(record)
    }
}
