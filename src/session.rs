//! Session: thin wrapper around the Coverity Connect REST API.
//!
//! The core only depends on the `Session` contract; `HttpSession` is the
//! real collaborator, authenticating once per build with basic auth and
//! speaking the `api/v2` endpoints.

use crate::error::RetrievalError;
use crate::models::defect::{DefectRecord, IssuesResponse};
use crate::utils;
use serde_json::json;
use std::time::Duration;

/// Column keys requested with every defect query. Covers every builtin
/// column plus the fields the filter engine reads; filtering happens
/// client-side so one fetch serves every block on the same stream/snapshot.
const REQUESTED_COLUMNS: &[&str] = &[
    "cid",
    "checker",
    "classification",
    "action",
    "status",
    "displayComponent",
    "displayImpact",
    "displayIssueKind",
    "cwe",
    "displayFile",
    "lineNumber",
    "lastTriageComment",
    "externalReference",
    "displayCategory",
    "displayType",
];

/// Contract the defect cache requires from the remote collaborator.
pub trait Session {
    fn fetch(
        &self,
        stream: &str,
        snapshot: Option<&str>,
    ) -> Result<Vec<DefectRecord>, RetrievalError>;
}

pub struct HttpSession {
    api_endpoint: String,
    client: reqwest::blocking::Client,
    username: String,
    password: String,
}

impl HttpSession {
    /// Build a client against `base_url` and verify that `stream` exists.
    /// A missing or inaccessible stream fails the whole build up front.
    pub fn connect(
        base_url: &str,
        username: &str,
        password: &str,
        stream: &str,
    ) -> Result<Self, RetrievalError> {
        let api_endpoint = format!("{}/api/v2", base_url.trim_end_matches('/'));
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let session = HttpSession {
            api_endpoint,
            client,
            username: username.to_string(),
            password: password.to_string(),
        };
        session.validate_stream(stream)?;
        Ok(session)
    }

    fn validate_stream(&self, stream: &str) -> Result<(), RetrievalError> {
        let url = format!("{}/streams/{}", self.api_endpoint, stream);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()?;
        if response.status().as_u16() == 404 {
            return Err(RetrievalError::UnknownStream(stream.to_string()));
        }
        Self::check(response)?;
        Ok(())
    }

    /// Verify a configured snapshot ID. An unknown snapshot is not fatal:
    /// a warning is logged and the latest snapshot is used instead.
    pub fn validate_snapshot(&self, snapshot: &str) -> Option<String> {
        let url = format!("{}/snapshots/{}", self.api_endpoint, snapshot);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send();
        match response {
            Ok(response) if response.status().is_success() => Some(snapshot.to_string()),
            _ => {
                utils::report_warning(
                    &format!(
                        "no snapshot found for ID {}; continuing with the latest snapshot",
                        snapshot
                    ),
                    "",
                );
                None
            }
        }
    }

    fn check(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, RetrievalError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<serde_json::Value>() {
            Ok(body) => body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("request rejected")
                .to_string(),
            Err(_) => "request rejected".to_string(),
        };
        Err(RetrievalError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

impl Session for HttpSession {
    fn fetch(
        &self,
        stream: &str,
        snapshot: Option<&str>,
    ) -> Result<Vec<DefectRecord>, RetrievalError> {
        utils::report_info(&format!("querying defects in stream [{}] ...", stream));
        let url = format!("{}/issues/search", self.api_endpoint);
        let response = self
            .client
            .post(&url)
            .query(&[
                ("includeColumnLabels", "true"),
                ("offset", "0"),
                ("queryType", "bySnapshot"),
                ("rowCount", "-1"),
                ("sortOrder", "asc"),
            ])
            .basic_auth(&self.username, Some(&self.password))
            .json(&search_body(stream, snapshot))
            .send()?;
        let response = Self::check(response)?;
        let parsed: IssuesResponse = response
            .json()
            .map_err(|err| RetrievalError::MalformedResponse(err.to_string()))?;

        let mut defects = Vec::with_capacity(parsed.rows.len());
        for row in &parsed.rows {
            defects.push(DefectRecord::from_cells(row).map_err(RetrievalError::MalformedResponse)?);
        }
        utils::report_info(&format!("{} received", defects.len()));
        Ok(defects)
    }
}

/// POST body for `issues/search`, scoped to one stream and snapshot.
/// An absent snapshot means the stream's latest (`last()`).
pub fn search_body(stream: &str, snapshot: Option<&str>) -> serde_json::Value {
    json!({
        "filters": [{
            "columnKey": "streams",
            "matchMode": "oneOrMoreMatch",
            "matchers": [{"class": "Stream", "name": stream, "type": "nameMatcher"}]
        }],
        "columns": REQUESTED_COLUMNS,
        "snapshotScope": {
            "show": {
                "scope": snapshot.unwrap_or("last()"),
                "includeOutdatedSnapshots": false
            }
        }
    })
}

/// URL of the server's defect page for one CID, e.g.
/// `https://cov.example.com/query/defects.htm?stream=StreamA&cid=1234`.
pub fn defect_url(base_url: &str, stream: &str, cid: i64) -> String {
    format!(
        "{}/query/defects.htm?stream={}&cid={}",
        base_url.trim_end_matches('/'),
        stream,
        cid
    )
}
