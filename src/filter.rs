//! Filter engine: a conjunction of attribute predicates over defect records.
//!
//! Filters form a small closed set of tagged predicate variants evaluated
//! through one interface, keyed by an enumerated attribute tag:
//! - exact-match value sets for most attributes,
//! - pattern sets for `checker`,
//! - integer identity for `cid`.
//!
//! An attribute that is not configured imposes no constraint. An attribute
//! configured with an empty value set matches nothing; the two cases are
//! kept distinct (`Option` vs empty collection).

use crate::error::ConfigError;
use crate::models::defect::DefectRecord;
use crate::utils;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashSet;

// Coverity built-in triage vocabularies. Values outside these lists are
// accepted with a warning; custom attribute values exist on most servers.
pub const CLASSIFICATION_LIST: &[&str] = &[
    "Unclassified",
    "Pending",
    "False Positive",
    "Intentional",
    "Bug",
    "Untested",
    "No Test Needed",
];

pub const ACTION_LIST: &[&str] = &[
    "Undecided",
    "Fix Required",
    "Fix Submitted",
    "Modeling Required",
    "Ignore",
    "On hold",
    "For Interest Only",
];

pub const IMPACT_LIST: &[&str] = &["High", "Medium", "Low"];

pub const KIND_LIST: &[&str] = &["QUALITY", "SECURITY", "TEST"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Filterable (and chart-groupable) defect attributes.
pub enum Attribute {
    Checker,
    Impact,
    Kind,
    Classification,
    Action,
    Component,
    Cwe,
    Cid,
}

impl Attribute {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "checker" => Ok(Attribute::Checker),
            "impact" => Ok(Attribute::Impact),
            "kind" => Ok(Attribute::Kind),
            "classification" => Ok(Attribute::Classification),
            "action" => Ok(Attribute::Action),
            "component" => Ok(Attribute::Component),
            "cwe" => Ok(Attribute::Cwe),
            "cid" => Ok(Attribute::Cid),
            _ => Err(ConfigError::UnknownAttribute(name.trim().to_string())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Attribute::Checker => "checker",
            Attribute::Impact => "impact",
            Attribute::Kind => "kind",
            Attribute::Classification => "classification",
            Attribute::Action => "action",
            Attribute::Component => "component",
            Attribute::Cwe => "cwe",
            Attribute::Cid => "cid",
        }
    }

    /// The defect's value for this attribute, as rendered in filters and
    /// chart labels.
    pub fn value(self, defect: &DefectRecord) -> Cow<'_, str> {
        match self {
            Attribute::Checker => Cow::from(&defect.checker),
            Attribute::Impact => Cow::from(&defect.impact),
            Attribute::Kind => Cow::from(&defect.kind),
            Attribute::Classification => Cow::from(&defect.classification),
            Attribute::Action => Cow::from(&defect.action),
            Attribute::Component => Cow::from(&defect.component),
            Attribute::Cwe => Cow::from(&defect.cwe),
            Attribute::Cid => Cow::from(defect.cid.to_string()),
        }
    }

    fn vocabulary(self) -> Option<&'static [&'static str]> {
        match self {
            Attribute::Classification => Some(CLASSIFICATION_LIST),
            Attribute::Action => Some(ACTION_LIST),
            Attribute::Impact => Some(IMPACT_LIST),
            Attribute::Kind => Some(KIND_LIST),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
/// One configured predicate. Evaluated against the attribute it is keyed by.
pub enum Predicate {
    /// Exact membership in the accepted value set. Empty set matches nothing.
    AnyOf(HashSet<String>),
    /// At least one pattern matches the attribute value.
    Matches(Vec<Regex>),
    /// Exact match against the integer defect identifier.
    Cids(HashSet<i64>),
}

impl Predicate {
    fn matches(&self, attribute: Attribute, defect: &DefectRecord) -> bool {
        match self {
            Predicate::AnyOf(values) => values.contains(attribute.value(defect).as_ref()),
            Predicate::Matches(patterns) => {
                let value = attribute.value(defect);
                patterns.iter().any(|re| re.is_match(value.as_ref()))
            }
            Predicate::Cids(cids) => cids.contains(&defect.cid),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// A single block's filter configuration: the conjunction of all configured
/// predicates, in declaration order.
pub struct FilterSpec {
    predicates: Vec<(Attribute, Predicate)>,
}

/// Split a comma-separated option value into trimmed, non-empty fields.
fn csv_values(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

impl FilterSpec {
    /// Build the spec from the raw directive options. `None` means the
    /// option was not declared; an empty string declares an empty set.
    pub fn from_options(
        checker: Option<&str>,
        impact: Option<&str>,
        kind: Option<&str>,
        classification: Option<&str>,
        action: Option<&str>,
        component: Option<&str>,
        cwe: Option<&str>,
        cid: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut predicates = Vec::new();

        if let Some(raw) = checker {
            let mut patterns = Vec::new();
            for field in csv_values(raw) {
                let re = Regex::new(field).map_err(|err| ConfigError::InvalidCheckerPattern {
                    pattern: field.to_string(),
                    reason: err.to_string(),
                })?;
                patterns.push(re);
            }
            predicates.push((Attribute::Checker, Predicate::Matches(patterns)));
        }

        for (attribute, raw) in [
            (Attribute::Impact, impact),
            (Attribute::Kind, kind),
            (Attribute::Classification, classification),
            (Attribute::Action, action),
            (Attribute::Component, component),
            (Attribute::Cwe, cwe),
        ] {
            if let Some(raw) = raw {
                let values = csv_values(raw);
                if let Some(vocabulary) = attribute.vocabulary() {
                    for value in &values {
                        if !vocabulary.contains(value) {
                            utils::report_warning(
                                &format!("unknown {} value '{}' in filter", attribute.label(), value),
                                "",
                            );
                        }
                    }
                }
                let set: HashSet<String> = values.into_iter().map(str::to_string).collect();
                predicates.push((attribute, Predicate::AnyOf(set)));
            }
        }

        if let Some(raw) = cid {
            let mut cids = HashSet::new();
            for field in csv_values(raw) {
                let parsed = field
                    .parse::<i64>()
                    .map_err(|_| ConfigError::InvalidCid(field.to_string()))?;
                cids.insert(parsed);
            }
            predicates.push((Attribute::Cid, Predicate::Cids(cids)));
        }

        Ok(FilterSpec { predicates })
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, defect: &DefectRecord) -> bool {
        self.predicates
            .iter()
            .all(|(attribute, predicate)| predicate.matches(*attribute, defect))
    }
}

/// Stable conjunction filter: keeps the input's relative order, no resort.
pub fn apply<'a, I>(defects: I, spec: &FilterSpec) -> Vec<&'a DefectRecord>
where
    I: IntoIterator<Item = &'a DefectRecord>,
{
    defects
        .into_iter()
        .filter(|defect| spec.matches(defect))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defect(cid: i64, classification: &str) -> DefectRecord {
        DefectRecord {
            cid,
            classification: classification.to_string(),
            ..DefectRecord::default()
        }
    }

    fn spec_with(classification: Option<&str>) -> FilterSpec {
        FilterSpec::from_options(None, None, None, classification, None, None, None, None).unwrap()
    }

    #[test]
    fn test_classification_filter_keeps_matching_subset() {
        let defects = vec![defect(1, "Bug"), defect(2, "Bug"), defect(3, "Pending")];
        let spec = spec_with(Some("Bug"));
        let filtered = apply(&defects, &spec);
        let cids: Vec<i64> = filtered.iter().map(|d| d.cid).collect();
        assert_eq!(cids, vec![1, 2]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let defects = vec![defect(1, "Bug"), defect(2, "Pending"), defect(3, "Bug")];
        let spec = spec_with(Some("Bug"));
        let once = apply(&defects, &spec);
        let twice = apply(once.iter().copied(), &spec);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unconfigured_attribute_imposes_no_constraint() {
        let defects = vec![defect(1, "Bug"), defect(2, "Pending")];
        let spec = spec_with(None);
        assert!(spec.is_empty());
        assert_eq!(apply(&defects, &spec).len(), 2);
    }

    #[test]
    fn test_empty_value_set_matches_nothing() {
        let defects = vec![defect(1, "Bug"), defect(2, "Pending")];
        let spec = spec_with(Some(""));
        assert!(!spec.is_empty());
        assert!(apply(&defects, &spec).is_empty());
    }

    #[test]
    fn test_checker_values_are_patterns() {
        let mut a = defect(1, "Bug");
        a.checker = "MISRA C-2012 10.1".to_string();
        let mut b = defect(2, "Bug");
        b.checker = "NULL_RETURNS".to_string();
        let defects = vec![a, b];
        let spec =
            FilterSpec::from_options(Some("MISRA"), None, None, None, None, None, None, None)
                .unwrap();
        let cids: Vec<i64> = apply(&defects, &spec).iter().map(|d| d.cid).collect();
        assert_eq!(cids, vec![1]);
    }

    #[test]
    fn test_bad_checker_pattern_is_config_error() {
        let err = FilterSpec::from_options(Some("MISRA["), None, None, None, None, None, None, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCheckerPattern { .. }));
    }

    #[test]
    fn test_cid_filter_is_exact_integer_match() {
        let defects = vec![defect(7, "Bug"), defect(77, "Bug")];
        let spec =
            FilterSpec::from_options(None, None, None, None, None, None, None, Some("7")).unwrap();
        let cids: Vec<i64> = apply(&defects, &spec).iter().map(|d| d.cid).collect();
        assert_eq!(cids, vec![7]);
    }

    #[test]
    fn test_invalid_cid_is_config_error() {
        let err = FilterSpec::from_options(None, None, None, None, None, None, None, Some("7,x"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCid(_)));
    }

    #[test]
    fn test_attributes_combine_by_logical_and() {
        let mut a = defect(1, "Bug");
        a.impact = "High".to_string();
        let mut b = defect(2, "Bug");
        b.impact = "Low".to_string();
        let mut c = defect(3, "Pending");
        c.impact = "High".to_string();
        let defects = vec![a, b, c];
        let spec = FilterSpec::from_options(
            None,
            Some("High"),
            None,
            Some("Bug"),
            None,
            None,
            None,
            None,
        )
        .unwrap();
        let cids: Vec<i64> = apply(&defects, &spec).iter().map(|d| d.cid).collect();
        assert_eq!(cids, vec![1]);
    }
}
