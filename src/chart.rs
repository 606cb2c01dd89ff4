//! Chart aggregation: groups a filtered defect sequence into labeled slices.
//!
//! Two mutually exclusive modes, selected by the option syntax:
//! - explicit partition: `[<attribute>:]<group>,<group>,...` where a group is
//!   one or more attribute values joined by `+` (a merged slice),
//! - threshold partition: `[<attribute>:]<integer>` where every value whose
//!   count reaches the threshold becomes its own slice and the long tail
//!   collapses into `Other`.
//!
//! Slices are ordered by descending count; ties keep first-encounter order
//! (declaration order in explicit mode). `Other`, when present, is last.

use crate::error::ConfigError;
use crate::filter::Attribute;
use crate::models::defect::DefectRecord;
use crate::models::Slice;
use crate::utils;
use std::collections::HashMap;

pub const OTHER_LABEL: &str = "Other";

#[derive(Debug, Clone, PartialEq)]
pub enum ChartMode {
    /// Ordered value-sets; a defect counts in the first set containing its
    /// value. No catch-all: unmatched defects are excluded from the chart.
    Explicit(Vec<Vec<String>>),
    /// Minimum count for a value to form its own slice.
    Threshold(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub attribute: Attribute,
    pub mode: ChartMode,
}

impl ChartSpec {
    /// Parse the `chart` option: `[<attribute>:]<spec>` where `<spec>` is
    /// either a single integer threshold or a comma/plus-separated list of
    /// value groups. The attribute defaults to classification.
    pub fn parse(option: &str) -> Result<Self, ConfigError> {
        let option = option.trim();
        let (attribute, spec) = match option.split_once(':') {
            Some((attr, rest)) => (Attribute::parse(attr)?, rest.trim()),
            None => (Attribute::Classification, option),
        };
        if spec.is_empty() {
            return Err(ConfigError::InvalidChart(option.to_string()));
        }

        if let Ok(threshold) = spec.parse::<usize>() {
            return Ok(ChartSpec {
                attribute,
                mode: ChartMode::Threshold(threshold),
            });
        }

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        for raw_group in spec.split(',') {
            let mut group: Vec<String> = Vec::new();
            for value in raw_group.split('+').map(str::trim).filter(|v| !v.is_empty()) {
                match seen.get(value) {
                    Some(owner) if *owner != groups.len() => {
                        return Err(ConfigError::OverlappingGroups(value.to_string()));
                    }
                    Some(_) => {
                        utils::report_warning(
                            &format!("attribute value '{}' listed twice in chart option", value),
                            "",
                        );
                    }
                    None => {
                        seen.insert(value.to_string(), groups.len());
                        group.push(value.to_string());
                    }
                }
            }
            if group.is_empty() {
                return Err(ConfigError::InvalidChart(option.to_string()));
            }
            groups.push(group);
        }
        Ok(ChartSpec {
            attribute,
            mode: ChartMode::Explicit(groups),
        })
    }
}

/// Aggregate the (already filtered) defect sequence into chart slices.
pub fn aggregate(defects: &[&DefectRecord], spec: &ChartSpec) -> Vec<Slice> {
    match &spec.mode {
        ChartMode::Explicit(groups) => {
            let mut slices: Vec<Slice> = groups
                .iter()
                .map(|group| Slice {
                    label: group.join("+"),
                    count: 0,
                })
                .collect();
            for defect in defects {
                let value = spec.attribute.value(defect);
                if let Some(ix) = groups
                    .iter()
                    .position(|group| group.iter().any(|v| v == value.as_ref()))
                {
                    slices[ix].count += 1;
                }
            }
            slices.retain(|slice| slice.count > 0);
            slices.sort_by(|a, b| b.count.cmp(&a.count));
            slices
        }
        ChartMode::Threshold(threshold) => {
            let mut order: Vec<String> = Vec::new();
            let mut counts: HashMap<String, usize> = HashMap::new();
            for defect in defects {
                let value = spec.attribute.value(defect).into_owned();
                if !counts.contains_key(&value) {
                    order.push(value.clone());
                }
                *counts.entry(value).or_insert(0) += 1;
            }

            let mut slices: Vec<Slice> = Vec::new();
            let mut other = 0usize;
            for label in order {
                let count = counts[&label];
                if count >= *threshold {
                    slices.push(Slice { label, count });
                } else {
                    other += count;
                }
            }
            slices.sort_by(|a, b| b.count.cmp(&a.count));
            if other > 0 {
                slices.push(Slice {
                    label: OTHER_LABEL.to_string(),
                    count: other,
                });
            }
            slices
        }
    }
}
