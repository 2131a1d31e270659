//! Core domain model for the CFOD import pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "cfod-core";

/// Separator used when assembling `description` from several source fields.
pub const DESCRIPTION_SEPARATOR: &str = " | ";

/// Closed set of canonical opportunity categories. Free-text source labels
/// are mapped into this enum by the normalizer; nothing downstream ever
/// sees the original label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpportunityType {
    Grant,
    Accelerator,
    Competition,
    Credits,
    Fellowship,
    #[serde(rename = "VC")]
    Vc,
}

impl OpportunityType {
    pub const ALL: [OpportunityType; 6] = [
        OpportunityType::Grant,
        OpportunityType::Accelerator,
        OpportunityType::Competition,
        OpportunityType::Credits,
        OpportunityType::Fellowship,
        OpportunityType::Vc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityType::Grant => "Grant",
            OpportunityType::Accelerator => "Accelerator",
            OpportunityType::Competition => "Competition",
            OpportunityType::Credits => "Credits",
            OpportunityType::Fellowship => "Fellowship",
            OpportunityType::Vc => "VC",
        }
    }
}

impl std::fmt::Display for OpportunityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical persisted record. Constructed once per source row by a schema
/// transformer, immutable afterward, inserted at most once per run.
///
/// `name` lower-cased is the sole deduplication identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingOpportunity {
    pub name: String,
    pub opportunity_type: OpportunityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub stage: Vec<String>,
    /// ISO calendar date, or absent for "no deadline". Never a free-text
    /// phrase; sentinel phrases are resolved away by the normalizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_size_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_size_max: Option<f64>,
    #[serde(default)]
    pub chicago_focused: bool,
}

impl FundingOpportunity {
    pub fn new(name: impl Into<String>, opportunity_type: OpportunityType) -> Self {
        Self {
            name: name.into(),
            opportunity_type,
            description: None,
            sectors: Vec::new(),
            stage: Vec::new(),
            deadline: None,
            website: None,
            application_url: None,
            featured: false,
            check_size_min: None,
            check_size_max: None,
            chicago_focused: false,
        }
    }

    /// Lower-cased name, the identity used to detect already-persisted rows.
    pub fn dedup_key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// One source row as emitted by the tabular reader: header labels paired
/// with trimmed values, in header order. Empty-after-trim values are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    columns: Vec<(String, Option<String>)>,
}

impl RawRecord {
    pub fn new(columns: Vec<(String, Option<String>)>) -> Self {
        Self { columns }
    }

    /// Value for a header label, if the column exists and is non-empty.
    /// Linear scan; source exports have a handful of columns.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(key, _)| key == label)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opportunity_type_round_trips_through_json() {
        let json = serde_json::to_string(&OpportunityType::Vc).unwrap();
        assert_eq!(json, "\"VC\"");
        let back: OpportunityType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OpportunityType::Vc);
    }

    #[test]
    fn minimal_opportunity_serializes_without_absent_fields() {
        let opp = FundingOpportunity::new("Acme Fund", OpportunityType::Grant);
        let value = serde_json::to_value(&opp).unwrap();
        assert_eq!(value["name"], "Acme Fund");
        assert_eq!(value["opportunity_type"], "Grant");
        assert!(value.get("deadline").is_none());
        assert!(value.get("description").is_none());
        assert_eq!(value["sectors"], serde_json::json!([]));
        assert_eq!(value["featured"], false);
    }

    #[test]
    fn deadline_serializes_as_iso_date() {
        let mut opp = FundingOpportunity::new("Dated", OpportunityType::Grant);
        opp.deadline = NaiveDate::from_ymd_opt(2026, 1, 1);
        let value = serde_json::to_value(&opp).unwrap();
        assert_eq!(value["deadline"], "2026-01-01");
    }

    #[test]
    fn raw_record_lookup_is_by_label() {
        let record = RawRecord::new(vec![
            ("Name".to_string(), Some("Acme".to_string())),
            ("Notes".to_string(), None),
        ]);
        assert_eq!(record.get("Name"), Some("Acme"));
        assert_eq!(record.get("Notes"), None);
        assert_eq!(record.get("Missing"), None);
    }
}
