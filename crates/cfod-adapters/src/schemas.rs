//! Per-schema record transformers.
//!
//! Each source export has its own column vocabulary; a transformer is the
//! pure mapping from one of those vocabularies onto [`FundingOpportunity`].
//! Rows without a usable name have no identity and are dropped (`None`).

use cfod_core::{FundingOpportunity, RawRecord};

use crate::normalize::{
    join_description, map_opportunity_type, parse_amount, parse_deadline, parse_flag, split_list,
};

/// Strategy seam: one implementation per source schema, selected by id.
pub trait SchemaTransformer: Send + Sync {
    fn schema_id(&self) -> &'static str;
    fn transform(&self, record: &RawRecord) -> Option<FundingOpportunity>;
}

/// Schema ids accepted by [`transformer_for_schema`]. The hand-authored
/// seed dataset is a fourth source but carries no tabular schema; see
/// [`crate::seed`].
pub const SCHEMA_IDS: &[&str] = &["sheet", "nondilutive", "equity"];

pub fn transformer_for_schema(schema_id: &str) -> Option<Box<dyn SchemaTransformer>> {
    match schema_id {
        "sheet" => Some(Box::new(SheetExportSchema)),
        "nondilutive" => Some(Box::new(NonDilutiveCsvSchema)),
        "equity" => Some(Box::new(EquityFundingCsvSchema)),
        _ => None,
    }
}

/// Spreadsheet export: {Opportunity Name, Type, Eligibility, Notes, Amount,
/// Deadline, Focus Area, Website}.
pub struct SheetExportSchema;

impl SchemaTransformer for SheetExportSchema {
    fn schema_id(&self) -> &'static str {
        "sheet"
    }

    fn transform(&self, record: &RawRecord) -> Option<FundingOpportunity> {
        let name = record.get("Opportunity Name")?;
        let mut opp = FundingOpportunity::new(name, map_opportunity_type(record.get("Type")));

        let deadline_text = record.get("Deadline");
        opp.deadline = parse_deadline(deadline_text);
        // A deadline phrase that did not resolve to a date still carries
        // information; keep it in the description.
        let unparsed_deadline = if opp.deadline.is_none() {
            deadline_text
        } else {
            None
        };
        opp.description = join_description(&[
            record.get("Eligibility"),
            record.get("Notes"),
            record.get("Amount"),
            unparsed_deadline,
        ]);
        opp.sectors = split_list(record.get("Focus Area"));
        opp.website = record.get("Website").map(str::to_string);
        Some(opp)
    }
}

/// Non-dilutive capital CSV export (grants, accelerators, competitions):
/// {Name, Category, Description, Focus Areas, Stage, Deadline, Amount,
/// Website, Application URL, Featured}.
pub struct NonDilutiveCsvSchema;

impl SchemaTransformer for NonDilutiveCsvSchema {
    fn schema_id(&self) -> &'static str {
        "nondilutive"
    }

    fn transform(&self, record: &RawRecord) -> Option<FundingOpportunity> {
        let name = record.get("Name")?;
        let mut opp = FundingOpportunity::new(name, map_opportunity_type(record.get("Category")));

        let deadline_text = record.get("Deadline");
        opp.deadline = parse_deadline(deadline_text);
        let unparsed_deadline = if opp.deadline.is_none() {
            deadline_text
        } else {
            None
        };
        opp.description = join_description(&[
            record.get("Description"),
            record.get("Amount"),
            unparsed_deadline,
        ]);
        opp.sectors = split_list(record.get("Focus Areas"));
        opp.stage = split_list(record.get("Stage"));
        opp.website = record.get("Website").map(str::to_string);
        opp.application_url = record.get("Application URL").map(str::to_string);
        opp.featured = parse_flag(record.get("Featured"));
        Some(opp)
    }
}

/// Equity funding CSV export (venture funds, angel groups): {Fund Name,
/// Primary Stage, Focus Areas, Check Size Min, Check Size Max, Check Size,
/// Thesis, Website, Application URL, Featured}.
///
/// Deadline is force-set to absent regardless of source content: venture
/// programs are modeled as perpetually open. Domain policy, not a parsing
/// limitation.
pub struct EquityFundingCsvSchema;

impl SchemaTransformer for EquityFundingCsvSchema {
    fn schema_id(&self) -> &'static str {
        "equity"
    }

    fn transform(&self, record: &RawRecord) -> Option<FundingOpportunity> {
        let name = record.get("Fund Name")?;
        let mut opp =
            FundingOpportunity::new(name, map_opportunity_type(record.get("Primary Stage")));

        opp.deadline = None;
        opp.stage = split_list(record.get("Primary Stage"));
        opp.sectors = split_list(record.get("Focus Areas"));
        opp.check_size_min = parse_amount(record.get("Check Size Min"));
        opp.check_size_max = parse_amount(record.get("Check Size Max"));

        // When the export only has a display string for check size, keep it
        // as free text instead of guessing at bounds.
        let check_size_text = if opp.check_size_min.is_none() && opp.check_size_max.is_none() {
            record.get("Check Size")
        } else {
            None
        };
        opp.description = join_description(&[record.get("Thesis"), check_size_text]);
        opp.website = record.get("Website").map(str::to_string);
        opp.application_url = record.get("Application URL").map(str::to_string);
        opp.featured = parse_flag(record.get("Featured"));
        Some(opp)
    }
}
