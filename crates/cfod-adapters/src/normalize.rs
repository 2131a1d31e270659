//! Field-level normalization heuristics.
//!
//! Every function here is total: malformed or absent input resolves to a
//! documented default rather than an error. Classification is best-effort,
//! not validation: the source exports are hand-maintained and messy.

use cfod_core::{OpportunityType, DESCRIPTION_SEPARATOR};
use chrono::NaiveDate;

/// Priority-ordered classification rules, evaluated top to bottom against
/// the lower-cased label; first substring match wins, so `"Accelerator +
/// Grant"` resolves to `Accelerator`. Unmatched labels default to `Grant`.
pub const TYPE_RULES: &[(&str, OpportunityType)] = &[
    ("accelerator", OpportunityType::Accelerator),
    ("incubator", OpportunityType::Accelerator),
    ("fellowship", OpportunityType::Fellowship),
    ("competition", OpportunityType::Competition),
    ("challenge", OpportunityType::Competition),
    ("pitch", OpportunityType::Competition),
    ("credit", OpportunityType::Credits),
    ("vc", OpportunityType::Vc),
    ("venture", OpportunityType::Vc),
    ("equity", OpportunityType::Vc),
    ("angel", OpportunityType::Vc),
    ("seed", OpportunityType::Vc),
    ("series", OpportunityType::Vc),
    ("grant", OpportunityType::Grant),
];

/// Best-effort mapping of a free-text type/category/stage label onto the
/// closed enum.
pub fn map_opportunity_type(label: Option<&str>) -> OpportunityType {
    let Some(label) = label else {
        return OpportunityType::Grant;
    };
    let lower = label.to_lowercase();
    TYPE_RULES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, kind)| *kind)
        .unwrap_or(OpportunityType::Grant)
}

/// Split a delimiter-joined list field on commas and slashes, trimming each
/// token and dropping empties. Absent input is an empty list, never null.
pub fn split_list(input: Option<&str>) -> Vec<String> {
    let Some(input) = input else {
        return Vec::new();
    };
    input
        .split(|c| c == ',' || c == '/')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Free-text deadline phrases that mean "perpetually open". These resolve
/// to an absent deadline; the transformer keeps the phrase in the
/// description so the information survives.
const NO_DEADLINE_SENTINELS: &[&str] = &[
    "rolling", "quarterly", "varies", "check", "monthly", "ongoing", "tbd",
];

const MONTHS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn month_number(token: &str) -> Option<u32> {
    MONTHS.iter().position(|&name| {
        token == name || (token.len() == 3 && name.starts_with(token))
    }).map(|i| i as u32 + 1)
}

/// Resolve a free-text deadline to a calendar date, or to absent.
///
/// Sentinel phrases and anything without a recognizable `Month day, year`
/// pattern map to `None` silently, an accepted-lossy behavior chosen over
/// failing whole records on hand-typed dates.
pub fn parse_deadline(input: Option<&str>) -> Option<NaiveDate> {
    let text = input?.trim();
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    if NO_DEADLINE_SENTINELS
        .iter()
        .any(|sentinel| lower.contains(sentinel))
    {
        return None;
    }

    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    for (i, token) in tokens.iter().enumerate() {
        let Some(month) = month_number(token) else {
            continue;
        };
        // Expect a day then a four-digit year right after the month name.
        let day = tokens.get(i + 1).and_then(|t| t.parse::<u32>().ok());
        let year = tokens.get(i + 2).and_then(|t| t.parse::<i32>().ok());
        if let (Some(day), Some(year)) = (day, year) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }
    None
}

/// Case-insensitive `"true"`; anything else, including absence, is false.
pub fn parse_flag(input: Option<&str>) -> bool {
    input.map_or(false, |v| v.trim().eq_ignore_ascii_case("true"))
}

/// Numeric amount out of a display string like `$250k` or `1,000,000`.
/// Returns `None` when the string does not reduce to a single number.
pub fn parse_amount(input: Option<&str>) -> Option<f64> {
    let cleaned: String = input?
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let lower = cleaned.to_lowercase();
    let (number, multiplier) = if let Some(stripped) = lower.strip_suffix('k') {
        (stripped, 1_000.0)
    } else if let Some(stripped) = lower.strip_suffix('m') {
        (stripped, 1_000_000.0)
    } else {
        (lower.as_str(), 1.0)
    };
    number.parse::<f64>().ok().map(|v| v * multiplier)
}

/// Join the present parts with `" | "`; `None` when nothing is present.
pub fn join_description(parts: &[Option<&str>]) -> Option<String> {
    let present: Vec<&str> = parts
        .iter()
        .filter_map(|part| part.map(str::trim))
        .filter(|part| !part.is_empty())
        .collect();
    if present.is_empty() {
        None
    } else {
        Some(present.join(DESCRIPTION_SEPARATOR))
    }
}

/// Double embedded single quotes for literal SQL emission. Used only by the
/// statement-generation write path.
pub fn escape_sql(text: &str) -> String {
    text.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerator_outranks_grant() {
        assert_eq!(
            map_opportunity_type(Some("Accelerator + Grant")),
            OpportunityType::Accelerator
        );
    }

    #[test]
    fn type_mapping_covers_each_variant() {
        assert_eq!(map_opportunity_type(Some("State Grant")), OpportunityType::Grant);
        assert_eq!(
            map_opportunity_type(Some("Pitch Competition")),
            OpportunityType::Competition
        );
        assert_eq!(
            map_opportunity_type(Some("Cloud credits")),
            OpportunityType::Credits
        );
        assert_eq!(
            map_opportunity_type(Some("Research Fellowship")),
            OpportunityType::Fellowship
        );
        assert_eq!(map_opportunity_type(Some("Early-stage VC")), OpportunityType::Vc);
        assert_eq!(map_opportunity_type(Some("Venture fund")), OpportunityType::Vc);
        assert_eq!(map_opportunity_type(Some("Seed, Series A")), OpportunityType::Vc);
    }

    #[test]
    fn unknown_and_absent_labels_default_to_grant() {
        assert_eq!(map_opportunity_type(Some("mystery")), OpportunityType::Grant);
        assert_eq!(map_opportunity_type(None), OpportunityType::Grant);
    }

    #[test]
    fn list_splitting_handles_commas_and_slashes() {
        assert_eq!(
            split_list(Some("Health, Climate / Fintech,, ")),
            vec!["Health", "Climate", "Fintech"]
        );
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn sentinel_phrases_resolve_to_no_deadline() {
        assert_eq!(parse_deadline(Some("Rolling applications")), None);
        assert_eq!(parse_deadline(Some("Quarterly")), None);
        assert_eq!(parse_deadline(Some("Check website")), None);
        assert_eq!(parse_deadline(Some("TBD")), None);
        assert_eq!(parse_deadline(Some("")), None);
        assert_eq!(parse_deadline(None), None);
    }

    #[test]
    fn month_day_year_parses_to_iso_date() {
        assert_eq!(
            parse_deadline(Some("January 1, 2026")),
            NaiveDate::from_ymd_opt(2026, 1, 1)
        );
        assert_eq!(
            parse_deadline(Some("Applications close Mar 15 2026")),
            NaiveDate::from_ymd_opt(2026, 3, 15)
        );
    }

    #[test]
    fn month_without_day_is_absent_not_an_error() {
        assert_eq!(parse_deadline(Some("Deadline: March 2026")), None);
        assert_eq!(parse_deadline(Some("February 30, 2026")), None);
    }

    #[test]
    fn flag_parsing_is_exact_true_only() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("TRUE")));
        assert!(!parse_flag(Some("yes")));
        assert!(!parse_flag(Some("1")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn amounts_strip_currency_noise_and_scale_suffixes() {
        assert_eq!(parse_amount(Some("$250k")), Some(250_000.0));
        assert_eq!(parse_amount(Some("1,000,000")), Some(1_000_000.0));
        assert_eq!(parse_amount(Some("$1.5M")), Some(1_500_000.0));
        assert_eq!(parse_amount(Some("up to $50k")), None);
        assert_eq!(parse_amount(None), None);
    }

    #[test]
    fn description_joins_present_parts_only() {
        assert_eq!(
            join_description(&[Some("Chicago startups"), None, Some("$50k"), Some("")]),
            Some("Chicago startups | $50k".to_string())
        );
        assert_eq!(join_description(&[None, None]), None);
    }

    #[test]
    fn sql_escaping_doubles_single_quotes() {
        assert_eq!(escape_sql("O'Hare fund"), "O''Hare fund");
        assert_eq!(escape_sql("plain"), "plain");
    }
}
