//! SQL-emission write path: renders the batches as literal `INSERT`
//! statements on stdout instead of calling the store. Dry-run/audit mode;
//! the operator reviews and executes the statements by hand.

use std::io::{self, Write};

use cfod_adapters::normalize::escape_sql;
use cfod_core::FundingOpportunity;

const COLUMNS: &str = "name, opportunity_type, description, sectors, stage, deadline, website, \
                       application_url, featured, check_size_min, check_size_max, chicago_focused";

/// One multi-row `INSERT` statement for a batch. `None` for an empty batch.
pub fn render_insert_statement(table: &str, rows: &[FundingOpportunity]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let values: Vec<String> = rows.iter().map(render_row).collect();
    Some(format!(
        "INSERT INTO {table} ({COLUMNS}) VALUES\n  {};",
        values.join(",\n  ")
    ))
}

/// Write one statement per batch to `out`.
pub fn emit_batches(
    out: &mut impl Write,
    table: &str,
    rows: &[FundingOpportunity],
    batch_size: usize,
) -> io::Result<usize> {
    let mut emitted = 0usize;
    for batch in rows.chunks(batch_size.max(1)) {
        if let Some(statement) = render_insert_statement(table, batch) {
            writeln!(out, "{statement}")?;
            emitted += 1;
        }
    }
    Ok(emitted)
}

fn render_row(opp: &FundingOpportunity) -> String {
    format!(
        "({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {})",
        sql_text(&opp.name),
        sql_text(opp.opportunity_type.as_str()),
        sql_opt_text(opp.description.as_deref()),
        sql_array(&opp.sectors),
        sql_array(&opp.stage),
        sql_opt_text(opp.deadline.map(|d| d.to_string()).as_deref()),
        sql_opt_text(opp.website.as_deref()),
        sql_opt_text(opp.application_url.as_deref()),
        sql_bool(opp.featured),
        sql_opt_number(opp.check_size_min),
        sql_opt_number(opp.check_size_max),
        sql_bool(opp.chicago_focused),
    )
}

fn sql_text(value: &str) -> String {
    format!("'{}'", escape_sql(value))
}

fn sql_opt_text(value: Option<&str>) -> String {
    match value {
        Some(value) => sql_text(value),
        None => "NULL".to_string(),
    }
}

fn sql_array(values: &[String]) -> String {
    if values.is_empty() {
        return "'{}'".to_string();
    }
    let items: Vec<String> = values.iter().map(|v| sql_text(v)).collect();
    format!("ARRAY[{}]", items.join(", "))
}

fn sql_bool(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

fn sql_opt_number(value: Option<f64>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "NULL".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfod_core::OpportunityType;
    use chrono::NaiveDate;

    fn sample() -> FundingOpportunity {
        let mut opp = FundingOpportunity::new("O'Hare Innovation Grant", OpportunityType::Grant);
        opp.description = Some("It's competitive".to_string());
        opp.sectors = vec!["Aviation".to_string(), "Logistics".to_string()];
        opp.deadline = NaiveDate::from_ymd_opt(2026, 1, 1);
        opp.check_size_max = Some(50_000.0);
        opp
    }

    #[test]
    fn statement_escapes_quotes_and_renders_arrays() {
        let statement = render_insert_statement("funding_opportunities", &[sample()]).unwrap();
        assert!(statement.starts_with("INSERT INTO funding_opportunities (name,"));
        assert!(statement.contains("'O''Hare Innovation Grant'"));
        assert!(statement.contains("'It''s competitive'"));
        assert!(statement.contains("ARRAY['Aviation', 'Logistics']"));
        assert!(statement.contains("'2026-01-01'"));
        assert!(statement.contains("50000"));
        assert!(statement.contains("'{}'"));
        assert!(statement.trim_end().ends_with(';'));
    }

    #[test]
    fn empty_batch_renders_nothing() {
        assert!(render_insert_statement("t", &[]).is_none());
    }

    #[test]
    fn emit_batches_writes_one_statement_per_batch() {
        let rows = vec![sample(), sample(), sample()];
        let mut out = Vec::new();
        let emitted = emit_batches(&mut out, "funding_opportunities", &rows, 2).unwrap();
        assert_eq!(emitted, 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("INSERT INTO").count(), 2);
    }
}
