//! Quote-aware tabular reader.
//!
//! Parses delimited text into [`RawRecord`]s lazily, one physical record per
//! `next()`. Quote state is tracked across the whole character stream, so a
//! quoted field may contain commas, escaped quotes (`""`) and embedded
//! newlines. Spreadsheet sheets arrive here as already-exported CSV text.

use std::iter::Peekable;
use std::str::Chars;

use cfod_core::RawRecord;

/// Lazy, finite, non-restartable iterator of source rows.
///
/// The first non-blank line is the header; its tokens become the field
/// labels of every subsequent record. Row-length policy is lenient: a row
/// exactly one column short is padded with a trailing null (source exports
/// are observed to truncate trailing empty columns), trailing empty fields
/// beyond the header width are discarded, and anything else mismatched is
/// dropped.
pub struct RecordReader<'a> {
    chars: Peekable<Chars<'a>>,
    header: Vec<String>,
    dropped_rows: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut chars = text.chars().peekable();
        let header = loop {
            match next_row(&mut chars) {
                Some(row) if is_blank(&row) => continue,
                Some(row) => break row.iter().map(|f| f.trim().to_string()).collect(),
                None => break Vec::new(),
            }
        };
        Self {
            chars,
            header,
            dropped_rows: 0,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Rows discarded so far under the row-length policy.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }
}

impl Iterator for RecordReader<'_> {
    type Item = RawRecord;

    fn next(&mut self) -> Option<RawRecord> {
        if self.header.is_empty() {
            return None;
        }
        loop {
            let row = next_row(&mut self.chars)?;
            if is_blank(&row) {
                continue;
            }

            let mut values: Vec<Option<String>> = row.into_iter().map(clean_field).collect();
            while values.len() > self.header.len() && values.last().map_or(false, Option::is_none)
            {
                values.pop();
            }
            if values.len() + 1 == self.header.len() {
                values.push(None);
            }
            if values.len() != self.header.len() {
                self.dropped_rows += 1;
                continue;
            }

            return Some(RawRecord::new(
                self.header.iter().cloned().zip(values).collect(),
            ));
        }
    }
}

/// One physical record off the stream, respecting quote state. Returns
/// `None` only at end of input. An unterminated quote flushes whatever was
/// accumulated rather than erroring.
fn next_row(chars: &mut Peekable<Chars<'_>>) -> Option<Vec<String>> {
    chars.peek()?;

    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => row.push(std::mem::take(&mut field)),
            '\r' | '\n' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(field);
                return Some(row);
            }
            _ => field.push(ch),
        }
    }

    row.push(field);
    Some(row)
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|f| f.trim().is_empty())
}

fn clean_field(field: String) -> Option<String> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Vec<RawRecord> {
        RecordReader::new(text).collect()
    }

    #[test]
    fn quoted_commas_and_escaped_quotes_stay_in_one_field() {
        let records = collect("name,note\n\"Acme, Inc.\",\"Says \"\"hi\"\"\",");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some("Acme, Inc."));
        assert_eq!(records[0].get("note"), Some("Says \"hi\""));
    }

    #[test]
    fn embedded_newline_inside_quotes_is_literal() {
        let records = collect("name,note\nAcme,\"line one\nline two\"\nBeta,ok\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("note"), Some("line one\nline two"));
        assert_eq!(records[1].get("name"), Some("Beta"));
    }

    #[test]
    fn one_missing_trailing_column_is_padded_with_null() {
        let records = collect("name,type,notes\nAcme,Grant\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some("Acme"));
        assert_eq!(records[0].get("notes"), None);
    }

    #[test]
    fn badly_short_and_long_rows_are_dropped() {
        let mut reader = RecordReader::new("name,type,notes\nAcme\nBeta,Grant,good,extra,stuff\nGamma,Grant,fine\n");
        let records: Vec<_> = reader.by_ref().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some("Gamma"));
        assert_eq!(reader.dropped_rows(), 2);
    }

    #[test]
    fn values_are_trimmed_and_empty_becomes_null() {
        let records = collect("name,notes\n  Acme  ,   \n");
        assert_eq!(records[0].get("name"), Some("Acme"));
        assert_eq!(records[0].get("notes"), None);
    }

    #[test]
    fn blank_lines_before_header_and_between_rows_are_skipped() {
        let records = collect("\n\nname,notes\n\nAcme,hi\n\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some("Acme"));
    }

    #[test]
    fn empty_and_header_only_inputs_yield_no_records() {
        assert!(collect("").is_empty());
        assert!(collect("name,notes\n").is_empty());
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let records = collect("name,notes\r\nAcme,hi\r\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("notes"), Some("hi"));
    }
}
