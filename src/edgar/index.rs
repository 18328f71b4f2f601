use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use log::debug;
use std::collections::HashMap;

use super::parsing::{parse_table_row, TokenCursor};
use super::types::FilingType;

/// Older filings predate the interactive-data viewer, so anything before
/// this year cannot be extracted and is dropped during discovery.
pub const THRESHOLD_YEAR: i32 = 2010;

/// Walk the browse-query results page and map filing date → detail link.
///
/// Rows are the query table's five columns: form type, detail link, act,
/// filing date, file number. Only rows whose type cell matches the requested
/// filing exactly are kept — `10-K/A` amendments render as their own type
/// string and fall out of the comparison. The link cell resolves through the
/// interactive-data button, so the stored value is the viewer href.
pub fn parse_query_page(
    page: &str,
    filing_type: FilingType,
) -> Result<HashMap<String, String>> {
    let wanted = filing_type.to_string();
    let mut filings = HashMap::new();
    let mut cursor = TokenCursor::new(page);

    while let Some(cells) = parse_table_row(&mut cursor, true)? {
        if cells.len() != 5 || cells[0] != wanted {
            continue;
        }
        let date = &cells[3];
        match filing_year(date) {
            Some(year) if year >= THRESHOLD_YEAR => {
                filings.insert(date.clone(), cells[1].clone());
            }
            Some(year) => {
                debug!("dropping {} filing from {}: before interactive data", wanted, year);
            }
            None => {
                debug!("dropping {} row with unparseable date {:?}", wanted, date);
            }
        }
    }
    Ok(filings)
}

fn filing_year(date: &str) -> Option<i32> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_row(form: &str, date: &str) -> String {
        format!(
            "<tr>\
             <td>{}</td>\
             <td><a id=\"interactiveDataBtn\" href=\"/cgi-bin/viewer?action=view&amp;cik=320193\">Interactive Data</a></td>\
             <td>34</td>\
             <td>{}</td>\
             <td>001-36743</td>\
             </tr>",
            form, date
        )
    }

    #[test]
    fn test_keeps_matching_recent_filings() {
        let page = format!("<table>{}</table>", query_row("10-Q", "2015-07-22"));
        let filings = parse_query_page(&page, FilingType::Quarterly).unwrap();
        assert_eq!(
            filings.get("2015-07-22").map(String::as_str),
            Some("/cgi-bin/viewer?action=view&cik=320193")
        );
    }

    #[test]
    fn test_drops_filings_before_threshold_year() {
        let page = format!(
            "<table>{}{}</table>",
            query_row("10-Q", "2008-01-01"),
            query_row("10-Q", "2015-07-22")
        );
        let filings = parse_query_page(&page, FilingType::Quarterly).unwrap();
        assert!(!filings.contains_key("2008-01-01"));
        assert!(filings.contains_key("2015-07-22"));
    }

    #[test]
    fn test_drops_other_forms_and_amendments() {
        let page = format!(
            "<table>{}{}{}</table>",
            query_row("10-K", "2015-10-28"),
            query_row("10-Q/A", "2015-07-22"),
            query_row("10-Q", "2015-04-28")
        );
        let filings = parse_query_page(&page, FilingType::Quarterly).unwrap();
        assert_eq!(filings.len(), 1);
        assert!(filings.contains_key("2015-04-28"));
    }

    #[test]
    fn test_rows_with_extra_cells_ignored() {
        let page = "<table><tr><td>10-Q</td><td>x</td></tr></table>";
        let filings = parse_query_page(page, FilingType::Quarterly).unwrap();
        assert!(filings.is_empty());
    }
}
