use anyhow::Result;
use log::debug;

use super::concepts::match_concept;
use super::scale::parse_statement_scale;
use super::table::parse_table_row;
use super::tokens::TokenCursor;
use crate::edgar::report::StatementData;
use crate::edgar::types::{Concept, FilingDocType};

/// Parse one statement document into its partial result.
///
/// The leading header row fixes the document's scale mapping once; every
/// following row is mapped through the concept table. Rows whose first cell
/// is not a recognized tag are skipped. For recognized rows, the remaining
/// columns are tried left to right and the first parseable number is stored
/// for that concept — later columns hold prior-period figures we do not
/// want.
pub fn parse_statement(page: &str, doc_type: FilingDocType) -> Result<StatementData> {
    let mut cursor = TokenCursor::new(page);
    let scales = parse_statement_scale(&mut cursor, doc_type)?;
    let mut statement = StatementData::new(doc_type, scales);

    // Link resolution stays on for data rows: the row label travels in a
    // defref onclick hook, and numeric cells opt out via their class.
    while let Some(cells) = parse_table_row(&mut cursor, true)? {
        let Some((label, values)) = cells.split_first() else {
            continue;
        };
        match match_concept(label) {
            Concept::Known(concept) => {
                for raw in values {
                    if let Some(value) = parse_numeric(raw) {
                        statement.record(concept, value);
                        break;
                    }
                }
            }
            Concept::Unrecognized(tag) => {
                debug!("{}: skipping unmapped row tag {:?}", doc_type, tag);
            }
        }
    }
    Ok(statement)
}

/// Parse a statement-page number: `$` signs and thousands separators are
/// dropped, parentheses mean negative. Footnote markers and other non-number
/// text must not parse, so anything beyond digits, one sign and a decimal
/// point is rejected rather than cleaned away.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let without_currency = raw.replace('$', " ");
    let trimmed = without_currency.trim();
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let body = body.replace(',', "");
    let body = body.trim();
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return None;
    }

    body.parse::<f64>()
        .ok()
        .map(|value| if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::types::FinDataType;

    #[test]
    fn test_parse_numeric_variants() {
        assert_eq!(parse_numeric("1,234"), Some(1234.0));
        assert_eq!(parse_numeric("$ 12,345,678"), Some(12_345_678.0));
        assert_eq!(parse_numeric("(456)"), Some(-456.0));
        assert_eq!(parse_numeric("$ (1,000.5)"), Some(-1000.5));
        assert_eq!(parse_numeric("0.57"), Some(0.57));
        assert_eq!(parse_numeric("—"), None);
        assert_eq!(parse_numeric("[1]"), None);
        assert_eq!(parse_numeric("Total assets"), None);
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn test_assets_row_scaled_by_thousands_header() {
        let page = "<table>\
            <tr><th>CONSOLIDATED BALANCE SHEETS - USD ($)</th><th>$ in Thousands</th></tr>\
            <tr><td>us-gaap:Assets</td><td class=\"nump\">1,234</td></tr>\
            </table>";
        let statement = parse_statement(page, FilingDocType::BalanceSheet).unwrap();
        assert_eq!(statement.get(FinDataType::TotalAssets), Some(1_234_000.0));
    }

    #[test]
    fn test_leftmost_parseable_column_wins() {
        let page = "<table>\
            <tr><th>$ in Thousands</th></tr>\
            <tr>\
            <td>us-gaap:NetIncomeLoss</td>\
            <td>[1]</td>\
            <td class=\"num\">(500)</td>\
            <td class=\"num\">900</td>\
            </tr>\
            </table>";
        let statement = parse_statement(page, FilingDocType::Income).unwrap();
        // "[1]" is a footnote marker, not a number; the first real value is
        // the parenthesized negative.
        assert_eq!(statement.get(FinDataType::NetIncome), Some(-500_000.0));
    }

    #[test]
    fn test_unmapped_rows_discarded() {
        let page = "<table>\
            <tr><th>$ in Millions</th></tr>\
            <tr><td>us-gaap:SomethingObscure</td><td class=\"nump\">7</td></tr>\
            <tr><td>us-gaap:Revenues</td><td class=\"nump\">3</td></tr>\
            </table>";
        let statement = parse_statement(page, FilingDocType::Income).unwrap();
        assert_eq!(statement.get(FinDataType::Revenue), Some(3_000_000.0));
        assert!(statement.get(FinDataType::NetIncome).is_none());
    }

    #[test]
    fn test_defref_row_label_resolved_through_anchor() {
        let page = "<table>\
            <tr><th>$ in Thousands</th></tr>\
            <tr>\
            <td class=\"pl\"><a href=\"#\" onclick=\"top.Show.showAR( this, 'defref_us-gaap_Liabilities', window );\">Total liabilities</a></td>\
            <td class=\"nump\">2,500</td>\
            </tr>\
            </table>";
        let statement = parse_statement(page, FilingDocType::BalanceSheet).unwrap();
        assert_eq!(
            statement.get(FinDataType::TotalLiabilities),
            Some(2_500_000.0)
        );
    }

    #[test]
    fn test_eps_not_scaled_by_currency_factor() {
        let page = "<table>\
            <tr><th>In Millions, except Per Share data</th></tr>\
            <tr><td>us-gaap:EarningsPerShareDiluted</td><td class=\"nump\">0.57</td></tr>\
            </table>";
        let statement = parse_statement(page, FilingDocType::Income).unwrap();
        assert_eq!(statement.get(FinDataType::EpsDiluted), Some(0.57));
    }

    #[test]
    fn test_header_without_scale_phrase_stores_raw_values() {
        let page = "<table>\
            <tr><th>CONDENSED BALANCE SHEETS</th></tr>\
            <tr><td>us-gaap:Assets</td><td class=\"nump\">42</td></tr>\
            </table>";
        let statement = parse_statement(page, FilingDocType::BalanceSheet).unwrap();
        assert_eq!(statement.get(FinDataType::TotalAssets), Some(42.0));
    }

    #[test]
    fn test_scale_entity_map_carried_on_statement() {
        let page = "<table>\
            <tr><th>shares in Thousands, $ in Millions</th></tr>\
            <tr><td>us-gaap:CommonStockSharesOutstanding</td><td class=\"nump\">800</td></tr>\
            </table>";
        let statement = parse_statement(page, FilingDocType::Income).unwrap();
        assert_eq!(
            statement.get(FinDataType::SharesOutstanding),
            Some(800_000.0)
        );
    }
}
