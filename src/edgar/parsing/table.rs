use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use super::tokens::{Token, TokenCursor};

/// Anchor ids whose href is the payload we want, regardless of inner text.
/// The one known member is the button revealing a filing's interactive data.
const REQ_HYPERLINKS: &[&str] = &["interactiveDataBtn"];

/// Viewer hook embedded in filing-list anchors:
/// `/cgi-bin/viewer?action=view&cik=<d>&accession_number=<d>-<d>-<d>`.
static VIEWER_ONCLICK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"action=view&(?:amp;)?cik=(\d+)&(?:amp;)?accession_number=(\d+)-(\d+)-(\d+)")
        .expect("viewer onclick pattern")
});

/// Row-label hook in statement pages carrying the row's XBRL tag:
/// `top.Show.showAR( this, 'defref_us-gaap_Assets', window );`.
static DEFREF_ONCLICK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'(defref_[A-Za-z0-9_-]+)'").expect("defref onclick pattern"));

/// Collect the cells of the next table row.
///
/// Advances to the next `<tr>`, then gathers the resolved content of every
/// non-empty `<td>` until the row closes. Returns `Ok(None)` once the stream
/// has no further rows; a truncated row (end of stream before `</tr>`) also
/// reports `Ok(None)` rather than a partial row. Cells marked numeric via
/// `class="num"`/`class="nump"` are always read as text, overriding
/// `resolve_links` for that cell.
pub fn parse_table_row(
    cursor: &mut TokenCursor<'_>,
    resolve_links: bool,
) -> Result<Option<Vec<String>>> {
    loop {
        match cursor.next_token()? {
            Token::Start { ref name, .. } if name == "tr" => break,
            Token::Eof => return Ok(None),
            _ => {}
        }
    }

    let mut cells = Vec::new();
    loop {
        match cursor.next_token()? {
            Token::End(ref name) if name == "tr" => break,
            Token::Eof => return Ok(None),
            Token::Start { ref name, ref attrs } if name == "td" => {
                let numeric = attrs
                    .iter()
                    .any(|(k, v)| k == "class" && (v == "num" || v == "nump"));
                if let Some(content) = parse_cell(cursor, resolve_links && !numeric)? {
                    cells.push(content);
                }
            }
            _ => {}
        }
    }
    Ok(Some(cells))
}

/// Collect the `<th>` texts of the next row, flattened in document order.
/// Same row-boundary and exhaustion behavior as [`parse_table_row`].
pub fn parse_table_heading(cursor: &mut TokenCursor<'_>) -> Result<Option<Vec<String>>> {
    loop {
        match cursor.next_token()? {
            Token::Start { ref name, .. } if name == "tr" => break,
            Token::Eof => return Ok(None),
            _ => {}
        }
    }

    let mut headings = Vec::new();
    loop {
        match cursor.next_token()? {
            Token::End(ref name) if name == "tr" => break,
            Token::Eof => return Ok(None),
            Token::Start { ref name, .. } if name == "th" => {
                collect_title_texts(cursor, &mut headings)?;
            }
            _ => {}
        }
    }
    Ok(Some(headings))
}

/// First non-empty fragment wins; the rest of the cell is consumed so the
/// cursor lands past `</td>`.
fn parse_cell(cursor: &mut TokenCursor<'_>, resolve_links: bool) -> Result<Option<String>> {
    let mut content: Option<String> = None;
    loop {
        match cursor.next_token()? {
            Token::End(ref name) if name == "td" => break,
            Token::Eof => break,
            Token::Start { ref name, ref attrs } if name == "a" && resolve_links => {
                let resolved = resolve_anchor(cursor, attrs)?;
                if content.is_none() && !resolved.is_empty() {
                    content = Some(resolved);
                }
            }
            Token::Text(text) => {
                let text = text.trim();
                if content.is_none() && !text.is_empty() {
                    content = Some(text.to_string());
                }
            }
            _ => {}
        }
    }
    Ok(content)
}

/// Every non-empty text fragment inside one `<th>` cell, in order.
fn collect_title_texts(cursor: &mut TokenCursor<'_>, out: &mut Vec<String>) -> Result<()> {
    loop {
        match cursor.next_token()? {
            Token::End(ref name) if name == "th" => break,
            Token::Eof => break,
            Token::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    out.push(text.to_string());
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Resolve an anchor to the value its cell should report.
///
/// Tokens are always consumed through `</a>` first so the caller's cursor
/// stays row-aligned, then exactly one branch applies: a whitelisted id
/// returns the href verbatim; a recognized onclick hook returns its decoded
/// payload; anything else returns the trimmed inner text.
fn resolve_anchor(cursor: &mut TokenCursor<'_>, attrs: &[(String, String)]) -> Result<String> {
    let mut href = String::new();
    let mut id = String::new();
    let mut hook: Option<String> = None;
    for (key, value) in attrs {
        match key.as_str() {
            "href" => href = value.clone(),
            "id" => id = value.clone(),
            "onclick" => hook = decode_onclick_hook(value),
            _ => {}
        }
    }

    let mut text = String::new();
    loop {
        match cursor.next_token()? {
            Token::End(ref name) if name == "a" => break,
            Token::Eof => break,
            Token::Text(fragment) => {
                let fragment = fragment.trim();
                if text.is_empty() && !fragment.is_empty() {
                    text = fragment.to_string();
                }
            }
            _ => {}
        }
    }

    if REQ_HYPERLINKS.contains(&id.as_str()) {
        return Ok(href);
    }
    if let Some(payload) = hook {
        return Ok(payload);
    }
    Ok(text)
}

fn decode_onclick_hook(onclick: &str) -> Option<String> {
    if let Some(caps) = VIEWER_ONCLICK.captures(onclick) {
        return decode_viewer_hook(&caps);
    }
    DEFREF_ONCLICK
        .captures(onclick)
        .map(|caps| caps[1].to_string())
}

/// The viewer hook encodes the filer id and the accession number as four
/// integer groups; the accession is reassembled as the usual 18-digit
/// zero-padded string.
fn decode_viewer_hook(caps: &regex::Captures<'_>) -> Option<String> {
    let cik: u64 = caps[1].parse().ok()?;
    let filer: u64 = caps[2].parse().ok()?;
    let year: u64 = caps[3].parse().ok()?;
    let seq: u64 = caps[4].parse().ok()?;
    Some(format!("{}/{:010}{:02}{:06}", cik, filer, year, seq))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_rows(page: &str, resolve_links: bool) -> Vec<Vec<String>> {
        let mut cursor = TokenCursor::new(page);
        let mut rows = Vec::new();
        while let Some(cells) = parse_table_row(&mut cursor, resolve_links).unwrap() {
            rows.push(cells);
        }
        rows
    }

    #[test]
    fn test_drains_cells_in_column_order() {
        let page = "<table>\
            <tr><td>a</td><td>b</td><td>c</td></tr>\
            <tr><td>d</td><td>e</td></tr>\
            </table>";
        let rows = drain_rows(page, false);
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["d", "e"]]);
    }

    #[test]
    fn test_no_more_rows_exactly_once() {
        let mut cursor = TokenCursor::new("<tr><td>only</td></tr>");
        assert!(parse_table_row(&mut cursor, false).unwrap().is_some());
        assert!(parse_table_row(&mut cursor, false).unwrap().is_none());
        assert!(parse_table_row(&mut cursor, false).unwrap().is_none());
    }

    #[test]
    fn test_empty_cells_skipped_and_empty_row_ok() {
        let page = "<tr><td>  </td><td></td></tr><tr><td> x </td></tr>";
        let rows = drain_rows(page, false);
        assert_eq!(rows, vec![Vec::<String>::new(), vec!["x".to_string()]]);
    }

    #[test]
    fn test_truncated_row_reports_no_more_rows() {
        let mut cursor = TokenCursor::new("<tr><td>cut off");
        assert!(parse_table_row(&mut cursor, false).unwrap().is_none());
    }

    #[test]
    fn test_malformed_markup_is_not_conflated_with_exhaustion() {
        // Stream ends inside an open tag: a tokenizer error, not a clean
        // "no more rows".
        let mut cursor = TokenCursor::new("<tr><td>text</td><td");
        assert!(parse_table_row(&mut cursor, false).is_err());
    }

    #[test]
    fn test_numeric_cell_never_resolves_links() {
        let page = "<tr>\
            <td class=\"nump\"><a href=\"/x\">1,234</a></td>\
            <td><a href=\"/y\" id=\"interactiveDataBtn\">view</a></td>\
            </tr>";
        let rows = drain_rows(page, true);
        assert_eq!(rows, vec![vec!["1,234".to_string(), "/y".to_string()]]);
    }

    #[test]
    fn test_whitelisted_anchor_returns_href_verbatim() {
        let page = "<tr><td>\
            <a id=\"interactiveDataBtn\" href=\"/cgi-bin/viewer?action=view\">Interactive Data</a>\
            </td></tr>";
        let rows = drain_rows(page, true);
        assert_eq!(rows[0], vec!["/cgi-bin/viewer?action=view".to_string()]);
    }

    #[test]
    fn test_plain_anchor_returns_trimmed_inner_text() {
        let page = "<tr><td><a href=\"/ignored\">  Documents </a></td></tr>";
        let rows = drain_rows(page, true);
        assert_eq!(rows[0], vec!["Documents".to_string()]);
    }

    #[test]
    fn test_defref_hook_carries_row_tag() {
        let page = "<tr><td class=\"pl\">\
            <a href=\"#\" onclick=\"top.Show.showAR( this, 'defref_us-gaap_Assets', window );\">\
            Total assets</a></td><td class=\"nump\">99</td></tr>";
        let rows = drain_rows(page, true);
        assert_eq!(rows[0], vec!["defref_us-gaap_Assets".to_string(), "99".to_string()]);
    }

    #[test]
    fn test_viewer_hook_decodes_accession_number() {
        assert_eq!(
            decode_onclick_hook(
                "parent.loadViewer('/cgi-bin/viewer?action=view&cik=320193&accession_number=1193125-15-356351');"
            ),
            Some("320193/000119312515356351".to_string())
        );
    }

    #[test]
    fn test_links_ignored_when_resolution_off() {
        let page = "<tr><td><a href=\"/x\" id=\"interactiveDataBtn\">label</a></td></tr>";
        let rows = drain_rows(page, false);
        assert_eq!(rows[0], vec!["label".to_string()]);
    }

    #[test]
    fn test_heading_flattens_th_fragments() {
        let page = "<tr>\
            <th><div>Consolidated Balance Sheets</div><div>USD ($)</div></th>\
            <th>$ in Thousands</th>\
            </tr>";
        let mut cursor = TokenCursor::new(page);
        let headings = parse_table_heading(&mut cursor).unwrap().unwrap();
        assert_eq!(
            headings,
            vec!["Consolidated Balance Sheets", "USD ($)", "$ in Thousands"]
        );
        assert!(parse_table_heading(&mut cursor).unwrap().is_none());
    }
}
