use anyhow::{anyhow, Result};
use log::debug;

/// Decode the company feed (`browse-edgar&output=xml`) into the filer's CIK.
///
/// The feed nests the id under `company-info`; we only need that one field,
/// so the document is parsed as a tree and the first `cik` element wins. A
/// feed that does not decode, or decodes without a CIK, is an error for the
/// caller to handle — there is no retry here.
pub fn parse_cik_feed(feed: &str) -> Result<String> {
    let document = roxmltree::Document::parse(feed)
        .map_err(|e| anyhow!("could not decode company feed: {}", e))?;

    let cik = document
        .descendants()
        .find(|node| node.has_tag_name("cik"))
        .and_then(|node| node.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| anyhow!("company feed carries no CIK"))?;

    debug!("resolved CIK {}", cik);
    Ok(cik.to_string())
}
