use anyhow::{anyhow, bail, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::edgar::types::FilingDocType;

/// `var reports = new Array(64);` — fixes how many report slots the filing
/// viewer declares (the last slot is the "all reports" view, not a report).
static REPORT_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var reports\s*=\s*new Array\((\d+)\)").expect("report count pattern"));

/// `reports[1] = "R1.htm";`
static REPORT_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"reports\[\d+\]\s*=\s*"([^"]+)""#).expect("report entry pattern"));

/// Accordion entries labeling each report: `onclick="loadReport(2);">Label<`.
static ACCORDION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"loadReport\((\d+)\)[^>]*>([^<]+)<").expect("accordion label pattern")
});

/// Parse the filing detail page: the script-embedded report manifest plus the
/// accordion labels that say which statement each report file is.
///
/// Returns the statement documents this extractor cares about, keyed by
/// document type, with values as the manifest filenames (`R2.htm`). Labels
/// that classify to no known statement, and "parenthetical" breakout
/// variants, are skipped. A manifest entry with an unrecognized file
/// extension poisons the whole filing's discovery: no partial manifest is
/// produced.
pub fn parse_filing_page(page: &str) -> Result<HashMap<FilingDocType, String>> {
    let filenames = parse_report_manifest(page)?;

    let mut docs = HashMap::new();
    for caps in ACCORDION_LABEL.captures_iter(page) {
        let index: usize = caps[1]
            .parse()
            .map_err(|_| anyhow!("bad report index in accordion entry: {}", &caps[0]))?;
        let label = caps[2].trim();
        let Some(doc_type) = classify_label(label) else {
            debug!("skipping unclassified report label {:?}", label);
            continue;
        };
        // Report indices are 1-based
        let Some(filename) = index.checked_sub(1).and_then(|i| filenames.get(i)) else {
            debug!("accordion label {:?} points outside the manifest", label);
            continue;
        };
        docs.entry(doc_type).or_insert_with(|| filename.clone());
    }
    Ok(docs)
}

/// Extract the ordered report filenames from the embedded script block.
/// `.xml` entries (occasionally listed instead of the rendered page) are
/// normalized to `.htm`; anything else unrecognized is fatal.
pub fn parse_report_manifest(page: &str) -> Result<Vec<String>> {
    let mut lines = page.lines();
    let count: usize = loop {
        let line = lines
            .next()
            .ok_or_else(|| anyhow!("no report manifest found in filing page"))?;
        if let Some(caps) = REPORT_COUNT.captures(line) {
            break caps[1]
                .parse()
                .map_err(|_| anyhow!("bad report count in manifest: {}", &caps[0]))?;
        }
    };

    // count - 1 real reports; the final slot is the "all" view
    let wanted = count.saturating_sub(1);
    let mut filenames = Vec::with_capacity(wanted);
    for line in lines {
        if filenames.len() == wanted {
            break;
        }
        if let Some(caps) = REPORT_ENTRY.captures(line) {
            filenames.push(normalize_report_filename(&caps[1])?);
        }
    }
    if filenames.len() < wanted {
        bail!(
            "report manifest truncated: expected {} entries, found {}",
            wanted,
            filenames.len()
        );
    }
    Ok(filenames)
}

fn normalize_report_filename(name: &str) -> Result<String> {
    match name.rsplit_once('.') {
        Some((stem, "xml")) => Ok(format!("{}.htm", stem)),
        Some((_, "htm")) | Some((_, "html")) => Ok(name.to_string()),
        _ => bail!("unrecognized report format in manifest: {}", name),
    }
}

fn classify_label(label: &str) -> Option<FilingDocType> {
    let label = label.to_lowercase();
    if label.contains("parenthetical") {
        return None;
    }
    if label.contains("balance sheet") || label.contains("financial position") {
        Some(FilingDocType::BalanceSheet)
    } else if label.contains("cash flow") {
        Some(FilingDocType::CashFlow)
    } else if label.contains("operations") {
        Some(FilingDocType::Operations)
    } else if label.contains("income") || label.contains("earnings") {
        Some(FilingDocType::Income)
    } else if label.contains("entity information") || label.contains("document and entity") {
        Some(FilingDocType::EntityInfo)
    } else {
        None
    }
}
