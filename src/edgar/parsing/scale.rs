use anyhow::Result;
use std::collections::HashMap;

use super::table::parse_table_heading;
use super::tokens::TokenCursor;
use crate::edgar::types::{FilingDocType, ScaleEntity};

/// Derive the unit multipliers a statement header declares.
///
/// EDGAR renders headers like `"shares in Thousands, $ in Millions"` or
/// `"In Millions, except Share data"`. Each comma-separated segment that
/// names a magnitude is attributed to an entity: `$`/`usd` → currency,
/// `share` → share counts (`per share` → per-share amounts), and a bare
/// `"in millions"` defaults to currency. Segments without a magnitude (the
/// `"except per share data"` qualifier) contribute nothing, which leaves the
/// implicit factor of 1. Entity-information pages carry no scale at all.
pub fn filing_scale(
    headings: &[String],
    doc_type: FilingDocType,
) -> HashMap<ScaleEntity, f64> {
    let mut scales = HashMap::new();
    if doc_type == FilingDocType::EntityInfo {
        return scales;
    }

    for heading in headings {
        for segment in heading.split(',') {
            let segment = segment.to_lowercase();
            let Some(factor) = magnitude(&segment) else {
                continue;
            };
            let entity = if segment.contains("per share") {
                ScaleEntity::PerShare
            } else if segment.contains("share") {
                ScaleEntity::Shares
            } else {
                // "$ in Thousands" and the bare "In Thousands" both scale
                // currency amounts
                ScaleEntity::Currency
            };
            scales.entry(entity).or_insert(factor);
        }
    }
    scales
}

/// Consume the statement's leading header row and fix its scale mapping.
/// A document with no heading row at all yields an empty mapping.
pub fn parse_statement_scale(
    cursor: &mut TokenCursor<'_>,
    doc_type: FilingDocType,
) -> Result<HashMap<ScaleEntity, f64>> {
    match parse_table_heading(cursor)? {
        Some(headings) if !headings.is_empty() => Ok(filing_scale(&headings, doc_type)),
        _ => Ok(HashMap::new()),
    }
}

fn magnitude(segment: &str) -> Option<f64> {
    if segment.contains("thousand") {
        Some(1e3)
    } else if segment.contains("million") {
        Some(1e6)
    } else if segment.contains("billion") {
        Some(1e9)
    } else {
        None
    }
}
