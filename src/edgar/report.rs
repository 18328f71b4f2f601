use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{FilingDocType, FilingType, FinDataType, ScaleEntity};

/// Concepts a consolidated report must carry to be considered usable.
pub const REQUIRED_CONCEPTS: &[FinDataType] = &[
    FinDataType::Revenue,
    FinDataType::NetIncome,
    FinDataType::TotalAssets,
    FinDataType::TotalLiabilities,
    FinDataType::OperatingCashFlow,
];

/// Partial result produced by parsing one statement document.
///
/// Each concurrent fetch unit fills its own `StatementData`; nothing is
/// shared while tasks run. The orchestrator merges the partials
/// single-threaded after the join, so conflict resolution is deterministic
/// rather than last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementData {
    pub doc_type: FilingDocType,
    values: HashMap<FinDataType, f64>,
    scales: HashMap<ScaleEntity, f64>,
}

impl StatementData {
    pub fn new(doc_type: FilingDocType, scales: HashMap<ScaleEntity, f64>) -> Self {
        StatementData {
            doc_type,
            values: HashMap::new(),
            scales,
        }
    }

    /// Store a raw parsed number, scaled by the document's factor for the
    /// concept's unit category. The first value recorded for a concept wins;
    /// later rows repeating the tag are ignored. Returns whether the value
    /// was stored.
    pub fn record(&mut self, concept: FinDataType, raw_value: f64) -> bool {
        let scaled = raw_value * self.scale_factor(concept.scale_entity());
        match self.values.entry(concept) {
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(scaled);
                true
            }
            std::collections::hash_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, concept: FinDataType) -> Option<f64> {
        self.values.get(&concept).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn scale_factor(&self, entity: ScaleEntity) -> f64 {
        self.scales.get(&entity).copied().unwrap_or(1.0)
    }
}

/// The consolidated result of one fetch-and-merge run: normalized values per
/// canonical concept plus the unit multipliers that were applied to them.
/// Values are stored fully scaled; raw statement-page numbers never appear
/// here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialReport {
    pub filing_type: FilingType,
    pub data: HashMap<FinDataType, f64>,
    pub scales: HashMap<ScaleEntity, f64>,
}

impl FinancialReport {
    pub fn new(filing_type: FilingType) -> Self {
        FinancialReport {
            filing_type,
            data: HashMap::new(),
            scales: HashMap::new(),
        }
    }

    /// Fold one document's partial into the report. First writer wins per
    /// concept and per scale entity; callers control determinism by merging
    /// partials in [`FilingDocType`] priority order.
    pub fn merge(&mut self, statement: StatementData) {
        for (concept, value) in statement.values {
            self.data.entry(concept).or_insert(value);
        }
        for (entity, factor) in statement.scales {
            self.scales.entry(entity).or_insert(factor);
        }
    }

    pub fn get(&self, concept: FinDataType) -> Option<f64> {
        self.data.get(&concept).copied()
    }

    /// A report is complete once every required concept is populated.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&FinDataType> = REQUIRED_CONCEPTS
            .iter()
            .filter(|concept| !self.data.contains_key(concept))
            .collect();
        if !missing.is_empty() {
            bail!(
                "financial report incomplete: missing {:?} ({} concepts populated)",
                missing,
                self.data.len()
            );
        }
        Ok(())
    }
}

/// Merge per-document partials into one report, deterministically.
///
/// Partials are ordered by document-type priority before the first-wins
/// fold, so the outcome does not depend on the order the fetch tasks
/// happened to finish in.
pub fn merge_statements(
    filing_type: FilingType,
    mut statements: Vec<StatementData>,
) -> FinancialReport {
    statements.sort_by_key(|statement| statement.doc_type);
    let mut report = FinancialReport::new(filing_type);
    for statement in statements {
        report.merge(statement);
    }
    report
}
