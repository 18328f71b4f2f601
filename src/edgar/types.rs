use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use strum::{EnumIter, IntoEnumIterator};

/// Filing categories the extractor knows how to query for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(try_from = "String")]
pub enum FilingType {
    Annual,
    Quarterly,
}

impl TryFrom<String> for FilingType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        FilingType::from_str(&s)
    }
}

impl fmt::Display for FilingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilingType::Annual => write!(f, "10-K"),
            FilingType::Quarterly => write!(f, "10-Q"),
        }
    }
}

static FILING_TYPES: Lazy<String> = Lazy::new(|| {
    FilingType::iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
});

impl FilingType {
    pub fn list_types() -> &'static str {
        &FILING_TYPES
    }
}

impl FromStr for FilingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "10-K" => Ok(FilingType::Annual),
            "10-Q" => Ok(FilingType::Quarterly),
            other => Err(format!(
                "unsupported filing type {} (expected one of: {})",
                other,
                FilingType::list_types()
            )),
        }
    }
}

/// Statement documents inside one filing, as labeled by the report accordion.
///
/// Declaration order doubles as the merge priority: when two documents claim
/// the same concept, the one whose type comes first here wins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
pub enum FilingDocType {
    Operations,
    Income,
    BalanceSheet,
    CashFlow,
    EntityInfo,
}

impl fmt::Display for FilingDocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilingDocType::Operations => write!(f, "Statement of Operations"),
            FilingDocType::Income => write!(f, "Income Statement"),
            FilingDocType::BalanceSheet => write!(f, "Balance Sheet"),
            FilingDocType::CashFlow => write!(f, "Cash Flow Statement"),
            FilingDocType::EntityInfo => write!(f, "Entity Information"),
        }
    }
}

/// Canonical financial concepts a statement row can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum FinDataType {
    Revenue,
    CostOfRevenue,
    GrossProfit,
    OperatingExpenses,
    OperatingIncome,
    NetIncome,
    EpsBasic,
    EpsDiluted,
    SharesOutstanding,
    SharesOutstandingDiluted,
    TotalAssets,
    CurrentAssets,
    CashAndEquivalents,
    TotalLiabilities,
    CurrentLiabilities,
    LongTermDebt,
    StockholdersEquity,
    OperatingCashFlow,
    CapitalExpenditures,
    DividendsPaid,
}

impl FinDataType {
    /// Which unit category the concept's numbers are denominated in. The
    /// statement assembler uses this to pick the scale factor to apply.
    pub fn scale_entity(&self) -> ScaleEntity {
        match self {
            FinDataType::EpsBasic | FinDataType::EpsDiluted => ScaleEntity::PerShare,
            FinDataType::SharesOutstanding | FinDataType::SharesOutstandingDiluted => {
                ScaleEntity::Shares
            }
            _ => ScaleEntity::Currency,
        }
    }
}

/// Unit categories a statement header can scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleEntity {
    Currency,
    Shares,
    PerShare,
}

/// Result of mapping a raw row tag. Unrecognized tags keep the raw string so
/// callers can log or audit them before discarding the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Concept {
    Known(FinDataType),
    Unrecognized(String),
}
