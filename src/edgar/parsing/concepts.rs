use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::edgar::types::{Concept, FinDataType};

/// XBRL tag → canonical concept. Alternate taggings that carry the same
/// meaning (e.g. the post-ASC-606 revenue tag) map to the same concept.
static CONCEPT_MAP: Lazy<HashMap<&'static str, FinDataType>> = Lazy::new(|| {
    HashMap::from([
        // Income statement
        ("us-gaap:Revenues", FinDataType::Revenue),
        ("us-gaap:SalesRevenueNet", FinDataType::Revenue),
        (
            "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax",
            FinDataType::Revenue,
        ),
        ("us-gaap:CostOfRevenue", FinDataType::CostOfRevenue),
        ("us-gaap:CostOfGoodsAndServicesSold", FinDataType::CostOfRevenue),
        ("us-gaap:GrossProfit", FinDataType::GrossProfit),
        ("us-gaap:OperatingExpenses", FinDataType::OperatingExpenses),
        ("us-gaap:OperatingIncomeLoss", FinDataType::OperatingIncome),
        ("us-gaap:NetIncomeLoss", FinDataType::NetIncome),
        (
            "us-gaap:NetIncomeLossAvailableToCommonStockholdersBasic",
            FinDataType::NetIncome,
        ),
        ("us-gaap:EarningsPerShareBasic", FinDataType::EpsBasic),
        ("us-gaap:EarningsPerShareDiluted", FinDataType::EpsDiluted),
        // Share counts
        (
            "us-gaap:CommonStockSharesOutstanding",
            FinDataType::SharesOutstanding,
        ),
        (
            "us-gaap:WeightedAverageNumberOfSharesOutstandingBasic",
            FinDataType::SharesOutstanding,
        ),
        (
            "us-gaap:WeightedAverageNumberOfDilutedSharesOutstanding",
            FinDataType::SharesOutstandingDiluted,
        ),
        (
            "dei:EntityCommonStockSharesOutstanding",
            FinDataType::SharesOutstanding,
        ),
        // Balance sheet
        ("us-gaap:Assets", FinDataType::TotalAssets),
        ("us-gaap:AssetsCurrent", FinDataType::CurrentAssets),
        (
            "us-gaap:CashAndCashEquivalentsAtCarryingValue",
            FinDataType::CashAndEquivalents,
        ),
        ("us-gaap:Liabilities", FinDataType::TotalLiabilities),
        ("us-gaap:LiabilitiesCurrent", FinDataType::CurrentLiabilities),
        ("us-gaap:LongTermDebt", FinDataType::LongTermDebt),
        ("us-gaap:LongTermDebtNoncurrent", FinDataType::LongTermDebt),
        ("us-gaap:StockholdersEquity", FinDataType::StockholdersEquity),
        (
            "us-gaap:StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
            FinDataType::StockholdersEquity,
        ),
        // Cash flow
        (
            "us-gaap:NetCashProvidedByUsedInOperatingActivities",
            FinDataType::OperatingCashFlow,
        ),
        (
            "us-gaap:NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
            FinDataType::OperatingCashFlow,
        ),
        (
            "us-gaap:PaymentsToAcquirePropertyPlantAndEquipment",
            FinDataType::CapitalExpenditures,
        ),
        ("us-gaap:PaymentsOfDividends", FinDataType::DividendsPaid),
        (
            "us-gaap:PaymentsOfDividendsCommonStock",
            FinDataType::DividendsPaid,
        ),
    ])
});

/// Map a raw row tag to a canonical concept.
///
/// Pure and total: every input yields either `Known` or `Unrecognized` with
/// the raw string preserved. Tags arriving through the `defref_` onclick hook
/// (`defref_us-gaap_Assets`) are normalized to the `us-gaap:Assets` spelling
/// before lookup.
pub fn match_concept(raw_tag: &str) -> Concept {
    let normalized = normalize_tag(raw_tag);
    match CONCEPT_MAP.get(normalized.as_ref()) {
        Some(fin_type) => Concept::Known(*fin_type),
        None => Concept::Unrecognized(raw_tag.to_string()),
    }
}

fn normalize_tag(raw: &str) -> std::borrow::Cow<'_, str> {
    let tag = raw.trim().strip_prefix("defref_").unwrap_or_else(|| raw.trim());
    if tag.contains(':') {
        return std::borrow::Cow::Borrowed(tag);
    }
    // onclick hooks spell the namespace separator as '_'
    for prefix in ["us-gaap", "dei"] {
        if let Some(rest) = tag.strip_prefix(prefix).and_then(|t| t.strip_prefix('_')) {
            return std::borrow::Cow::Owned(format!("{}:{}", prefix, rest));
        }
    }
    std::borrow::Cow::Borrowed(tag)
}
