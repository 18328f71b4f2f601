pub mod edgar;

// Re-exports
pub use edgar::{
    DocumentFetcher, EdgarClient, FilingDocType, FilingType, FinDataType, FinancialReport,
    ScaleEntity,
};
