pub mod client;
pub mod index;
pub mod parsing;
pub mod report;
pub mod tickers;
pub mod types;

use anyhow::{anyhow, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

pub use client::{DocumentFetcher, EdgarClient, EDGAR_BASE_URL};
pub use report::{merge_statements, FinancialReport, StatementData};
pub use types::{Concept, FilingDocType, FilingType, FinDataType, ScaleEntity};

use parsing::{parse_filing_page, parse_statement};

/// Resolve a ticker symbol to the filer's CIK via the company feed.
pub async fn get_company_cik(client: &EdgarClient, ticker: &str) -> Result<String> {
    let url = client.cik_feed_url(ticker)?;
    let feed = client.fetch_document(&url).await?;
    let cik = tickers::parse_cik_feed(&feed)
        .map_err(|e| anyhow!("could not resolve CIK for {}: {}", ticker, e))?;
    info!("{} resolves to CIK {}", ticker, cik);
    Ok(cik)
}

/// List a company's filings of one type: filing date → viewer link.
pub async fn get_filing_links(
    client: &EdgarClient,
    ticker: &str,
    filing_type: FilingType,
) -> Result<HashMap<String, String>> {
    let url = client.query_url(ticker, &filing_type.to_string())?;
    let page = client.fetch_document(&url).await?;
    let filings = index::parse_query_page(&page, filing_type)?;
    info!(
        "{}: {} {} filings with interactive data",
        ticker,
        filings.len(),
        filing_type
    );
    Ok(filings)
}

/// Discover the statement documents of one filing from its detail page.
/// Manifest filenames are resolved against the page's own URL, so the
/// returned map holds absolute document URLs.
pub async fn get_filing_docs(
    client: &EdgarClient,
    filing_link: &str,
) -> Result<HashMap<FilingDocType, Url>> {
    let page_url = client.resolve(filing_link)?;
    let page = client.fetch_document(&page_url).await?;
    let manifest = parse_filing_page(&page)?;

    let mut docs = HashMap::new();
    for (doc_type, filename) in manifest {
        docs.insert(doc_type, page_url.join(&filename)?);
    }
    Ok(docs)
}

/// Fetch every statement document of a filing concurrently and assemble the
/// consolidated report.
///
/// One task per document; each task produces a private [`StatementData`] and
/// shares nothing while running. A fetch or parse failure costs only that
/// document's contribution. After the join the partials are merged in
/// document-type priority order (first writer wins per concept), then the
/// report is validated for the required concept set.
pub async fn assemble_report(
    fetcher: Arc<dyn DocumentFetcher>,
    docs: HashMap<FilingDocType, Url>,
    filing_type: FilingType,
) -> Result<FinancialReport> {
    let mut handles = Vec::with_capacity(docs.len());
    for (doc_type, url) in docs {
        let fetcher = Arc::clone(&fetcher);
        handles.push(tokio::spawn(async move {
            let body = match fetcher.fetch_document(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("{} document skipped: {}", doc_type, e);
                    return None;
                }
            };
            match parse_statement(&body, doc_type) {
                Ok(statement) if !statement.is_empty() => Some(statement),
                Ok(_) => {
                    warn!("{} document yielded no recognized rows", doc_type);
                    None
                }
                Err(e) => {
                    warn!("{} document unparseable: {}", doc_type, e);
                    None
                }
            }
        }));
    }

    let mut statements = Vec::with_capacity(handles.len());
    for joined in futures::future::join_all(handles).await {
        if let Some(statement) = joined? {
            statements.push(statement);
        }
    }

    let report = merge_statements(filing_type, statements);
    report.validate()?;
    Ok(report)
}

/// Full extraction for one filing: discover its statement documents, then
/// fetch and merge them into the consolidated report.
pub async fn get_financial_data(
    client: Arc<EdgarClient>,
    filing_link: &str,
    filing_type: FilingType,
) -> Result<FinancialReport> {
    let docs = get_filing_docs(&client, filing_link).await?;
    if docs.is_empty() {
        return Err(anyhow!(
            "filing at {} lists no recognizable statements",
            filing_link
        ));
    }
    assemble_report(client, docs, filing_type).await
}
