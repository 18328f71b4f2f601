use anyhow::{anyhow, Result};
use edgar_reports::edgar::{self, EdgarClient, FilingType};
use std::sync::Arc;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "edgar-report",
    about = "Extract a company's financial report from SEC EDGAR"
)]
struct Opt {
    /// Ticker symbol to look up (e.g. AAPL)
    ticker: String,

    /// Filing type to extract: 10-K or 10-Q
    #[structopt(long, default_value = "10-K")]
    filing_type: FilingTypeArg,
}

#[derive(Debug)]
struct FilingTypeArg(FilingType);

impl std::str::FromStr for FilingTypeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(FilingTypeArg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::from_args();
    let filing_type = opt.filing_type.0;

    let client = Arc::new(EdgarClient::from_env()?);

    let cik = edgar::get_company_cik(&client, &opt.ticker).await?;
    println!("{} -> CIK {}", opt.ticker, cik);

    let filings = edgar::get_filing_links(&client, &opt.ticker, filing_type).await?;
    let (date, link) = filings
        .iter()
        .max_by(|a, b| a.0.cmp(b.0))
        .ok_or_else(|| anyhow!("no {} filings with interactive data for {}", filing_type, opt.ticker))?;
    println!("latest {} filed {}", filing_type, date);

    let report = edgar::get_financial_data(Arc::clone(&client), link, filing_type).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
