//! Alpha Vantage quote and company overview client

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::ApiClient;
use crate::config::credential;
use crate::record::NewTicker;
use crate::{Error, Result};

const ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Environment variable holding the Alpha Vantage key
pub const API_KEY_VAR: &str = "ALPHAVANTAGE_API_KEY";

/// Latest trade data for a symbol; numbers stay as the API's text
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Quote {
    #[serde(rename = "01. symbol", default)]
    pub symbol: String,
    #[serde(rename = "02. open", default)]
    pub open: String,
    #[serde(rename = "03. high", default)]
    pub high: String,
    #[serde(rename = "04. low", default)]
    pub low: String,
    #[serde(rename = "05. price", default)]
    pub price: String,
    #[serde(rename = "08. previous close", default)]
    pub previous_close: String,
    #[serde(rename = "09. change", default)]
    pub change: String,
    #[serde(rename = "10. change percent", default)]
    pub change_percent: String,
}

/// Company overview as the flat key/value map the API returns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overview {
    fields: Map<String, Value>,
}

impl Overview {
    /// Field text, or "" when absent
    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Numeric field; the API reports missing numbers as "None"
    pub fn number(&self, key: &str) -> Option<f64> {
        self.field(key).trim().parse().ok()
    }

    /// Row to cache for a first-time lookup of `symbol` at `last_price`
    pub fn to_new_ticker(&self, symbol: &str, last_price: &str) -> NewTicker {
        NewTicker {
            symbol: symbol.to_string(),
            company_name: self.field("Name").to_string(),
            sector: self.field("Sector").to_string(),
            industry: self.field("Industry").to_string(),
            exchange: self.field("Exchange").to_string(),
            address: self.field("Address").to_string(),
            official_site: self.field("OfficialSite").to_string(),
            revenue_ttm: self.number("RevenueTTM"),
            market_cap: self.number("MarketCapitalization"),
            fiscal_year_end: self.field("FiscalYearEnd").to_string(),
            last_price: last_price.to_string(),
        }
    }
}

/// Quote and overview lookups by ticker symbol
pub trait QuoteService {
    fn global_quote(&self, symbol: &str) -> Result<Quote>;

    fn overview(&self, symbol: &str) -> Result<Overview>;
}

/// Alpha Vantage API client
///
/// The key is read from [`API_KEY_VAR`] on every call, so a missing key
/// fails only the lookup that needed it.
pub struct AlphaVantageClient {
    client: ApiClient,
    base_url: String,
}

impl AlphaVantageClient {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            base_url: ALPHAVANTAGE_BASE_URL.to_string(),
        }
    }

    fn fetch(&self, function: &str, symbol: &str) -> Result<Map<String, Value>> {
        let api_key = credential(API_KEY_VAR)?;
        let url = format!(
            "{}?function={}&symbol={}&apikey={}",
            self.base_url,
            function,
            urlencoding::encode(symbol),
            api_key
        );
        let body: Map<String, Value> = self.client.get_json(&url)?;
        check_quota(&body)?;
        Ok(body)
    }
}

impl QuoteService for AlphaVantageClient {
    fn global_quote(&self, symbol: &str) -> Result<Quote> {
        let body = self.fetch("GLOBAL_QUOTE", symbol)?;
        parse_global_quote(symbol, body)
    }

    fn overview(&self, symbol: &str) -> Result<Overview> {
        let body = self.fetch("OVERVIEW", symbol)?;
        debug!("Overview for {} has {} fields", symbol, body.len());
        Ok(Overview { fields: body })
    }
}

/// The free tier answers over-quota calls with 200 and an `Information` note
fn check_quota(body: &Map<String, Value>) -> Result<()> {
    for key in ["Information", "Note"] {
        if let Some(note) = body.get(key) {
            warn!("Alpha Vantage: {}", note);
            return Err(Error::QuotaExceeded);
        }
    }
    Ok(())
}

fn parse_global_quote(symbol: &str, mut body: Map<String, Value>) -> Result<Quote> {
    let quote = match body.remove("Global Quote") {
        Some(value) => serde_json::from_value::<Quote>(value)?,
        None => Quote::default(),
    };
    if quote.symbol.is_empty() {
        return Err(Error::InvalidSymbol(symbol.to_string()));
    }
    Ok(quote)
}

/// Dollar amount in billions, e.g. "385.71B"; unparseable input reads as 0
pub fn format_billions(amount: Option<f64>) -> String {
    format!("{:.2}B", amount.unwrap_or(0.0) / 1e9)
}
