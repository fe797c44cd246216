//! Storage Layer - SQLite-backed reference store
//!
//! System of record is SQLite with tables:
//! - addresses(id, address, lat, lon, last_temperature, created_at, updated_at)
//! - tickers(id, ticker, company_name, sector, industry, exchange, address,
//!   official_site, revenue_ttm, market_cap, fiscal_year_end, last_price,
//!   created_at, updated_at)

pub mod schema;
pub mod sqlite;

pub use sqlite::{ReferenceStore, StoreStats};
