//! Database schema definitions

/// SQL to create the addresses table
pub const CREATE_ADDRESSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS addresses (
    id INTEGER PRIMARY KEY,
    address TEXT NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    last_temperature TEXT,
    created_at TIMESTAMP,
    updated_at TIMESTAMP
)
"#;

/// SQL to create the tickers table
///
/// Symbols are deliberately not unique: every first-time lookup appends a row.
pub const CREATE_TICKERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tickers (
    id INTEGER PRIMARY KEY,
    ticker TEXT NOT NULL,
    company_name TEXT NOT NULL,
    sector TEXT NOT NULL,
    industry TEXT NOT NULL,
    exchange TEXT NOT NULL,
    address TEXT NOT NULL,
    official_site TEXT NOT NULL,
    revenue_ttm REAL,
    market_cap REAL,
    fiscal_year_end TEXT NOT NULL,
    last_price TEXT NOT NULL,
    created_at TIMESTAMP,
    updated_at TIMESTAMP
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_addresses_address ON addresses(address)",
    "CREATE INDEX IF NOT EXISTS idx_tickers_ticker ON tickers(ticker)",
];

/// Columns every `addresses` table must carry, with the type used when an
/// older file is missing one. `ALTER TABLE .. ADD COLUMN` cannot take
/// `NOT NULL` without a default, so added columns are nullable.
pub const ADDRESS_COLUMNS: &[(&str, &str)] = &[
    ("address", "TEXT"),
    ("lat", "REAL"),
    ("lon", "REAL"),
    ("last_temperature", "TEXT"),
    ("created_at", "TIMESTAMP"),
    ("updated_at", "TIMESTAMP"),
];

/// Columns every `tickers` table must carry
pub const TICKER_COLUMNS: &[(&str, &str)] = &[
    ("ticker", "TEXT"),
    ("company_name", "TEXT"),
    ("sector", "TEXT"),
    ("industry", "TEXT"),
    ("exchange", "TEXT"),
    ("address", "TEXT"),
    ("official_site", "TEXT"),
    ("revenue_ttm", "REAL"),
    ("market_cap", "REAL"),
    ("fiscal_year_end", "TEXT"),
    ("last_price", "TEXT"),
    ("created_at", "TIMESTAMP"),
    ("updated_at", "TIMESTAMP"),
];

/// Expected column set per table, checked on every open
pub const EXPECTED_COLUMNS: &[(&str, &[(&str, &str)])] = &[
    ("addresses", ADDRESS_COLUMNS),
    ("tickers", TICKER_COLUMNS),
];

/// Table creation statements, run before column migration
pub fn table_statements() -> Vec<&'static str> {
    vec![CREATE_ADDRESSES_TABLE, CREATE_TICKERS_TABLE]
}
