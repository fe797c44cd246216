//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, params, OptionalExtension};
use rusqlite::types::Value;
use tracing::{debug, info};
use crate::Result;
use crate::record::{AddressRecord, NewTicker, TickerRecord, now_timestamp, parse_timestamp};
use super::schema;

const ADDRESS_SELECT: &str =
    "SELECT id, address, lat, lon, last_temperature, created_at, updated_at FROM addresses";

const TICKER_SELECT: &str = "SELECT id, ticker, company_name, sector, industry, exchange, address, \
     official_site, revenue_ttm, market_cap, fiscal_year_end, last_price, created_at, updated_at \
     FROM tickers";

/// SQLite-backed cache of resolved addresses and ticker symbols
pub struct ReferenceStore {
    conn: Connection,
}

impl ReferenceStore {
    /// Open a database file (creates it and its directory if missing)
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        debug!("Opened reference store at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create missing tables, add missing columns, then build indexes
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::table_statements() {
            self.conn.execute(stmt, [])?;
        }
        for added in self.migrate_columns()? {
            info!("Added missing column {}", added);
        }
        for stmt in schema::CREATE_INDEXES {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Add every expected column a pre-existing table lacks.
    ///
    /// Additive only: existing rows keep their values and new columns start
    /// out NULL. Returns the `table.column` names that were added.
    fn migrate_columns(&self) -> Result<Vec<String>> {
        let mut added = Vec::new();
        for (table, columns) in schema::EXPECTED_COLUMNS {
            let existing = self.table_columns(table)?;
            for (column, ty) in columns.iter() {
                if existing.iter().any(|c| c == column) {
                    continue;
                }
                self.conn.execute(
                    &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, ty),
                    [],
                )?;
                added.push(format!("{}.{}", table, column));
            }
        }
        Ok(added)
    }

    /// Column names of a table as SQLite currently sees them
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    // ========== Address Operations ==========

    /// Append a resolved address and return its id.
    ///
    /// Duplicate address text is allowed; each call creates a new row.
    pub fn insert_address(&self, address: &str, latitude: f64, longitude: f64) -> Result<i64> {
        let now = now_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO addresses (address, lat, lon, last_temperature, created_at, updated_at)
            VALUES (?1, ?2, ?3, NULL, ?4, ?4)
            "#,
            params![address, latitude, longitude, now],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted address {} as id {}", address, id);
        Ok(id)
    }

    /// Record the latest temperature for an address.
    ///
    /// Returns `false` when no row has the given id.
    pub fn update_address_temperature(&self, id: i64, temperature: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE addresses SET last_temperature = ?1, updated_at = ?2 WHERE id = ?3",
            params![temperature, now_timestamp(), id],
        )?;
        Ok(affected > 0)
    }

    /// Get an address by id
    pub fn get_address(&self, id: i64) -> Result<Option<AddressRecord>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?1", ADDRESS_SELECT),
                [id],
                |row| self.row_to_address(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// One row per distinct address text; the newest row represents its group
    pub fn list_addresses_distinct(&self) -> Result<Vec<AddressRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT MAX(id), address, lat, lon, last_temperature, created_at, updated_at \
             FROM addresses GROUP BY address ORDER BY MAX(id)",
        )?;

        let addresses = stmt
            .query_map([], |row| self.row_to_address(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(addresses)
    }

    /// Delete an address by id, returning the number of rows removed
    pub fn delete_address(&self, id: i64) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM addresses WHERE id = ?1", [id])?;
        Ok(affected)
    }

    /// Count all address rows
    pub fn count_addresses(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM addresses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to an AddressRecord
    fn row_to_address(&self, row: &rusqlite::Row) -> rusqlite::Result<AddressRecord> {
        Ok(AddressRecord {
            id: row.get(0)?,
            address: text_column(row, 1)?.unwrap_or_default(),
            latitude: real_column(row, 2)?.unwrap_or_default(),
            longitude: real_column(row, 3)?.unwrap_or_default(),
            last_temperature: text_column(row, 4)?.filter(|t| !t.is_empty()),
            created_at: text_column(row, 5)?.as_deref().and_then(parse_timestamp),
            updated_at: text_column(row, 6)?.as_deref().and_then(parse_timestamp),
        })
    }

    // ========== Ticker Operations ==========

    /// Append a ticker row and return its id
    pub fn insert_ticker(&self, ticker: &NewTicker) -> Result<i64> {
        let now = now_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO tickers (
                ticker, company_name, sector, industry, exchange, address, official_site,
                revenue_ttm, market_cap, fiscal_year_end, last_price, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            "#,
            params![
                ticker.symbol,
                ticker.company_name,
                ticker.sector,
                ticker.industry,
                ticker.exchange,
                ticker.address,
                ticker.official_site,
                amount_value(ticker.revenue_ttm),
                amount_value(ticker.market_cap),
                ticker.fiscal_year_end,
                ticker.last_price,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted ticker {} as id {}", ticker.symbol, id);
        Ok(id)
    }

    /// Set the last price on every row carrying `symbol`.
    ///
    /// Symbols are not unique, so this touches all historical rows for the
    /// symbol. Returns the number of rows updated.
    pub fn update_ticker_last_price(&self, symbol: &str, last_price: &str) -> Result<usize> {
        let affected = self.conn.execute(
            "UPDATE tickers SET last_price = ?1, updated_at = ?2 WHERE ticker = ?3",
            params![last_price, now_timestamp(), symbol],
        )?;
        debug!("Updated last price of {} on {} rows", symbol, affected);
        Ok(affected)
    }

    /// Get a ticker by id
    pub fn get_ticker(&self, id: i64) -> Result<Option<TickerRecord>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?1", TICKER_SELECT),
                [id],
                |row| self.row_to_ticker(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// One row per distinct symbol; the newest row represents its group
    pub fn list_tickers_distinct(&self) -> Result<Vec<TickerRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT MAX(id), ticker, company_name, sector, industry, exchange, address, \
             official_site, revenue_ttm, market_cap, fiscal_year_end, last_price, created_at, updated_at \
             FROM tickers GROUP BY ticker ORDER BY MAX(id)",
        )?;

        let tickers = stmt
            .query_map([], |row| self.row_to_ticker(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tickers)
    }

    /// Delete a ticker by id, returning the number of rows removed
    pub fn delete_ticker(&self, id: i64) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM tickers WHERE id = ?1", [id])?;
        Ok(affected)
    }

    /// Count all ticker rows
    pub fn count_tickers(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM tickers", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to a TickerRecord
    fn row_to_ticker(&self, row: &rusqlite::Row) -> rusqlite::Result<TickerRecord> {
        Ok(TickerRecord {
            id: row.get(0)?,
            symbol: text_column(row, 1)?.unwrap_or_default(),
            company_name: text_column(row, 2)?.unwrap_or_default(),
            sector: text_column(row, 3)?.unwrap_or_default(),
            industry: text_column(row, 4)?.unwrap_or_default(),
            exchange: text_column(row, 5)?.unwrap_or_default(),
            address: text_column(row, 6)?.unwrap_or_default(),
            official_site: text_column(row, 7)?.unwrap_or_default(),
            revenue_ttm: real_column(row, 8)?,
            market_cap: real_column(row, 9)?,
            fiscal_year_end: text_column(row, 10)?.unwrap_or_default(),
            last_price: text_column(row, 11)?.unwrap_or_default(),
            created_at: text_column(row, 12)?.as_deref().and_then(parse_timestamp),
            updated_at: text_column(row, 13)?.as_deref().and_then(parse_timestamp),
        })
    }

    // ========== Bulk Operations ==========

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            addresses: self.count_addresses()?,
            distinct_addresses: self.list_addresses_distinct()?.len(),
            tickers: self.count_tickers()?,
            distinct_tickers: self.list_tickers_distinct()?.len(),
        })
    }
}

/// Read a column as text whatever its storage class.
///
/// Older databases stored `last_price` as REAL; SQLite keeps whatever type
/// was written, so numbers are rendered back to text here.
fn text_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get::<_, Value>(idx)? {
        Value::Null | Value::Blob(_) => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
    })
}

/// Bind a missing amount as the upstream "None" marker, never NULL: older
/// files declare these columns `REAL NOT NULL`
fn amount_value(amount: Option<f64>) -> Value {
    match amount {
        Some(v) => Value::Real(v),
        None => Value::Text("None".to_string()),
    }
}

/// Read a column as a float, tolerating text like "None" from upstream
fn real_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(match row.get::<_, Value>(idx)? {
        Value::Null | Value::Blob(_) => None,
        Value::Integer(i) => Some(i as f64),
        Value::Real(f) => Some(f),
        Value::Text(s) => s.trim().parse().ok(),
    })
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub addresses: usize,
    pub distinct_addresses: usize,
    pub tickers: usize,
    pub distinct_tickers: usize,
}
