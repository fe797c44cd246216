use tabled::{settings::Style, Table, Tabled};

use crate::record::{AddressRecord, TickerRecord};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

#[derive(Tabled)]
struct AddressRow {
    #[tabled(rename = "#")]
    row: usize,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Last reading")]
    reading: String,
}

/// Numbered listing of cached addresses, rows start at 1
pub fn address_table(records: &[AddressRecord]) -> String {
    let rows: Vec<AddressRow> = records
        .iter()
        .enumerate()
        .map(|(i, r)| AddressRow {
            row: i + 1,
            address: r.address.clone(),
            reading: r.last_reading(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct TickerRow {
    #[tabled(rename = "#")]
    row: usize,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Last price")]
    price: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

/// Numbered listing of cached tickers, rows start at 1
pub fn ticker_table(records: &[TickerRecord]) -> String {
    let rows: Vec<TickerRow> = records
        .iter()
        .enumerate()
        .map(|(i, r)| TickerRow {
            row: i + 1,
            company: r.company_name.clone(),
            symbol: if r.exchange.is_empty() {
                r.symbol.clone()
            } else {
                format!("{}:{}", r.symbol, r.exchange)
            },
            price: r.last_price.clone(),
            updated: r
                .updated_at
                .map(|at| at.format("%Y-%m-%d at %I:%M %p").to_string())
                .unwrap_or_default(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder() {
        assert!(TableBuilder::new().build().is_empty());
    }

    #[test]
    fn test_address_table_numbers_rows() {
        let records = vec![
            AddressRecord {
                id: 7,
                address: "1 ELM ST".into(),
                latitude: 1.0,
                longitude: 2.0,
                last_temperature: Some("55F".into()),
                created_at: None,
                updated_at: None,
            },
            AddressRecord {
                id: 9,
                address: "2 OAK ST".into(),
                latitude: 1.0,
                longitude: 2.0,
                last_temperature: None,
                created_at: None,
                updated_at: None,
            },
        ];
        let table = address_table(&records);
        assert!(table.contains("1 ELM ST"));
        assert!(table.contains("55F"));
        assert!(table.contains("│ 2 "));
    }

    #[test]
    fn test_stats_table() {
        let table = stats_table(&[("Addresses", "3")]);
        assert!(table.contains("Metric"));
        assert!(table.contains("Addresses"));
    }
}
