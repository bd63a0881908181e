//! History command - saved estimates, with CSV export and verification

use crate::cmd::{plain, CsvField, Paths};
use clap::Args;
use hkimport::money::format_hkd;
use hkimport::{EstimateRecord, HistoryStore};
use hkimport_derive::CsvSchema;
use std::io;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct HistoryCommand {
    /// Output as CSV instead of formatted table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,

    /// Delete the saved estimate with this id
    #[arg(long, value_name = "ID")]
    delete: Option<i64>,

    /// Recompute every saved estimate from its own inputs
    #[arg(long, conflicts_with_all = ["csv", "json", "delete"])]
    verify: bool,
}

/// Row for the history table output
#[derive(Debug, Clone, Tabled)]
struct HistoryRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Saved")]
    created_at: String,
    #[tabled(rename = "From")]
    country: String,
    #[tabled(rename = "Car")]
    car: String,
    #[tabled(rename = "Landed")]
    landed_cost: String,
    #[tabled(rename = "Total")]
    total_cost: String,
}

impl From<&EstimateRecord> for HistoryRow {
    fn from(record: &EstimateRecord) -> Self {
        HistoryRow {
            id: record.id,
            created_at: record.created_at.format("%Y-%m-%d %H:%M").to_string(),
            country: record.input.country.to_string(),
            car: record.car.description(),
            landed_cost: format_hkd(record.breakdown.landed_cost),
            total_cost: format_hkd(record.breakdown.total_cost),
        }
    }
}

/// Row for the history CSV export
#[derive(Debug, Clone, serde::Serialize, CsvSchema)]
pub struct HistoryCsvRow {
    /// Estimate id (milliseconds since the epoch when saved)
    id: i64,
    /// When the estimate was saved (RFC 3339, UTC)
    created_at: String,
    /// Source country: JP, UK or DE
    country: String,
    /// Car make
    make: Option<String>,
    /// Car model
    model: Option<String>,
    /// Model year
    year: Option<String>,
    /// Chassis or model code
    code: Option<String>,
    /// HKD per unit of the source currency
    exchange_rate: String,
    /// Purchase price in the source currency
    car_price_local: String,
    /// Purchase price in HKD
    car_price_hkd: String,
    /// Origin fees in HKD
    origin_fees_hkd: String,
    /// Hong Kong transport, inspection and parts in HKD
    local_misc_hkd: String,
    /// Licence fee and insurance in HKD
    license_fees_hkd: String,
    /// Approved retail price (PRP) in HKD
    #[serde(rename = "prp")]
    taxable_value: String,
    /// First Registration Tax in HKD
    #[serde(rename = "frt")]
    registration_tax: String,
    /// Car, origin fees, local fees and FRT in HKD
    landed_cost: String,
    /// Landed cost plus licence and insurance in HKD
    total_cost: String,
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl From<&EstimateRecord> for HistoryCsvRow {
    fn from(record: &EstimateRecord) -> Self {
        let b = &record.breakdown;
        HistoryCsvRow {
            id: record.id,
            created_at: record.created_at.to_rfc3339(),
            country: record.input.country.to_string(),
            make: non_blank(&record.car.make),
            model: non_blank(&record.car.model),
            year: non_blank(&record.car.year),
            code: non_blank(&record.car.code),
            exchange_rate: b.exchange_rate.normalize().to_string(),
            car_price_local: plain(b.car_price_local),
            car_price_hkd: plain(b.car_price_hkd),
            origin_fees_hkd: plain(b.origin_fees_total_hkd),
            local_misc_hkd: plain(b.local_misc_total_hkd),
            license_fees_hkd: plain(b.license_fees_total_hkd),
            taxable_value: plain(b.taxable_value),
            registration_tax: plain(b.registration_tax),
            landed_cost: plain(b.landed_cost),
            total_cost: plain(b.total_cost),
        }
    }
}

#[derive(Debug, Tabled)]
struct VerifyRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Total")]
    total_cost: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl HistoryCommand {
    pub fn exec(&self, paths: &Paths) -> anyhow::Result<()> {
        let mut store = paths.history_store();

        if let Some(id) = self.delete {
            store.delete(id)?;
            println!("Deleted estimate {}", id);
            return Ok(());
        }

        let records = store.records()?;
        if self.verify {
            return self.verify(&records);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
        } else if self.csv {
            self.write_csv(&records)?;
        } else {
            self.print_table(&records);
        }
        Ok(())
    }

    fn print_table(&self, records: &[EstimateRecord]) {
        if records.is_empty() {
            println!("No saved estimates");
            return;
        }

        let rows: Vec<HistoryRow> = records.iter().map(HistoryRow::from).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(4..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }

    fn write_csv(&self, records: &[EstimateRecord]) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        if records.is_empty() {
            wtr.write_record(HistoryCsvRow::csv_columns())?;
        }
        for record in records {
            wtr.serialize(HistoryCsvRow::from(record))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn verify(&self, records: &[EstimateRecord]) -> anyhow::Result<()> {
        let rows: Vec<VerifyRow> = records
            .iter()
            .map(|record| VerifyRow {
                id: record.id,
                total_cost: format_hkd(record.breakdown.total_cost),
                status: if record.is_consistent() {
                    "ok"
                } else {
                    "MISMATCH"
                },
            })
            .collect();
        let mismatches = rows.iter().filter(|r| r.status != "ok").count();

        if rows.is_empty() {
            println!("No saved estimates");
            return Ok(());
        }
        println!("{}", Table::new(&rows).with(Style::rounded()));
        println!();
        if mismatches == 0 {
            println!("\u{2713} All {} saved estimate(s) recompute exactly.", rows.len());
            Ok(())
        } else {
            println!("\u{26A0} {} saved estimate(s) no longer match their inputs.", mismatches);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_columns_follow_serde_names() {
        let columns = HistoryCsvRow::csv_columns();
        assert_eq!(columns.first(), Some(&"id"));
        assert!(columns.contains(&"prp"));
        assert!(columns.contains(&"frt"));
        assert!(!columns.contains(&"taxable_value"));
        assert_eq!(columns.len(), HistoryCsvRow::csv_schema().len());
    }

    #[test]
    fn car_details_are_optional_columns() {
        let schema = HistoryCsvRow::csv_schema();
        let make = schema.iter().find(|f| f.name == "make").unwrap();
        assert!(!make.required);
        let total = schema.iter().find(|f| f.name == "total_cost").unwrap();
        assert!(total.required);
        assert_eq!(total.description, "Landed cost plus licence and insurance in HKD");
    }
}
