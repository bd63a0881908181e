//! Schema command - print expected input and export formats

use crate::cmd::history::HistoryCsvRow;
use clap::Args;
use hkimport::{Configuration, EstimateRequest};
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for an estimate request
    JsonSchema,
    /// JSON Schema for the settings file
    SettingsSchema,
    /// Header row of the history CSV export
    CsvHeader,
    /// Column descriptions of the history CSV export
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                let schema = schema_for!(EstimateRequest);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::SettingsSchema => {
                let schema = schema_for!(Configuration);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::CsvHeader => println!("{}", HistoryCsvRow::csv_columns().join(",")),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
        Ok(())
    }

    fn print_csv_fields(&self) {
        println!("History CSV Export Format");
        println!("=========================");
        println!();
        for field in HistoryCsvRow::csv_schema() {
            let req = if field.required { "always" } else { "optional" };
            println!("{:20} ({:8})  {}", field.name, req, field.description);
        }
        println!();
        println!("Amounts are rounded to cents; HKD unless stated otherwise");
    }
}
