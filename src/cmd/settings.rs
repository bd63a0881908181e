//! Settings command - view and edit exchange rates and default fees

use crate::cmd::tax::format_rate;
use crate::cmd::{raw_amount, CountryArg, Paths};
use clap::{Args, Subcommand};
use hkimport::money::{add, format_hkd, parse_amount, Coerced};
use hkimport::{Configuration, Country, FeeCategory, RawAmount};
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SettingsCommand {
    #[command(subcommand)]
    action: Option<SettingsAction>,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print rates, default fees and the FRT schedule
    Show {
        /// Output as JSON instead of formatted tables
        #[arg(long)]
        json: bool,
    },
    /// Set the exchange rate for a country (HKD per unit)
    SetRate {
        #[arg(value_enum, ignore_case = true)]
        country: CountryArg,
        value: String,
    },
    /// Set a default fee: origin, local_misc or local_license
    SetFee {
        #[arg(value_enum, ignore_case = true)]
        country: CountryArg,
        #[arg(value_parser = parse_category)]
        category: FeeCategory,
        key: String,
        value: String,
    },
    /// Restore every rate and fee to the built-in defaults
    Reset,
}

fn parse_category(s: &str) -> Result<FeeCategory, String> {
    FeeCategory::from_key(s).ok_or_else(|| {
        format!(
            "unknown fee category '{}' (expected origin, local_misc or local_license)",
            s
        )
    })
}

/// Settings edits must be real amounts; typos are rejected rather than
/// saved and silently counted as zero.
fn checked_amount(value: &str) -> anyhow::Result<RawAmount> {
    let raw = raw_amount(value);
    match parse_amount(&raw) {
        Coerced::Value(_) => Ok(raw),
        Coerced::Blank => anyhow::bail!("A value is required"),
        Coerced::Clamped(amount) => anyhow::bail!("Amount cannot be negative: {}", amount),
        Coerced::Unparsable(text) => anyhow::bail!("Not a number: {:?}", text),
    }
}

#[derive(Debug, Tabled)]
struct RateRow {
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Currency")]
    currency: &'static str,
    #[tabled(rename = "HKD per unit")]
    rate: String,
}

#[derive(Debug, Tabled)]
struct FeeRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Debug, Tabled)]
struct BracketRow {
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Rate")]
    rate: String,
}

impl SettingsCommand {
    pub fn exec(&self, paths: &Paths) -> anyhow::Result<()> {
        let mut config = paths.load_config()?;

        match &self.action {
            None => print_settings(&config),
            Some(SettingsAction::Show { json: false }) => print_settings(&config),
            Some(SettingsAction::Show { json: true }) => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Some(SettingsAction::SetRate { country, value }) => {
                let country = Country::from(*country);
                config.set_rate(country, checked_amount(value)?);
                paths.save_config(&config)?;
                println!("{} exchange rate set to {}", country, config.rate(country));
            }
            Some(SettingsAction::SetFee {
                country,
                category,
                key,
                value,
            }) => {
                let country = Country::from(*country);
                config.set_fee(country, *category, key, checked_amount(value)?)?;
                paths.save_config(&config)?;
                println!("{} {}.{} set to {}", country, category, key, value.trim());
            }
            Some(SettingsAction::Reset) => {
                config.reset();
                paths.save_config(&config)?;
                println!("Settings reset to defaults");
            }
        }
        Ok(())
    }
}

fn print_settings(config: &Configuration) {
    println!();
    println!("EXCHANGE RATES");
    let rows: Vec<RateRow> = Country::ALL
        .iter()
        .map(|country| RateRow {
            country: country.name().to_string(),
            currency: country.currency(),
            rate: config.raw_rate(*country).to_string(),
        })
        .collect();
    print_table(rows, 2);

    for country in Country::ALL {
        let fees = config.fee_schedule(country);
        println!();
        println!("DEFAULT FEES: {} ({})", country.name(), country.currency());
        let rows: Vec<FeeRow> = fees
            .entries()
            .map(|(category, key, fee)| FeeRow {
                category: category.to_string(),
                key: key.to_string(),
                label: fee.label.clone(),
                value: fee.value.to_string(),
            })
            .collect();
        if rows.is_empty() {
            println!("  (no fees)");
        } else {
            print_table(rows, 3);
        }
    }

    println!();
    println!("FIRST REGISTRATION TAX");
    let mut lower = Decimal::ZERO;
    let mut rows = Vec::with_capacity(config.frt.brackets.len() + 1);
    for bracket in &config.frt.brackets {
        let upper = add(lower, bracket.width);
        rows.push(BracketRow {
            band: format!("{} - {}", format_hkd(lower), format_hkd(upper)),
            rate: format_rate(bracket.rate),
        });
        lower = upper;
    }
    rows.push(BracketRow {
        band: format!("above {}", format_hkd(lower)),
        rate: format_rate(config.frt.top_rate),
    });
    print_table(rows, 1);
}

fn print_table<T: Tabled>(rows: Vec<T>, right_from: usize) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(right_from..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
}
