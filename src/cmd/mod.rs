pub mod estimate;
pub mod history;
pub mod schema;
pub mod settings;
pub mod tax;
pub mod validate;

use clap::ValueEnum;
use hkimport::{Configuration, Country, EstimateRequest, JsonFileStore, RawAmount};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Files shared by every command
#[derive(Debug, Clone)]
pub struct Paths {
    pub settings: PathBuf,
    pub history: PathBuf,
}

impl Paths {
    pub fn load_config(&self) -> anyhow::Result<Configuration> {
        Ok(Configuration::load(&self.settings)?)
    }

    pub fn save_config(&self, config: &Configuration) -> anyhow::Result<()> {
        Ok(config.save(&self.settings)?)
    }

    pub fn history_store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.history)
    }
}

/// One column of a CSV export, as described by `#[derive(CsvSchema)]`
#[derive(Debug, Clone, Copy)]
pub struct CsvField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CountryArg {
    /// Japan, prices in JPY
    Jp,
    /// United Kingdom, prices in GBP
    Uk,
    /// Germany, prices in EUR
    De,
}

impl From<CountryArg> for Country {
    fn from(arg: CountryArg) -> Self {
        match arg {
            CountryArg::Jp => Country::Japan,
            CountryArg::Uk => Country::UnitedKingdom,
            CountryArg::De => Country::Germany,
        }
    }
}

/// Keep an amount typed on the command line as a number when it is one, and
/// as text otherwise so it is coerced like any other input.
pub fn raw_amount(arg: &str) -> RawAmount {
    match arg.trim().parse::<Decimal>() {
        Ok(value) => RawAmount::Number(value),
        Err(_) => RawAmount::from(arg),
    }
}

/// Rounded to cents with trailing zeros dropped, for CSV and JSON text
pub fn plain(amount: Decimal) -> String {
    amount.round_dp(2).normalize().to_string()
}

/// Read an estimate request (JSON) from a file, or stdin with "-"
pub fn read_request(path: &Path) -> anyhow::Result<EstimateRequest> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        read_from_file(path)
    }
}

fn read_from_file(path: &Path) -> anyhow::Result<EstimateRequest> {
    let file = File::open(path)
        .map_err(|err| anyhow::anyhow!("Failed to open {}: {}", path.display(), err))?;
    let reader = BufReader::new(file);
    let request = serde_json::from_reader(reader)
        .map_err(|err| anyhow::anyhow!("Invalid estimate request in {}: {}", path.display(), err))?;
    Ok(request)
}

fn read_from_stdin() -> anyhow::Result<EstimateRequest> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe a request to stdin.");
    }

    let request = serde_json::from_slice(&buffer)
        .map_err(|err| anyhow::anyhow!("Invalid estimate request on stdin: {}", err))?;
    Ok(request)
}
