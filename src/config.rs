//! Exchange rates, default fee schedules and the FRT schedule, passed
//! explicitly into every calculation and persisted as a JSON settings file.

use crate::country::Country;
use crate::fees::{FeeCategory, FeeError, FeeLineItem, FeeMap, FeeSchedule};
use crate::money::{coerce_money, RawAmount};
use crate::tax::{FrtSchedule, ScheduleError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access settings {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid FRT schedule: {0}")]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Fee(#[from] FeeError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Configuration {
    /// HKD per unit of each country's currency
    pub rates: BTreeMap<Country, RawAmount>,
    /// Default fees applied to new estimates, per source country
    pub fees: BTreeMap<Country, FeeSchedule>,
    pub frt: FrtSchedule,
}

impl Default for Configuration {
    fn default() -> Self {
        let rates = [
            (Country::Japan, dec!(0.053)),
            (Country::UnitedKingdom, dec!(10.2)),
            (Country::Germany, dec!(8.6)),
        ]
        .into_iter()
        .map(|(country, rate)| (country, RawAmount::Number(rate)))
        .collect();

        let fees = Country::ALL
            .into_iter()
            .map(|country| (country, default_fees(country)))
            .collect();

        Configuration {
            rates,
            fees,
            frt: FrtSchedule::hong_kong(),
        }
    }
}

impl Configuration {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Configuration::default());
        }

        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Configuration =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.frt.validate()?;

        log::info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.frt.validate()?;
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// The exchange rate exactly as configured; blank when unset.
    pub fn raw_rate(&self, country: Country) -> RawAmount {
        self.rates.get(&country).cloned().unwrap_or_default()
    }

    /// The coerced exchange rate; an unset or invalid rate is 0.
    pub fn rate(&self, country: Country) -> Decimal {
        coerce_money(&self.raw_rate(country))
    }

    /// A copy of the default fees for `country`, empty if none are configured.
    pub fn fee_schedule(&self, country: Country) -> FeeSchedule {
        self.fees.get(&country).cloned().unwrap_or_else(|| {
            log::warn!("No default fees configured for {}", country);
            FeeSchedule::default()
        })
    }

    pub fn set_rate(&mut self, country: Country, rate: RawAmount) {
        self.rates.insert(country, rate);
    }

    /// Change a default fee. Only fees already in the schedule can be edited.
    pub fn set_fee(
        &mut self,
        country: Country,
        category: FeeCategory,
        key: &str,
        value: RawAmount,
    ) -> Result<(), ConfigError> {
        let fees = self.fees.get_mut(&country).ok_or_else(|| FeeError::UnknownFee {
            category,
            key: key.to_string(),
        })?;
        fees.set_fee(category, key, value, false)?;
        Ok(())
    }

    pub fn set_frt(&mut self, schedule: FrtSchedule) -> Result<(), ConfigError> {
        schedule.validate()?;
        self.frt = schedule;
        Ok(())
    }

    /// Restore every rate, fee and the FRT schedule to the built-in defaults.
    pub fn reset(&mut self) {
        *self = Configuration::default();
    }
}

fn fee_map(items: &[(&str, &str, Decimal)]) -> FeeMap {
    items
        .iter()
        .map(|(key, label, value)| (key.to_string(), FeeLineItem::new(*label, *value)))
        .collect()
}

fn default_fees(country: Country) -> FeeSchedule {
    let (origin, inspection, parts, insurance) = match country {
        Country::Japan => (
            fee_map(&[
                ("auctionFee", "Auction / FOB fee", dec!(20000)),
                ("shipping", "Shipping", dec!(100000)),
            ]),
            dec!(5500),
            dec!(3000),
            dec!(1500),
        ),
        Country::UnitedKingdom => (
            fee_map(&[
                ("auctionFee", "Export handling fee", dec!(500)),
                ("shipping", "Shipping", dec!(1500)),
            ]),
            dec!(6500),
            dec!(4000),
            dec!(2000),
        ),
        Country::Germany => (
            fee_map(&[
                ("auctionFee", "Export handling fee", dec!(400)),
                ("shipping", "Shipping", dec!(1200)),
            ]),
            dec!(6500),
            dec!(4000),
            dec!(2000),
        ),
    };

    FeeSchedule::Split {
        origin,
        local_misc: fee_map(&[
            ("transport", "Local transport", dec!(2000)),
            ("inspection", "Inspection / emissions test", inspection),
            ("parts", "Parts / repairs", parts),
        ]),
        local_license: fee_map(&[
            ("insurance", "Insurance", insurance),
            ("license", "Licence fee", dec!(5800)),
        ]),
    }
}
