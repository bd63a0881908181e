use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source country of an imported vehicle
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Country {
    #[serde(rename = "JP")]
    Japan,
    #[serde(rename = "UK")]
    UnitedKingdom,
    #[serde(rename = "DE")]
    Germany,
}

impl Country {
    pub const ALL: [Country; 3] = [Country::Japan, Country::UnitedKingdom, Country::Germany];

    /// Short code used in settings and history files
    pub fn code(&self) -> &'static str {
        match self {
            Country::Japan => "JP",
            Country::UnitedKingdom => "UK",
            Country::Germany => "DE",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Country::Japan => "Japan",
            Country::UnitedKingdom => "United Kingdom",
            Country::Germany => "Germany",
        }
    }

    /// ISO 4217 code of the currency origin prices and fees are quoted in
    pub fn currency(&self) -> &'static str {
        match self {
            Country::Japan => "JPY",
            Country::UnitedKingdom => "GBP",
            Country::Germany => "EUR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Country::Japan => "¥",
            Country::UnitedKingdom => "£",
            Country::Germany => "€",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
