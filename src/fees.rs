//! Fee line items and the per-country fee schedules they are grouped into.

use crate::money::{self, coerce_money, RawAmount};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FeeError {
    #[error("this fee schedule has no {0} bucket")]
    MissingCategory(FeeCategory),
    #[error("unknown fee: {category}.{key}")]
    UnknownFee { category: FeeCategory, key: String },
}

/// Fee line items keyed by a stable fee key such as `shipping`.
pub type FeeMap = BTreeMap<String, FeeLineItem>;

static NO_FEES: FeeMap = BTreeMap::new();

/// A named, editable charge. Only `value` takes part in arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeeLineItem {
    /// Display name
    pub label: String,
    /// Amount as entered; `val` is accepted for older settings files
    #[serde(default, alias = "val")]
    pub value: RawAmount,
}

impl FeeLineItem {
    pub fn new(label: impl Into<String>, value: impl Into<RawAmount>) -> Self {
        FeeLineItem {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Which bucket of a fee schedule a fee belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeeCategory {
    /// Charged in the source country, in its currency
    Origin,
    /// Hong Kong charges needed to land and clear the car
    LocalMisc,
    /// Hong Kong licence fee and insurance, needed to put the car on the road
    LocalLicense,
}

impl FeeCategory {
    pub const ALL: [FeeCategory; 3] = [
        FeeCategory::Origin,
        FeeCategory::LocalMisc,
        FeeCategory::LocalLicense,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FeeCategory::Origin => "origin",
            FeeCategory::LocalMisc => "local_misc",
            FeeCategory::LocalLicense => "local_license",
        }
    }

    pub fn from_key(s: &str) -> Option<FeeCategory> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "origin" => Some(FeeCategory::Origin),
            "local_misc" | "misc" | "local" | "hk" => Some(FeeCategory::LocalMisc),
            "local_license" | "license" => Some(FeeCategory::LocalLicense),
            _ => None,
        }
    }
}

impl fmt::Display for FeeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Default fees for one source country.
///
/// Older settings carry a single `local` bucket; newer ones keep licence and
/// insurance apart so landed cost excludes on-road costs. A `Combined`
/// schedule behaves as a `Split` one with no licence fees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FeeSchedule {
    Split {
        origin: FeeMap,
        #[serde(alias = "localMisc")]
        local_misc: FeeMap,
        #[serde(alias = "localLicense")]
        local_license: FeeMap,
    },
    Combined {
        origin: FeeMap,
        #[serde(alias = "hk")]
        local: FeeMap,
    },
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule::Split {
            origin: FeeMap::new(),
            local_misc: FeeMap::new(),
            local_license: FeeMap::new(),
        }
    }
}

impl FeeSchedule {
    pub fn origin(&self) -> &FeeMap {
        match self {
            FeeSchedule::Split { origin, .. } | FeeSchedule::Combined { origin, .. } => origin,
        }
    }

    pub fn local_misc(&self) -> &FeeMap {
        match self {
            FeeSchedule::Split { local_misc, .. } => local_misc,
            FeeSchedule::Combined { local, .. } => local,
        }
    }

    /// Licence and insurance fees; always empty for a combined schedule.
    pub fn local_license(&self) -> &FeeMap {
        match self {
            FeeSchedule::Split { local_license, .. } => local_license,
            FeeSchedule::Combined { .. } => &NO_FEES,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, FeeSchedule::Split { .. })
    }

    /// The bucket for `category`, or `None` if this schedule shape has no such bucket.
    pub fn category(&self, category: FeeCategory) -> Option<&FeeMap> {
        match (self, category) {
            (_, FeeCategory::Origin) => Some(self.origin()),
            (_, FeeCategory::LocalMisc) => Some(self.local_misc()),
            (FeeSchedule::Split { local_license, .. }, FeeCategory::LocalLicense) => {
                Some(local_license)
            }
            (FeeSchedule::Combined { .. }, FeeCategory::LocalLicense) => None,
        }
    }

    pub fn category_mut(&mut self, category: FeeCategory) -> Option<&mut FeeMap> {
        match (self, category) {
            (FeeSchedule::Split { origin, .. }, FeeCategory::Origin)
            | (FeeSchedule::Combined { origin, .. }, FeeCategory::Origin) => Some(origin),
            (FeeSchedule::Split { local_misc, .. }, FeeCategory::LocalMisc) => Some(local_misc),
            (FeeSchedule::Combined { local, .. }, FeeCategory::LocalMisc) => Some(local),
            (FeeSchedule::Split { local_license, .. }, FeeCategory::LocalLicense) => {
                Some(local_license)
            }
            (FeeSchedule::Combined { .. }, FeeCategory::LocalLicense) => None,
        }
    }

    /// Convert to the split shape, moving a combined `local` bucket to `local_misc`.
    pub fn into_split(self) -> FeeSchedule {
        match self {
            split @ FeeSchedule::Split { .. } => split,
            FeeSchedule::Combined { origin, local } => FeeSchedule::Split {
                origin,
                local_misc: local,
                local_license: FeeMap::new(),
            },
        }
    }

    /// Change the value of fee `key` in `category`. A key that does not exist
    /// yet is added, with the key as its label, only when `allow_new` is set.
    pub fn set_fee(
        &mut self,
        category: FeeCategory,
        key: &str,
        value: RawAmount,
        allow_new: bool,
    ) -> Result<(), FeeError> {
        let fees = self
            .category_mut(category)
            .ok_or(FeeError::MissingCategory(category))?;
        match fees.get_mut(key) {
            Some(fee) => fee.value = value,
            None if allow_new => {
                fees.insert(key.to_string(), FeeLineItem::new(key, value));
            }
            None => {
                return Err(FeeError::UnknownFee {
                    category,
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Every fee with its category, in category then key order.
    pub fn entries(&self) -> impl Iterator<Item = (FeeCategory, &str, &FeeLineItem)> {
        FeeCategory::ALL.into_iter().flat_map(move |category| {
            self.category(category)
                .into_iter()
                .flat_map(move |fees| fees.iter().map(move |(k, v)| (category, k.as_str(), v)))
        })
    }
}

/// Sum fee values after coercion. Order of the items never changes the result.
pub fn sum_fees<'a>(items: impl IntoIterator<Item = &'a FeeLineItem>) -> Decimal {
    items
        .into_iter()
        .map(|fee| coerce_money(&fee.value))
        .fold(Decimal::ZERO, money::add)
}
