//! First Registration Tax (FRT) on a vehicle's approved retail price (PRP).
//!
//! FRT is strictly marginal: each bracket taxes only the slice of the value
//! that falls inside it, and whatever is left after the last bounded bracket
//! is taxed at the top rate with no ceiling.

use crate::money::{add, mul};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A bounded tax bracket: the next `width` HKD of value is taxed at `rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Bracket {
    #[schemars(with = "f64")]
    pub width: Decimal,
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

impl Bracket {
    pub fn new(width: Decimal, rate: Decimal) -> Self {
        Bracket { width, rate }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("bracket {tier} has a non-positive width: {width}")]
    NonPositiveWidth { tier: usize, width: Decimal },
    #[error("bracket {tier} has a negative rate: {rate}")]
    NegativeRate { tier: usize, rate: Decimal },
    #[error("top rate is negative: {0}")]
    NegativeTopRate(Decimal),
}

/// Bounded brackets in order, then an unbounded top rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FrtSchedule {
    pub brackets: Vec<Bracket>,
    #[schemars(with = "f64")]
    pub top_rate: Decimal,
}

impl Default for FrtSchedule {
    fn default() -> Self {
        FrtSchedule::hong_kong()
    }
}

/// One bracket's share of an assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierCharge {
    /// 1-based bracket number; the top rate is the last tier
    pub tier: usize,
    pub lower: Decimal,
    /// `None` for the unbounded top tier
    pub upper: Option<Decimal>,
    /// Part of the taxable value that fell in this tier
    pub amount: Decimal,
    pub rate: Decimal,
    pub tax: Decimal,
}

/// Per-tier breakdown of the tax on one taxable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrtAssessment {
    pub taxable_value: Decimal,
    pub tiers: Vec<TierCharge>,
    pub total: Decimal,
}

impl FrtSchedule {
    /// Private car schedule: 46% on the first 150,000, 86% on the next
    /// 150,000, 115% on the next 200,000 and 132% on the remainder.
    pub fn hong_kong() -> Self {
        FrtSchedule {
            brackets: vec![
                Bracket::new(dec!(150000), dec!(0.46)),
                Bracket::new(dec!(150000), dec!(0.86)),
                Bracket::new(dec!(200000), dec!(1.15)),
            ],
            top_rate: dec!(1.32),
        }
    }

    /// Reject schedules that would make the tax shrink as the value grows.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        for (i, bracket) in self.brackets.iter().enumerate() {
            let tier = i + 1;
            if bracket.width <= Decimal::ZERO {
                return Err(ScheduleError::NonPositiveWidth {
                    tier,
                    width: bracket.width,
                });
            }
            if bracket.rate.is_sign_negative() && !bracket.rate.is_zero() {
                return Err(ScheduleError::NegativeRate {
                    tier,
                    rate: bracket.rate,
                });
            }
        }
        if self.top_rate.is_sign_negative() && !self.top_rate.is_zero() {
            return Err(ScheduleError::NegativeTopRate(self.top_rate));
        }
        Ok(())
    }

    /// Tax `taxable_value`, keeping each tier's share. Negative values are
    /// taxed as zero.
    pub fn assess(&self, taxable_value: Decimal) -> FrtAssessment {
        let value = taxable_value.max(Decimal::ZERO);
        let mut remaining = value;
        let mut lower = Decimal::ZERO;
        let mut total = Decimal::ZERO;
        let mut tiers = Vec::with_capacity(self.brackets.len() + 1);

        for (i, bracket) in self.brackets.iter().enumerate() {
            let amount = remaining.min(bracket.width);
            let tax = mul(amount, bracket.rate);
            let upper = add(lower, bracket.width);
            log::debug!(
                "FRT tier {}: {} of {}..{} @ {} = {}",
                i + 1,
                amount,
                lower,
                upper,
                bracket.rate,
                tax
            );

            tiers.push(TierCharge {
                tier: i + 1,
                lower,
                upper: Some(upper),
                amount,
                rate: bracket.rate,
                tax,
            });
            total = add(total, tax);
            remaining -= amount;
            lower = upper;
        }

        let top_tax = mul(remaining, self.top_rate);
        log::debug!("FRT top tier: {} above {} @ {} = {}", remaining, lower, self.top_rate, top_tax);
        tiers.push(TierCharge {
            tier: self.brackets.len() + 1,
            lower,
            upper: None,
            amount: remaining,
            rate: self.top_rate,
            tax: top_tax,
        });
        total = add(total, top_tax);

        FrtAssessment {
            taxable_value: value,
            tiers,
            total,
        }
    }

    /// Total tax on `taxable_value`.
    pub fn tax(&self, taxable_value: Decimal) -> Decimal {
        self.assess(taxable_value).total
    }
}

/// FRT on `taxable_value` under the Hong Kong private car schedule.
pub fn calculate_frt(taxable_value: Decimal) -> Decimal {
    FrtSchedule::hong_kong().tax(taxable_value)
}
