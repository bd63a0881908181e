//! Landed cost aggregation: exchange rate, car price, fee schedule and FRT
//! folded into one [`CostBreakdown`].

use crate::config::Configuration;
use crate::country::Country;
use crate::fees::{sum_fees, FeeCategory, FeeError, FeeSchedule};
use crate::history::CarDetails;
use crate::money::{add, coerce_money, mul, RawAmount};
use crate::tax::FrtSchedule;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything one cost calculation needs, captured at the moment it was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EstimateInput {
    pub country: Country,
    /// HKD per unit of the country's currency
    #[serde(default)]
    pub exchange_rate: RawAmount,
    /// Purchase price in the country's currency
    #[serde(default)]
    pub car_price: RawAmount,
    /// Approved retail price (PRP) in HKD, the FRT base
    #[serde(default)]
    pub taxable_value: RawAmount,
    pub fees: FeeSchedule,
    /// FRT schedule in force when the estimate was made
    #[serde(default)]
    pub frt: FrtSchedule,
}

impl EstimateInput {
    /// Edit a fee for this estimate only; configured defaults are untouched.
    /// A combined schedule is split first when a licence fee is set.
    pub fn set_fee(
        &mut self,
        category: FeeCategory,
        key: &str,
        value: RawAmount,
    ) -> Result<(), FeeError> {
        if category == FeeCategory::LocalLicense && !self.fees.is_split() {
            self.fees = std::mem::take(&mut self.fees).into_split();
        }
        self.fees.set_fee(category, key, value, true)
    }
}

/// A request for an estimate as a user submits it. Anything left out is
/// taken from the [`Configuration`] when the request is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EstimateRequest {
    pub country: Country,
    /// Purchase price in the country's currency
    #[serde(default)]
    pub car_price: RawAmount,
    /// Approved retail price (PRP) in HKD
    #[serde(default, alias = "prp")]
    pub taxable_value: RawAmount,
    /// Overrides the configured exchange rate
    #[serde(default)]
    pub exchange_rate: Option<RawAmount>,
    /// Overrides the configured default fees
    #[serde(default)]
    pub fees: Option<FeeSchedule>,
    #[serde(default)]
    pub car: CarDetails,
}

impl EstimateRequest {
    pub fn new(country: Country) -> Self {
        EstimateRequest {
            country,
            car_price: RawAmount::Blank,
            taxable_value: RawAmount::Blank,
            exchange_rate: None,
            fees: None,
            car: CarDetails::default(),
        }
    }

    /// Copy the rate, fees and FRT schedule in effect right now into a
    /// standalone input.
    pub fn resolve(&self, config: &Configuration) -> EstimateInput {
        EstimateInput {
            country: self.country,
            exchange_rate: self
                .exchange_rate
                .clone()
                .unwrap_or_else(|| config.raw_rate(self.country)),
            car_price: self.car_price.clone(),
            taxable_value: self.taxable_value.clone(),
            fees: self
                .fees
                .clone()
                .unwrap_or_else(|| config.fee_schedule(self.country)),
            frt: config.frt.clone(),
        }
    }
}

/// Layered cost of one vehicle. All values are coerced, non-negative and
/// unrounded; only display rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CostBreakdown {
    #[schemars(with = "f64")]
    pub exchange_rate: Decimal,
    /// Purchase price in the country's currency
    #[schemars(with = "f64")]
    pub car_price_local: Decimal,
    #[schemars(with = "f64")]
    pub car_price_hkd: Decimal,
    /// Origin fees in the country's currency
    #[schemars(with = "f64")]
    pub origin_fees_total_local: Decimal,
    #[schemars(with = "f64")]
    pub origin_fees_total_hkd: Decimal,
    #[schemars(with = "f64")]
    pub local_misc_total_hkd: Decimal,
    /// Licence and insurance, excluded from landed cost
    #[schemars(with = "f64")]
    pub license_fees_total_hkd: Decimal,
    #[schemars(with = "f64")]
    pub taxable_value: Decimal,
    #[schemars(with = "f64")]
    pub registration_tax: Decimal,
    /// Cost to bring the car in and clear it
    #[schemars(with = "f64")]
    pub landed_cost: Decimal,
    /// Landed cost plus licence and insurance
    #[schemars(with = "f64")]
    pub total_cost: Decimal,
}

impl CostBreakdown {
    /// All Hong Kong fees, miscellaneous and licensing together.
    pub fn local_fees_total_hkd(&self) -> Decimal {
        add(self.local_misc_total_hkd, self.license_fees_total_hkd)
    }
}

/// Fold an input into its cost breakdown, taxed with the input's own FRT
/// schedule. Pure; never fails. Every amount is coerced first, so unparsable
/// or negative entries count as zero.
pub fn aggregate_costs(input: &EstimateInput) -> CostBreakdown {
    let exchange_rate = coerce_money(&input.exchange_rate);
    let car_price_local = coerce_money(&input.car_price);
    let car_price_hkd = mul(car_price_local, exchange_rate);

    let origin_fees_total_local = sum_fees(input.fees.origin().values());
    let origin_fees_total_hkd = mul(origin_fees_total_local, exchange_rate);
    let local_misc_total_hkd = sum_fees(input.fees.local_misc().values());
    let license_fees_total_hkd = sum_fees(input.fees.local_license().values());

    let taxable_value = coerce_money(&input.taxable_value);
    let registration_tax = input.frt.tax(taxable_value);

    let landed_cost = [
        car_price_hkd,
        origin_fees_total_hkd,
        local_misc_total_hkd,
        registration_tax,
    ]
    .into_iter()
    .fold(Decimal::ZERO, add);
    let total_cost = add(landed_cost, license_fees_total_hkd);

    log::debug!(
        "{} estimate: car {} + origin {} + misc {} + FRT {} = landed {}; total {}",
        input.country,
        car_price_hkd,
        origin_fees_total_hkd,
        local_misc_total_hkd,
        registration_tax,
        landed_cost,
        total_cost
    );

    CostBreakdown {
        exchange_rate,
        car_price_local,
        car_price_hkd,
        origin_fees_total_local,
        origin_fees_total_hkd,
        local_misc_total_hkd,
        license_fees_total_hkd,
        taxable_value,
        registration_tax,
        landed_cost,
        total_cost,
    }
}

/// A resolved input together with the breakdown computed from it
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub input: EstimateInput,
    pub breakdown: CostBreakdown,
}

impl Estimate {
    pub fn compute(input: EstimateInput) -> Self {
        let breakdown = aggregate_costs(&input);
        Estimate { input, breakdown }
    }

    /// Resolve `request` against `config` and compute it.
    pub fn from_request(request: &EstimateRequest, config: &Configuration) -> Self {
        Estimate::compute(request.resolve(config))
    }
}
