//! Non-blocking notes about input that was silently coerced.

use crate::country::Country;
use crate::estimate::EstimateInput;
use crate::money::{parse_amount, Coerced, RawAmount};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Entered text holds no number and counts as zero
    UnparsableAmount { field: String, raw: String },
    /// A negative amount was counted as zero
    NegativeClamped {
        field: String,
        #[schemars(with = "f64")]
        value: Decimal,
    },
    /// Origin prices and fees convert to nothing
    ZeroExchangeRate { country: Country },
}

impl Warning {
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::UnparsableAmount { .. } => "UnparsableAmount",
            Warning::NegativeClamped { .. } => "NegativeClamped",
            Warning::ZeroExchangeRate { .. } => "ZeroExchangeRate",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnparsableAmount { field, raw } => {
                write!(f, "{}: {:?} is not a number, counted as 0", field, raw)
            }
            Warning::NegativeClamped { field, value } => {
                write!(f, "{}: negative amount {} counted as 0", field, value)
            }
            Warning::ZeroExchangeRate { country } => write!(
                f,
                "exchange rate for {} is 0, origin costs convert to HK$0",
                country.currency()
            ),
        }
    }
}

/// Check every amount in `input` and report anything that was coerced. A
/// blank amount is not a warning, except for the exchange rate.
pub fn audit_input(input: &EstimateInput) -> Vec<Warning> {
    let mut warnings = Vec::new();

    audit_amount("exchange_rate", &input.exchange_rate, &mut warnings);
    if parse_amount(&input.exchange_rate).amount().is_zero() {
        warnings.push(Warning::ZeroExchangeRate {
            country: input.country,
        });
    }
    audit_amount("car_price", &input.car_price, &mut warnings);
    audit_amount("taxable_value", &input.taxable_value, &mut warnings);

    for (category, key, fee) in input.fees.entries() {
        let field = format!("{}.{}", category.key(), key);
        audit_amount(&field, &fee.value, &mut warnings);
    }

    warnings
}

fn audit_amount(field: &str, raw: &RawAmount, warnings: &mut Vec<Warning>) {
    match parse_amount(raw) {
        Coerced::Unparsable(raw) => warnings.push(Warning::UnparsableAmount {
            field: field.to_string(),
            raw,
        }),
        Coerced::Clamped(value) => warnings.push(Warning::NegativeClamped {
            field: field.to_string(),
            value,
        }),
        Coerced::Blank | Coerced::Value(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::estimate::EstimateRequest;
    use crate::fees::FeeCategory;
    use rust_decimal_macros::dec;

    fn japan_input() -> EstimateInput {
        let mut request = EstimateRequest::new(Country::Japan);
        request.car_price = RawAmount::from("1,500,000");
        request.taxable_value = RawAmount::from("350000");
        request.resolve(&Configuration::default())
    }

    #[test]
    fn clean_input_has_no_warnings() {
        assert_eq!(audit_input(&japan_input()), vec![]);
    }

    #[test]
    fn blank_price_is_not_a_warning() {
        let mut input = japan_input();
        input.car_price = RawAmount::Blank;
        assert!(audit_input(&input).is_empty());
    }

    #[test]
    fn flags_unparsable_and_negative_amounts() {
        let mut input = japan_input();
        input.car_price = RawAmount::from("-20000");
        input.taxable_value = RawAmount::from("lots");
        input
            .set_fee(FeeCategory::Origin, "shipping", RawAmount::from("tbc"))
            .unwrap();
        input
            .set_fee(FeeCategory::LocalMisc, "parts", RawAmount::Number(dec!(-4000)))
            .unwrap();

        assert_eq!(
            audit_input(&input),
            vec![
                Warning::NegativeClamped {
                    field: "car_price".into(),
                    value: dec!(-20000)
                },
                Warning::UnparsableAmount {
                    field: "taxable_value".into(),
                    raw: "lots".into()
                },
                Warning::UnparsableAmount {
                    field: "origin.shipping".into(),
                    raw: "tbc".into()
                },
                Warning::NegativeClamped {
                    field: "local_misc.parts".into(),
                    value: dec!(-4000)
                },
            ]
        );
    }

    #[test]
    fn zero_rate_is_flagged() {
        let mut input = japan_input();
        input.exchange_rate = RawAmount::from("abc");
        assert_eq!(
            audit_input(&input),
            vec![
                Warning::UnparsableAmount {
                    field: "exchange_rate".into(),
                    raw: "abc".into()
                },
                Warning::ZeroExchangeRate {
                    country: Country::Japan
                },
            ]
        );

        input.exchange_rate = RawAmount::Blank;
        assert_eq!(
            audit_input(&input),
            vec![Warning::ZeroExchangeRate {
                country: Country::Japan
            }]
        );
    }

    #[test]
    fn warnings_serialize_with_type_tag() {
        let json = serde_json::to_value(Warning::ZeroExchangeRate {
            country: Country::Germany,
        })
        .unwrap();
        assert_eq!(json["type"], "ZeroExchangeRate");
        assert_eq!(json["country"], "DE");
    }

    #[test]
    fn display_names_the_field() {
        let warning = Warning::NegativeClamped {
            field: "local_license.insurance".into(),
            value: dec!(-1500),
        };
        assert_eq!(
            warning.to_string(),
            "local_license.insurance: negative amount -1500 counted as 0"
        );
    }
}
