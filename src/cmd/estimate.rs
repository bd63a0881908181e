//! Estimate command - landed cost and total cost of one import

use crate::cmd::{raw_amount, read_request, CountryArg, Paths};
use anyhow::Context;
use chrono::Utc;
use clap::Args;
use hkimport::fees::FeeCategory;
use hkimport::money::{coerce_money, format_foreign, format_hkd, mul};
use hkimport::tax::FrtAssessment;
use hkimport::{
    audit_input, CarDetails, CostBreakdown, Estimate, EstimateInput, EstimateRecord,
    EstimateRequest, HistoryStore, Warning,
};
use serde::Serialize;
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct EstimateCommand {
    /// Country the car is bought in
    #[arg(short, long, value_enum, ignore_case = true)]
    country: Option<CountryArg>,

    /// Purchase price in the source country's currency
    #[arg(short, long)]
    price: Option<String>,

    /// Approved retail price (PRP) in HKD, the First Registration Tax base
    #[arg(long)]
    prp: Option<String>,

    /// Exchange rate override, HKD per unit of the source currency
    #[arg(long)]
    rate: Option<String>,

    /// Override a fee for this estimate only, e.g. origin.shipping=90000
    #[arg(long = "fee", value_name = "CATEGORY.KEY=VALUE", value_parser = parse_fee_override)]
    fees: Vec<FeeOverride>,

    #[arg(long)]
    make: Option<String>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    year: Option<String>,

    /// Chassis or model code
    #[arg(long)]
    code: Option<String>,

    /// JSON estimate request file ("-" for stdin); other flags override it
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,

    /// Append the estimate to the history file
    #[arg(long)]
    save: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeOverride {
    category: FeeCategory,
    key: String,
    value: String,
}

fn parse_fee_override(s: &str) -> Result<FeeOverride, String> {
    let (path, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY.KEY=VALUE, got '{}'", s))?;
    let (category, key) = path
        .split_once('.')
        .ok_or_else(|| format!("expected CATEGORY.KEY before '=', got '{}'", path))?;
    let category = FeeCategory::from_key(category).ok_or_else(|| {
        format!(
            "unknown fee category '{}' (expected origin, local_misc or local_license)",
            category
        )
    })?;
    if key.trim().is_empty() {
        return Err(format!("missing fee key in '{}'", s));
    }
    Ok(FeeOverride {
        category,
        key: key.trim().to_string(),
        value: value.to_string(),
    })
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct EstimateOutput<'a> {
    car: &'a CarDetails,
    input: &'a EstimateInput,
    breakdown: &'a CostBreakdown,
    registration_tax: FrtAssessment,
    warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_id: Option<i64>,
}

#[derive(Debug, Tabled)]
struct CostRow {
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Local")]
    local: String,
    #[tabled(rename = "HKD")]
    hkd: String,
}

impl CostRow {
    fn new(item: impl Into<String>, local: impl Into<String>, hkd: impl Into<String>) -> Self {
        CostRow {
            item: item.into(),
            local: local.into(),
            hkd: hkd.into(),
        }
    }
}

impl EstimateCommand {
    pub fn exec(&self, paths: &Paths) -> anyhow::Result<()> {
        let config = paths.load_config()?;
        let request = self.build_request()?;

        let mut input = request.resolve(&config);
        for fee in &self.fees {
            input
                .set_fee(fee.category, &fee.key, raw_amount(&fee.value))
                .with_context(|| format!("Cannot override {}.{}", fee.category, fee.key))?;
        }

        let estimate = Estimate::compute(input);
        let assessment = estimate.input.frt.assess(estimate.breakdown.taxable_value);
        let warnings = audit_input(&estimate.input);
        for warning in &warnings {
            log::warn!("{}", warning);
        }

        let saved_id = if self.save {
            Some(self.save_record(paths, estimate.clone(), request.car.clone())?)
        } else {
            None
        };

        if self.json {
            let output = EstimateOutput {
                car: &request.car,
                input: &estimate.input,
                breakdown: &estimate.breakdown,
                registration_tax: assessment,
                warnings,
                saved_id,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_estimate(&estimate, &request.car, &warnings);
            if let Some(id) = saved_id {
                println!("Saved estimate {}", id);
            }
        }
        Ok(())
    }

    fn build_request(&self) -> anyhow::Result<EstimateRequest> {
        let mut request = match (&self.input, self.country) {
            (Some(path), country) => {
                let mut request = read_request(path)?;
                if let Some(country) = country {
                    request.country = country.into();
                }
                request
            }
            (None, Some(country)) => EstimateRequest::new(country.into()),
            (None, None) => anyhow::bail!("Provide --country or an --input request file"),
        };

        if let Some(price) = &self.price {
            request.car_price = raw_amount(price);
        }
        if let Some(prp) = &self.prp {
            request.taxable_value = raw_amount(prp);
        }
        if let Some(rate) = &self.rate {
            request.exchange_rate = Some(raw_amount(rate));
        }

        let car = &mut request.car;
        for (field, value) in [
            (&mut car.make, &self.make),
            (&mut car.model, &self.model),
            (&mut car.year, &self.year),
            (&mut car.code, &self.code),
        ] {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
        Ok(request)
    }

    fn save_record(&self, paths: &Paths, estimate: Estimate, car: CarDetails) -> anyhow::Result<i64> {
        let record = EstimateRecord::from_estimate(estimate, car, Utc::now())
            .context("Estimate not saved")?;
        let (created_at, fingerprint) = (record.created_at, record.fingerprint.clone());
        let mut store = paths.history_store();
        store.submit(record)?;

        // the store may bump the id on a clash, so read back the one it kept
        let id = store
            .records()?
            .into_iter()
            .find(|r| r.created_at == created_at && r.fingerprint == fingerprint)
            .map(|r| r.id)
            .context("Saved estimate is missing from history")?;
        log::info!("Saved estimate {} to {}", id, store.path().display());
        Ok(id)
    }
}

fn print_estimate(estimate: &Estimate, car: &CarDetails, warnings: &[Warning]) {
    let input = &estimate.input;
    let b = &estimate.breakdown;
    let country = input.country;

    println!();
    println!(
        "ESTIMATE: {} ({} @ {} HKD)",
        country.name(),
        country.currency(),
        b.exchange_rate.normalize()
    );
    let description = car.description();
    if !description.is_empty() {
        println!("{}", description);
    }
    println!();

    let mut rows = vec![CostRow::new(
        "Car price",
        format_foreign(b.car_price_local, country),
        format_hkd(b.car_price_hkd),
    )];
    for fee in input.fees.origin().values() {
        let local = coerce_money(&fee.value);
        rows.push(CostRow::new(
            format!("  {}", fee.label),
            format_foreign(local, country),
            format_hkd(mul(local, b.exchange_rate)),
        ));
    }
    rows.push(CostRow::new(
        "Origin fees",
        format_foreign(b.origin_fees_total_local, country),
        format_hkd(b.origin_fees_total_hkd),
    ));
    for fee in input.fees.local_misc().values() {
        rows.push(CostRow::new(
            format!("  {}", fee.label),
            "",
            format_hkd(coerce_money(&fee.value)),
        ));
    }
    rows.push(CostRow::new(
        "Local fees",
        "",
        format_hkd(b.local_misc_total_hkd),
    ));
    rows.push(CostRow::new(
        format!("First Registration Tax (PRP {})", format_hkd(b.taxable_value)),
        "",
        format_hkd(b.registration_tax),
    ));
    rows.push(CostRow::new("Landed cost", "", format_hkd(b.landed_cost)));
    for fee in input.fees.local_license().values() {
        rows.push(CostRow::new(
            format!("  {}", fee.label),
            "",
            format_hkd(coerce_money(&fee.value)),
        ));
    }
    rows.push(CostRow::new(
        "Licence and insurance",
        "",
        format_hkd(b.license_fees_total_hkd),
    ));
    rows.push(CostRow::new("Total cost", "", format_hkd(b.total_cost)));

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);

    if !warnings.is_empty() {
        println!();
        println!("\u{26A0} {} warning(s):", warnings.len());
        for warning in warnings {
            println!("  - {}", warning);
        }
    }
}
