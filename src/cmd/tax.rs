//! Tax command - First Registration Tax on a PRP, tier by tier

use crate::cmd::{raw_amount, Paths};
use clap::Args;
use hkimport::money::{coerce_money, format_hkd, mul};
use hkimport::tax::{FrtAssessment, TierCharge};
use rust_decimal_macros::dec;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct TaxCommand {
    /// Approved retail price (PRP) in HKD
    #[arg(long)]
    prp: String,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Tabled)]
struct TierRow {
    #[tabled(rename = "Tier")]
    tier: usize,
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Taxed")]
    amount: String,
    #[tabled(rename = "Tax")]
    tax: String,
}

impl TaxCommand {
    pub fn exec(&self, paths: &Paths) -> anyhow::Result<()> {
        let config = paths.load_config()?;
        let taxable_value = coerce_money(&raw_amount(&self.prp));
        let assessment = config.frt.assess(taxable_value);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        } else {
            print_assessment(&assessment);
        }
        Ok(())
    }
}

fn band(tier: &TierCharge) -> String {
    match tier.upper {
        Some(upper) => format!("{} - {}", format_hkd(tier.lower), format_hkd(upper)),
        None => format!("above {}", format_hkd(tier.lower)),
    }
}

pub fn format_rate(rate: rust_decimal::Decimal) -> String {
    format!("{}%", mul(rate, dec!(100)).normalize())
}

fn print_assessment(assessment: &FrtAssessment) {
    println!();
    println!(
        "FIRST REGISTRATION TAX (PRP {})",
        format_hkd(assessment.taxable_value)
    );
    println!();

    let rows: Vec<TierRow> = assessment
        .tiers
        .iter()
        .map(|tier| TierRow {
            tier: tier.tier,
            band: band(tier),
            rate: format_rate(tier.rate),
            amount: format_hkd(tier.amount),
            tax: format_hkd(tier.tax),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    println!();
    println!("Total FRT: {}", format_hkd(assessment.total));
}

#[cfg(test)]
mod tests {
    use super::*;
    use hkimport::FrtSchedule;

    #[test]
    fn rates_print_as_percentages() {
        assert_eq!(format_rate(dec!(0.46)), "46%");
        assert_eq!(format_rate(dec!(1.15)), "115%");
        assert_eq!(format_rate(dec!(0.055)), "5.5%");
    }

    #[test]
    fn top_band_is_open_ended() {
        let assessment = FrtSchedule::hong_kong().assess(dec!(600000));
        assert_eq!(band(&assessment.tiers[0]), "HK$0 - HK$150,000");
        assert_eq!(band(&assessment.tiers[3]), "above HK$500,000");
    }
}
