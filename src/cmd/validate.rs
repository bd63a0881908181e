//! Validate command - surface amounts that would be counted as zero

use crate::cmd::{read_request, Paths};
use clap::Args;
use hkimport::{audit_input, Country, Warning};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// JSON estimate request file ("-" for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput {
    country: Country,
    warning_count: usize,
    warnings: Vec<Warning>,
}

impl ValidateCommand {
    pub fn exec(&self, paths: &Paths) -> anyhow::Result<()> {
        let config = paths.load_config()?;
        let request = read_request(&self.input)?;
        let input = request.resolve(&config);
        let warnings = audit_input(&input);

        if self.json {
            let output = ValidationOutput {
                country: input.country,
                warning_count: warnings.len(),
                warnings,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            if output.warning_count > 0 {
                std::process::exit(1);
            }
            return Ok(());
        }

        println!();
        println!("VALIDATION RESULTS ({})", input.country.name());
        println!();
        if warnings.is_empty() {
            println!("\u{2713} No issues found.");
            return Ok(());
        }

        println!("\u{26A0} {} issue(s) found:", warnings.len());
        println!();
        for (i, warning) in warnings.iter().enumerate() {
            println!("  {}. [{}] {}", i + 1, warning.kind(), warning);
        }

        // Exit with code 1 if issues found
        std::process::exit(1);
    }
}
