use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser, Debug)]
#[command(name = "hkimport", version, about = "Estimate the cost of importing a used car into Hong Kong")]
struct Cli {
    /// Settings file with exchange rates, default fees and the FRT schedule
    #[arg(long, global = true, default_value = "hkimport-settings.json")]
    settings: PathBuf,

    /// History file of saved estimates
    #[arg(long, global = true, default_value = "hkimport-history.json")]
    history: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Landed cost and total cost of importing one car
    Estimate(cmd::estimate::EstimateCommand),
    /// First Registration Tax on an approved retail price
    Tax(cmd::tax::TaxCommand),
    /// List, export, delete or verify saved estimates
    History(cmd::history::HistoryCommand),
    /// View or edit exchange rates and default fees
    Settings(cmd::settings::SettingsCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
    /// Check an estimate request for amounts that would count as zero
    Validate(cmd::validate::ValidateCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let paths = cmd::Paths {
        settings: cli.settings,
        history: cli.history,
    };

    match cli.command {
        Command::Estimate(estimate) => estimate.exec(&paths),
        Command::Tax(tax) => tax.exec(&paths),
        Command::History(history) => history.exec(&paths),
        Command::Settings(settings) => settings.exec(&paths),
        Command::Schema(schema) => schema.exec(),
        Command::Validate(validate) => validate.exec(&paths),
    }
}
