//! Landed cost and First Registration Tax estimates for cars imported into
//! Hong Kong from Japan, the United Kingdom and Germany.

pub mod config;
pub mod country;
pub mod estimate;
pub mod fees;
pub mod history;
pub mod money;
pub mod tax;
pub mod warnings;

pub use config::{ConfigError, Configuration};
pub use country::Country;
pub use estimate::{aggregate_costs, CostBreakdown, Estimate, EstimateInput, EstimateRequest};
pub use fees::{FeeCategory, FeeError, FeeLineItem, FeeSchedule};
pub use history::{
    CarDetails, EstimateRecord, HistoryStore, JsonFileStore, MemoryStore, RecordError, StoreError,
};
pub use money::{coerce_money, parse_amount, RawAmount};
pub use tax::{calculate_frt, FrtSchedule};
pub use warnings::{audit_input, Warning};
