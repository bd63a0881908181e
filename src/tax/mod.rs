pub mod frt;

pub use frt::{calculate_frt, Bracket, FrtAssessment, FrtSchedule, ScheduleError, TierCharge};
