//! Fee schedules module - tiered bracket schedules and the fee evaluator.

mod fee_calculator;
mod fee_schedules_csv;
mod fee_schedules_model;
mod fee_schedules_service;
mod fee_schedules_traits;

pub use fee_calculator::{calculate_fee, fee_breakdown, RuleCharge};
pub use fee_schedules_csv::{
    parse_fee_schedule_csv, write_fee_schedule_csv, FeeScheduleImportRow, FEE_SCHEDULE_CSV_HEADER,
};
pub use fee_schedules_model::{
    FeeRule, FeeRuleUpdate, FeeSchedule, FeeScheduleUpdate, NewFeeRule, NewFeeSchedule,
};
pub use fee_schedules_service::FeeScheduleService;
pub use fee_schedules_traits::{FeeScheduleRepositoryTrait, FeeScheduleServiceTrait};
