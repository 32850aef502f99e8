//! Billing module - quarters, snapshots and the quarterly fee roll-up.

mod billing_csv;
mod billing_service;
mod billing_traits;
mod fee_assignment;
mod quarter_ledger;
mod quarters_model;
mod snapshots_model;

pub use billing_csv::{
    parse_account_values_csv, write_quarter_export, AccountValueRow, ACCOUNT_EXPORT_HEADER,
    GROUP_EXPORT_HEADER,
};
pub use billing_service::BillingService;
pub use billing_traits::{BillingRepositoryTrait, BillingServiceTrait};
pub use fee_assignment::{allocate_fee, assign_fee, group_weight};
pub use quarter_ledger::QuarterLedger;
pub use quarters_model::{NewQuarter, Quarter, QuarterStatus, QuarterUpdate};
pub use snapshots_model::{
    AccountSnapshot, Discrepancy, GroupSnapshot, ImportSummary, NewAccountSnapshot,
    QuarterExport, SkippedRow,
};

#[cfg(test)]
mod quarter_ledger_tests;
