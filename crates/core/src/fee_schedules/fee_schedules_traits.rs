//! Fee schedule repository and service traits.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::fee_calculator::RuleCharge;
use super::fee_schedules_csv::FeeScheduleImportRow;
use super::fee_schedules_model::{
    FeeRule, FeeRuleUpdate, FeeSchedule, FeeScheduleUpdate, NewFeeRule, NewFeeSchedule,
};
use crate::errors::Result;

/// Persistence contract for fee schedules and their rules.
///
/// Schedules are always returned with their rules, ordered by minimum.
#[async_trait]
pub trait FeeScheduleRepositoryTrait: Send + Sync {
    fn get_by_id(&self, schedule_id: &str) -> Result<FeeSchedule>;

    fn find_by_name(&self, name: &str) -> Result<Option<FeeSchedule>>;

    fn list(&self) -> Result<Vec<FeeSchedule>>;

    async fn create(&self, new_schedule: NewFeeSchedule) -> Result<FeeSchedule>;

    async fn update(&self, schedule_update: FeeScheduleUpdate) -> Result<FeeSchedule>;

    /// Deletes the schedule's rules, then the schedule, in one transaction.
    ///
    /// Returns the number of deleted schedules.
    async fn delete(&self, schedule_id: &str) -> Result<usize>;

    /// True when a group or an account still points at the schedule.
    fn is_assigned(&self, schedule_id: &str) -> Result<bool>;

    fn get_rule(&self, rule_id: &str) -> Result<FeeRule>;

    async fn create_rule(&self, new_rule: NewFeeRule) -> Result<FeeRule>;

    async fn update_rule(&self, rule_update: FeeRuleUpdate) -> Result<FeeRule>;

    async fn delete_rule(&self, rule_id: &str) -> Result<usize>;

    /// Creates missing schedules by name and appends one rule per row,
    /// all in one transaction. Returns the number of rules created.
    async fn import_rows(&self, rows: Vec<FeeScheduleImportRow>) -> Result<usize>;
}

#[async_trait]
pub trait FeeScheduleServiceTrait: Send + Sync {
    fn get_fee_schedule(&self, schedule_id: &str) -> Result<FeeSchedule>;

    fn get_fee_schedules(&self) -> Result<Vec<FeeSchedule>>;

    async fn create_fee_schedule(&self, new_schedule: NewFeeSchedule) -> Result<FeeSchedule>;

    async fn update_fee_schedule(&self, schedule_update: FeeScheduleUpdate) -> Result<FeeSchedule>;

    /// Refuses to delete a schedule that is still assigned.
    async fn delete_fee_schedule(&self, schedule_id: &str) -> Result<()>;

    async fn add_fee_rule(&self, new_rule: NewFeeRule) -> Result<FeeRule>;

    async fn update_fee_rule(&self, rule_update: FeeRuleUpdate) -> Result<FeeRule>;

    async fn delete_fee_rule(&self, rule_id: &str) -> Result<()>;

    /// Quarterly fee preview for `value` under a stored schedule.
    fn calculate_fee(&self, schedule_id: &str, value: Decimal) -> Result<Decimal>;

    fn fee_breakdown(&self, schedule_id: &str, value: Decimal) -> Result<Vec<RuleCharge>>;

    async fn import_fee_schedules_csv(&self, content: &str) -> Result<usize>;

    fn export_fee_schedules_csv(&self) -> Result<String>;
}
