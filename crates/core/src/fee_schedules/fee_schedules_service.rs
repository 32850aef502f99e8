use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::fee_calculator::{fee_breakdown, RuleCharge};
use super::fee_schedules_csv::{parse_fee_schedule_csv, write_fee_schedule_csv};
use super::fee_schedules_model::{
    FeeRule, FeeRuleUpdate, FeeSchedule, FeeScheduleUpdate, NewFeeRule, NewFeeSchedule,
};
use super::fee_schedules_traits::{FeeScheduleRepositoryTrait, FeeScheduleServiceTrait};
use crate::errors::{BillingError, Error, Result};
use crate::utils::decimal_utils::check_money;

/// Service for managing fee schedules and previewing fees.
pub struct FeeScheduleService {
    repository: Arc<dyn FeeScheduleRepositoryTrait>,
}

impl FeeScheduleService {
    pub fn new(repository: Arc<dyn FeeScheduleRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl FeeScheduleServiceTrait for FeeScheduleService {
    fn get_fee_schedule(&self, schedule_id: &str) -> Result<FeeSchedule> {
        self.repository.get_by_id(schedule_id)
    }

    fn get_fee_schedules(&self) -> Result<Vec<FeeSchedule>> {
        self.repository.list()
    }

    async fn create_fee_schedule(&self, new_schedule: NewFeeSchedule) -> Result<FeeSchedule> {
        new_schedule.validate()?;
        if self.repository.find_by_name(&new_schedule.name)?.is_some() {
            return Err(BillingError::Duplicate(format!(
                "Fee schedule '{}' already exists",
                new_schedule.name
            ))
            .into());
        }
        debug!("Creating fee schedule {}", new_schedule.name);
        self.repository.create(new_schedule).await
    }

    async fn update_fee_schedule(&self, schedule_update: FeeScheduleUpdate) -> Result<FeeSchedule> {
        schedule_update.validate()?;
        if let Some(existing) = self.repository.find_by_name(&schedule_update.name)? {
            if Some(&existing.id) != schedule_update.id.as_ref() {
                return Err(BillingError::Duplicate(format!(
                    "Fee schedule '{}' already exists",
                    schedule_update.name
                ))
                .into());
            }
        }
        self.repository.update(schedule_update).await
    }

    async fn delete_fee_schedule(&self, schedule_id: &str) -> Result<()> {
        if self.repository.is_assigned(schedule_id)? {
            return Err(Error::ConstraintViolation(format!(
                "Fee schedule {} is still assigned to a group or account",
                schedule_id
            )));
        }
        let deleted = self.repository.delete(schedule_id).await?;
        if deleted == 0 {
            return Err(BillingError::NotFound {
                entity: "Fee schedule",
                id: schedule_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn add_fee_rule(&self, new_rule: NewFeeRule) -> Result<FeeRule> {
        new_rule.validate()?;
        // Surfaces a clean NotFound before the insert trips the foreign key.
        self.repository.get_by_id(&new_rule.schedule_id)?;
        self.repository.create_rule(new_rule).await
    }

    async fn update_fee_rule(&self, rule_update: FeeRuleUpdate) -> Result<FeeRule> {
        rule_update.validate()?;
        self.repository.update_rule(rule_update).await
    }

    async fn delete_fee_rule(&self, rule_id: &str) -> Result<()> {
        let deleted = self.repository.delete_rule(rule_id).await?;
        if deleted == 0 {
            return Err(BillingError::NotFound {
                entity: "Fee rule",
                id: rule_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn calculate_fee(&self, schedule_id: &str, value: Decimal) -> Result<Decimal> {
        check_money(value, "value")?;
        let schedule = self.repository.get_by_id(schedule_id)?;
        Ok(schedule.calculate_fee(value))
    }

    fn fee_breakdown(&self, schedule_id: &str, value: Decimal) -> Result<Vec<RuleCharge>> {
        check_money(value, "value")?;
        let schedule = self.repository.get_by_id(schedule_id)?;
        Ok(fee_breakdown(&schedule.rules, value))
    }

    async fn import_fee_schedules_csv(&self, content: &str) -> Result<usize> {
        let rows = parse_fee_schedule_csv(content)?;
        let created = self.repository.import_rows(rows).await?;
        info!("Imported {} fee rules", created);
        Ok(created)
    }

    fn export_fee_schedules_csv(&self) -> Result<String> {
        let schedules = self.repository.list()?;
        write_fee_schedule_csv(&schedules)
    }
}
