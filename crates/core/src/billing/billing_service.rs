use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::billing_csv::{parse_account_values_csv, write_quarter_export};
use super::billing_traits::{BillingRepositoryTrait, BillingServiceTrait};
use super::quarter_ledger::QuarterLedger;
use super::quarters_model::{NewQuarter, Quarter, QuarterUpdate};
use super::snapshots_model::{
    AccountSnapshot, Discrepancy, ImportSummary, NewAccountSnapshot, QuarterExport, SkippedRow,
};
use crate::accounts::{Account, AccountRepositoryTrait};
use crate::errors::{BillingError, Result};
use crate::fee_schedules::FeeScheduleRepositoryTrait;
use crate::groups::{Group, GroupRepositoryTrait};

/// Service for quarters, snapshots and the fee roll-up.
pub struct BillingService {
    repository: Arc<dyn BillingRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    group_repository: Arc<dyn GroupRepositoryTrait>,
    fee_schedule_repository: Arc<dyn FeeScheduleRepositoryTrait>,
}

impl BillingService {
    pub fn new(
        repository: Arc<dyn BillingRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        group_repository: Arc<dyn GroupRepositoryTrait>,
        fee_schedule_repository: Arc<dyn FeeScheduleRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            account_repository,
            group_repository,
            fee_schedule_repository,
        }
    }

    fn ensure_unique_name(&self, name: &str, current_id: Option<&str>) -> Result<()> {
        if let Some(existing) = self.repository.find_quarter_by_name(name)? {
            if Some(existing.id.as_str()) != current_id {
                return Err(
                    BillingError::Duplicate(format!("Quarter '{}' already exists", name)).into(),
                );
            }
        }
        Ok(())
    }

    fn group_of(&self, account: &Account) -> Result<Option<Group>> {
        account
            .group_id
            .as_deref()
            .map(|id| self.group_repository.get_by_id(id))
            .transpose()
    }

    /// Adds one account's value to the ledger, linking it to its group.
    fn add_to_ledger(
        &self,
        ledger: &mut QuarterLedger,
        account: &Account,
        group: Option<&Group>,
        snapshot_date: NaiveDate,
        market_value: Decimal,
    ) -> Result<AccountSnapshot> {
        let snapshot = AccountSnapshot {
            id: Uuid::new_v4().to_string(),
            quarter_id: ledger.quarter().id.clone(),
            account_id: account.id.clone(),
            account_number: account.account_number.clone(),
            group_id: account.group_id.clone(),
            group_snapshot_id: None,
            snapshot_date,
            market_value,
            billable: account.billable,
            fee_schedule_id: account.fee_schedule_id.clone(),
            group_weight: None,
            fee: Decimal::ZERO,
        };
        ledger.add_account_snapshot(snapshot, group).cloned()
    }
}

#[async_trait::async_trait]
impl BillingServiceTrait for BillingService {
    fn get_quarter(&self, quarter_id: &str) -> Result<Quarter> {
        self.repository.get_quarter(quarter_id)
    }

    fn get_quarters(&self) -> Result<Vec<Quarter>> {
        self.repository.list_quarters()
    }

    fn get_ledger(&self, quarter_id: &str) -> Result<QuarterLedger> {
        self.repository.load_ledger(quarter_id)
    }

    async fn create_quarter(&self, new_quarter: NewQuarter) -> Result<Quarter> {
        new_quarter.validate()?;
        self.ensure_unique_name(&new_quarter.name, None)?;
        debug!("Creating quarter {}", new_quarter.name);
        self.repository.create_quarter(new_quarter).await
    }

    async fn update_quarter(&self, quarter_update: QuarterUpdate) -> Result<Quarter> {
        quarter_update.validate()?;
        self.ensure_unique_name(&quarter_update.name, quarter_update.id.as_deref())?;
        self.repository.update_quarter(quarter_update).await
    }

    async fn delete_quarter(&self, quarter_id: &str) -> Result<()> {
        let deleted = self.repository.delete_quarter(quarter_id).await?;
        if deleted == 0 {
            return Err(BillingError::NotFound {
                entity: "Quarter",
                id: quarter_id.to_string(),
            }
            .into());
        }
        info!("Deleted quarter {}", quarter_id);
        Ok(())
    }

    async fn add_account_snapshot(
        &self,
        quarter_id: &str,
        new_snapshot: NewAccountSnapshot,
    ) -> Result<AccountSnapshot> {
        new_snapshot.validate()?;
        let account = self.account_repository.get_by_id(&new_snapshot.account_id)?;
        let group = self.group_of(&account)?;
        let mut ledger = self.repository.load_ledger(quarter_id)?;

        let snapshot = self.add_to_ledger(
            &mut ledger,
            &account,
            group.as_ref(),
            new_snapshot.snapshot_date,
            new_snapshot.market_value,
        )?;
        self.repository.save_ledger(ledger).await?;
        debug!(
            "Added snapshot for account {} to quarter {}",
            account.account_number, quarter_id
        );
        Ok(snapshot)
    }

    async fn delete_account_snapshot(&self, snapshot_id: &str) -> Result<()> {
        let snapshot = self.repository.get_account_snapshot(snapshot_id)?;
        let mut ledger = self.repository.load_ledger(&snapshot.quarter_id)?;
        ledger.remove_account_snapshot(snapshot_id)?;
        self.repository.save_ledger(ledger).await?;
        Ok(())
    }

    async fn delete_group_snapshot(&self, snapshot_id: &str) -> Result<()> {
        let snapshot = self.repository.get_group_snapshot(snapshot_id)?;
        let mut ledger = self.repository.load_ledger(&snapshot.quarter_id)?;
        ledger.remove_group_snapshot(snapshot_id)?;
        self.repository.save_ledger(ledger).await?;
        Ok(())
    }

    async fn delete_all_account_snapshots(&self, quarter_id: &str) -> Result<usize> {
        let mut ledger = self.repository.load_ledger(quarter_id)?;
        let removed = ledger.clear();
        self.repository.save_ledger(ledger).await?;
        info!("Removed {} account snapshots from quarter {}", removed, quarter_id);
        Ok(removed)
    }

    async fn purge_account_snapshots(&self, account_id: &str) -> Result<usize> {
        let snapshots = self
            .repository
            .list_account_snapshots_for_account(account_id)?;
        for snapshot in &snapshots {
            let mut ledger = self.repository.load_ledger(&snapshot.quarter_id)?;
            ledger.remove_account_snapshot(&snapshot.id)?;
            self.repository.save_ledger(ledger).await?;
        }
        Ok(snapshots.len())
    }

    async fn import_account_values(&self, quarter_id: &str, content: &str) -> Result<ImportSummary> {
        let rows = parse_account_values_csv(content)?;
        let mut ledger = self.repository.load_ledger(quarter_id)?;
        let mut groups: HashMap<String, Group> = HashMap::new();
        let mut summary = ImportSummary::default();

        for row in rows {
            let Some(account) = self
                .account_repository
                .find_by_number(&row.account_number)?
            else {
                warn!(
                    "Line {}: unknown account number '{}', row skipped",
                    row.line, row.account_number
                );
                summary.skipped.push(SkippedRow {
                    line: row.line,
                    account_number: row.account_number,
                    reason: "unknown account number".to_string(),
                });
                continue;
            };

            if ledger.contains_account(&account.id) {
                warn!(
                    "Line {}: account '{}' already has a value this quarter, row skipped",
                    row.line, row.account_number
                );
                summary.skipped.push(SkippedRow {
                    line: row.line,
                    account_number: row.account_number,
                    reason: "duplicate account in quarter".to_string(),
                });
                continue;
            }

            let group = match account.group_id.as_deref() {
                Some(group_id) => {
                    if !groups.contains_key(group_id) {
                        let group = self.group_repository.get_by_id(group_id)?;
                        groups.insert(group_id.to_string(), group);
                    }
                    groups.get(group_id)
                }
                None => None,
            };

            self.add_to_ledger(&mut ledger, &account, group, row.snapshot_date, row.market_value)?;
            summary.imported += 1;
        }

        self.repository.save_ledger(ledger).await?;
        info!(
            "Quarter {}: imported {} account values, skipped {}",
            quarter_id,
            summary.imported,
            summary.skipped.len()
        );
        Ok(summary)
    }

    async fn generate_group_snapshots(&self, quarter_id: &str) -> Result<QuarterLedger> {
        let groups = self.group_repository.list()?;
        let mut ledger = self.repository.load_ledger(quarter_id)?;
        ledger.generate_group_snapshots(&groups)?;
        self.repository.save_ledger(ledger).await
    }

    async fn calculate_fees(&self, quarter_id: &str) -> Result<QuarterLedger> {
        let schedules = self.fee_schedule_repository.list()?;
        let mut ledger = self.repository.load_ledger(quarter_id)?;
        let zeroed = ledger.calculate_fees(&schedules)?;
        if !zeroed.is_empty() {
            warn!(
                "Quarter {}: {} group(s) with zero market value were not allocated",
                quarter_id,
                zeroed.len()
            );
        }
        self.repository.save_ledger(ledger).await
    }

    async fn update_quarter_data(&self, quarter_id: &str) -> Result<Quarter> {
        let mut ledger = self.repository.load_ledger(quarter_id)?;
        ledger.update_quarter_data();
        let saved = self.repository.save_ledger(ledger).await?;
        Ok(saved.quarter().clone())
    }

    fn reconcile_quarter(&self, quarter_id: &str) -> Result<Vec<Discrepancy>> {
        Ok(self.repository.load_ledger(quarter_id)?.reconcile())
    }

    fn export_quarter_csv(&self, quarter_id: &str) -> Result<QuarterExport> {
        let ledger = self.repository.load_ledger(quarter_id)?;
        let clients: HashMap<String, String> = self
            .group_repository
            .list_clients(None)?
            .into_iter()
            .map(|client| (client.id.clone(), client.full_name()))
            .collect();
        let client_names: HashMap<String, String> = self
            .account_repository
            .list(None)?
            .into_iter()
            .filter_map(|account| {
                let name = clients.get(account.client_id.as_deref()?)?;
                Some((account.id, name.clone()))
            })
            .collect();
        write_quarter_export(&ledger, &client_names)
    }
}

