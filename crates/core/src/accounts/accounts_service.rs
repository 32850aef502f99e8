use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::accounts_csv::{parse_accounts_csv, write_accounts_csv};
use super::accounts_model::{Account, AccountUpdate, NewAccount};
use super::accounts_traits::{AccountRepositoryTrait, AccountServiceTrait};
use crate::billing::{ImportSummary, SkippedRow};
use crate::errors::{BillingError, Error, Result};
use crate::fee_schedules::FeeScheduleRepositoryTrait;
use crate::groups::GroupRepositoryTrait;

/// Service for managing accounts
pub struct AccountService {
    repository: Arc<dyn AccountRepositoryTrait>,
    group_repository: Arc<dyn GroupRepositoryTrait>,
    fee_schedule_repository: Arc<dyn FeeScheduleRepositoryTrait>,
}

impl AccountService {
    /// Creates a new AccountService instance
    pub fn new(
        repository: Arc<dyn AccountRepositoryTrait>,
        group_repository: Arc<dyn GroupRepositoryTrait>,
        fee_schedule_repository: Arc<dyn FeeScheduleRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            group_repository,
            fee_schedule_repository,
        }
    }

    /// Checks references and resolves the group: explicit group wins,
    /// otherwise the client's group.
    fn resolve_group(
        &self,
        client_id: Option<&str>,
        group_id: Option<String>,
        fee_schedule_id: Option<&str>,
    ) -> Result<Option<String>> {
        if let Some(schedule_id) = fee_schedule_id {
            self.fee_schedule_repository.get_by_id(schedule_id)?;
        }
        if let Some(group_id) = group_id.as_deref() {
            self.group_repository.get_by_id(group_id)?;
        }
        match client_id {
            Some(client_id) => {
                let client = self.group_repository.get_client(client_id)?;
                Ok(group_id.or(client.group_id))
            }
            None => Ok(group_id),
        }
    }

    fn ensure_unique_number(&self, account_number: &str, current_id: Option<&str>) -> Result<()> {
        if let Some(existing) = self.repository.find_by_number(account_number)? {
            if Some(existing.id.as_str()) != current_id {
                return Err(BillingError::Duplicate(format!(
                    "Account number '{}' already exists",
                    account_number
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AccountServiceTrait for AccountService {
    async fn create_account(&self, mut new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;
        self.ensure_unique_number(&new_account.account_number, None)?;
        new_account.group_id = self.resolve_group(
            new_account.client_id.as_deref(),
            new_account.group_id.take(),
            new_account.fee_schedule_id.as_deref(),
        )?;
        debug!(
            "Creating account {} (group: {:?})",
            new_account.account_number, new_account.group_id
        );
        self.repository.create(new_account).await
    }

    async fn update_account(&self, mut account_update: AccountUpdate) -> Result<Account> {
        account_update.validate()?;
        self.ensure_unique_number(
            &account_update.account_number,
            account_update.id.as_deref(),
        )?;
        account_update.group_id = self.resolve_group(
            account_update.client_id.as_deref(),
            account_update.group_id.take(),
            account_update.fee_schedule_id.as_deref(),
        )?;
        self.repository.update(account_update).await
    }

    async fn delete_account(&self, account_id: &str) -> Result<()> {
        let snapshots = self.repository.count_snapshots(account_id)?;
        if snapshots > 0 {
            return Err(Error::ConstraintViolation(format!(
                "Account {} still has {} snapshots; purge them first",
                account_id, snapshots
            )));
        }
        let deleted = self.repository.delete(account_id).await?;
        if deleted == 0 {
            return Err(BillingError::NotFound {
                entity: "Account",
                id: account_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn get_account(&self, account_id: &str) -> Result<Account> {
        self.repository.get_by_id(account_id)
    }

    fn get_accounts(&self, group_id: Option<&str>) -> Result<Vec<Account>> {
        self.repository.list(group_id)
    }

    async fn import_accounts_csv(&self, content: &str) -> Result<ImportSummary> {
        let rows = parse_accounts_csv(content)?;
        let clients = self.group_repository.list_clients(None)?;
        let mut clients_by_name = HashMap::new();
        for client in &clients {
            clients_by_name
                .entry((client.first_name.as_str(), client.last_name.as_str()))
                .or_insert(client);
        }

        let mut summary = ImportSummary::default();
        let mut seen_numbers = HashSet::new();
        let mut new_accounts = Vec::new();
        for row in rows {
            let key = (row.client_first_name.as_str(), row.client_last_name.as_str());
            let Some(client) = clients_by_name.get(&key).copied() else {
                warn!(
                    "Line {}: no client named '{} {}', account {} skipped",
                    row.line, row.client_first_name, row.client_last_name, row.account_number
                );
                summary.skipped.push(SkippedRow {
                    line: row.line,
                    account_number: row.account_number,
                    reason: "unknown client".to_string(),
                });
                continue;
            };

            if !seen_numbers.insert(row.account_number.clone())
                || self.repository.find_by_number(&row.account_number)?.is_some()
            {
                warn!(
                    "Line {}: account number '{}' already exists, row skipped",
                    row.line, row.account_number
                );
                summary.skipped.push(SkippedRow {
                    line: row.line,
                    account_number: row.account_number,
                    reason: "duplicate account number".to_string(),
                });
                continue;
            }

            new_accounts.push(NewAccount {
                id: None,
                account_number: row.account_number,
                description: row.description,
                client_id: Some(client.id.clone()),
                group_id: client.group_id.clone(),
                custodian: row.custodian,
                billable: row.billable,
                discretionary: row.discretionary,
                fee_schedule_id: None,
            });
        }

        summary.imported = self.repository.create_many(new_accounts).await?;
        info!(
            "Imported {} accounts, skipped {}",
            summary.imported,
            summary.skipped.len()
        );
        Ok(summary)
    }

    fn export_accounts_csv(&self) -> Result<String> {
        let accounts = self.repository.list(None)?;
        let clients = self.group_repository.list_clients(None)?;
        write_accounts_csv(&accounts, &clients)
    }
}
