use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashSet;
use std::sync::Arc;

use super::clients_csv::{parse_clients_csv, write_clients_csv};
use super::groups_model::{Client, ClientUpdate, Group, GroupUpdate, NewClient, NewGroup};
use super::groups_traits::{GroupRepositoryTrait, GroupServiceTrait};
use crate::errors::{BillingError, Error, Result};
use crate::fee_schedules::FeeScheduleRepositoryTrait;

fn not_found(entity: &'static str, id: &str) -> Error {
    BillingError::NotFound {
        entity,
        id: id.to_string(),
    }
    .into()
}

/// Service for billing groups and the clients inside them.
pub struct GroupService {
    repository: Arc<dyn GroupRepositoryTrait>,
    fee_schedule_repository: Arc<dyn FeeScheduleRepositoryTrait>,
}

impl GroupService {
    pub fn new(
        repository: Arc<dyn GroupRepositoryTrait>,
        fee_schedule_repository: Arc<dyn FeeScheduleRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            fee_schedule_repository,
        }
    }

    fn ensure_schedule_exists(&self, schedule_id: Option<&str>) -> Result<()> {
        if let Some(id) = schedule_id {
            self.fee_schedule_repository.get_by_id(id)?;
        }
        Ok(())
    }

    fn ensure_unique_name(&self, name: &str, current_id: Option<&str>) -> Result<()> {
        if let Some(existing) = self.repository.find_by_name(name)? {
            if Some(existing.id.as_str()) != current_id {
                return Err(BillingError::Duplicate(format!("Group '{}' already exists", name)).into());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GroupServiceTrait for GroupService {
    fn get_group(&self, group_id: &str) -> Result<Group> {
        self.repository.get_by_id(group_id)
    }

    fn get_groups(&self) -> Result<Vec<Group>> {
        self.repository.list()
    }

    async fn create_group(&self, new_group: NewGroup) -> Result<Group> {
        new_group.validate()?;
        self.ensure_unique_name(&new_group.name, None)?;
        self.ensure_schedule_exists(new_group.fee_schedule_id.as_deref())?;
        self.repository.create(new_group).await
    }

    async fn update_group(&self, group_update: GroupUpdate) -> Result<Group> {
        group_update.validate()?;
        self.ensure_unique_name(&group_update.name, group_update.id.as_deref())?;
        self.ensure_schedule_exists(group_update.fee_schedule_id.as_deref())?;
        self.repository.update(group_update).await
    }

    async fn delete_group(&self, group_id: &str) -> Result<()> {
        let members = self.repository.count_members(group_id)?;
        if members > 0 {
            return Err(Error::ConstraintViolation(format!(
                "Group {} still has {} clients or accounts",
                group_id, members
            )));
        }
        let deleted = self.repository.delete(group_id).await?;
        if deleted == 0 {
            return Err(not_found("Group", group_id));
        }
        Ok(())
    }

    async fn assign_fee_schedule(&self, schedule_id: &str, group_ids: Vec<String>) -> Result<usize> {
        self.ensure_schedule_exists(Some(schedule_id))?;
        for group_id in &group_ids {
            self.repository.get_by_id(group_id)?;
        }
        debug!(
            "Assigning fee schedule {} to {} groups",
            schedule_id,
            group_ids.len()
        );
        self.repository
            .set_fee_schedule(group_ids, Some(schedule_id.to_string()))
            .await
    }

    async fn clear_fee_schedule(&self, group_id: &str) -> Result<()> {
        let updated = self
            .repository
            .set_fee_schedule(vec![group_id.to_string()], None)
            .await?;
        if updated == 0 {
            return Err(not_found("Group", group_id));
        }
        Ok(())
    }

    fn get_client(&self, client_id: &str) -> Result<Client> {
        self.repository.get_client(client_id)
    }

    fn get_clients(&self, group_id: Option<&str>) -> Result<Vec<Client>> {
        self.repository.list_clients(group_id)
    }

    async fn create_client(&self, new_client: NewClient) -> Result<Client> {
        new_client.validate()?;
        if let Some(group_id) = new_client.group_id.as_deref() {
            self.repository.get_by_id(group_id)?;
        }
        self.repository.create_client(new_client).await
    }

    async fn update_client(&self, client_update: ClientUpdate) -> Result<Client> {
        client_update.validate()?;
        if let Some(group_id) = client_update.group_id.as_deref() {
            self.repository.get_by_id(group_id)?;
        }
        self.repository.update_client(client_update).await
    }

    async fn delete_client(&self, client_id: &str) -> Result<()> {
        let deleted = self.repository.delete_client(client_id).await?;
        if deleted == 0 {
            return Err(not_found("Client", client_id));
        }
        Ok(())
    }

    async fn import_clients_csv(&self, content: &str) -> Result<usize> {
        let rows = parse_clients_csv(content)?;
        let existing = self.repository.list_clients(None)?;
        let mut seen: HashSet<(String, String)> = existing
            .into_iter()
            .map(|c| (c.first_name, c.last_name))
            .collect();
        let total = rows.len();
        let rows: Vec<_> = rows
            .into_iter()
            .filter(|row| {
                let fresh = seen.insert((row.first_name.clone(), row.last_name.clone()));
                if !fresh {
                    debug!(
                        "Skipping client {} {} on line {}: already on file",
                        row.first_name, row.last_name, row.line
                    );
                }
                fresh
            })
            .collect();
        let imported = self.repository.import_clients(rows).await?;
        info!("Imported {} of {} clients", imported, total);
        Ok(imported)
    }

    fn export_clients_csv(&self) -> Result<String> {
        let clients = self.repository.list_clients(None)?;
        let groups = self.repository.list()?;
        write_clients_csv(&clients, &groups)
    }
}
