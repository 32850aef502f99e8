use async_trait::async_trait;

use super::clients_csv::ClientImportRow;
use super::groups_model::{Client, ClientUpdate, Group, GroupUpdate, NewClient, NewGroup};
use crate::errors::Result;

/// Persistence contract for billing groups and their clients.
#[async_trait]
pub trait GroupRepositoryTrait: Send + Sync {
    fn get_by_id(&self, group_id: &str) -> Result<Group>;

    fn find_by_name(&self, name: &str) -> Result<Option<Group>>;

    fn list(&self) -> Result<Vec<Group>>;

    async fn create(&self, new_group: NewGroup) -> Result<Group>;

    async fn update(&self, group_update: GroupUpdate) -> Result<Group>;

    async fn delete(&self, group_id: &str) -> Result<usize>;

    /// Number of clients and accounts still pointing at the group.
    fn count_members(&self, group_id: &str) -> Result<usize>;

    /// Sets (or clears, with `None`) the fee schedule of every listed group.
    async fn set_fee_schedule(
        &self,
        group_ids: Vec<String>,
        fee_schedule_id: Option<String>,
    ) -> Result<usize>;

    fn get_client(&self, client_id: &str) -> Result<Client>;

    fn list_clients(&self, group_id: Option<&str>) -> Result<Vec<Client>>;

    async fn create_client(&self, new_client: NewClient) -> Result<Client>;

    async fn update_client(&self, client_update: ClientUpdate) -> Result<Client>;

    async fn delete_client(&self, client_id: &str) -> Result<usize>;

    /// Inserts roster rows in one transaction, creating any group named in a
    /// row that does not exist yet. Returns the number of clients created.
    async fn import_clients(&self, rows: Vec<ClientImportRow>) -> Result<usize>;
}

#[async_trait]
pub trait GroupServiceTrait: Send + Sync {
    fn get_group(&self, group_id: &str) -> Result<Group>;

    fn get_groups(&self) -> Result<Vec<Group>>;

    async fn create_group(&self, new_group: NewGroup) -> Result<Group>;

    async fn update_group(&self, group_update: GroupUpdate) -> Result<Group>;

    /// Refuses to delete a group that still has clients or accounts.
    async fn delete_group(&self, group_id: &str) -> Result<()>;

    /// Assigns one schedule to many groups at once.
    async fn assign_fee_schedule(&self, schedule_id: &str, group_ids: Vec<String>) -> Result<usize>;

    async fn clear_fee_schedule(&self, group_id: &str) -> Result<()>;

    fn get_client(&self, client_id: &str) -> Result<Client>;

    fn get_clients(&self, group_id: Option<&str>) -> Result<Vec<Client>>;

    async fn create_client(&self, new_client: NewClient) -> Result<Client>;

    async fn update_client(&self, client_update: ClientUpdate) -> Result<Client>;

    async fn delete_client(&self, client_id: &str) -> Result<()>;

    /// Imports a client roster. Clients whose first and last name already
    /// exist are left alone.
    async fn import_clients_csv(&self, content: &str) -> Result<usize>;

    fn export_clients_csv(&self) -> Result<String>;
}
