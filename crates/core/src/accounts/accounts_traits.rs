//! Account repository and service traits.
//!
//! These traits define the contract for account operations without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;

use super::accounts_model::{Account, AccountUpdate, NewAccount};
use crate::billing::ImportSummary;
use crate::errors::Result;

/// Trait defining the contract for Account repository operations.
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    /// Creates a new account.
    async fn create(&self, new_account: NewAccount) -> Result<Account>;

    /// Creates several accounts in one transaction, returning how many were
    /// written.
    async fn create_many(&self, new_accounts: Vec<NewAccount>) -> Result<usize>;

    /// Updates an existing account.
    async fn update(&self, account_update: AccountUpdate) -> Result<Account>;

    /// Deletes an account by its ID.
    ///
    /// Returns the number of deleted records.
    async fn delete(&self, account_id: &str) -> Result<usize>;

    /// Retrieves an account by its ID.
    fn get_by_id(&self, account_id: &str) -> Result<Account>;

    fn find_by_number(&self, account_number: &str) -> Result<Option<Account>>;

    /// Lists accounts, optionally only those of one group.
    fn list(&self, group_id: Option<&str>) -> Result<Vec<Account>>;

    /// Number of snapshots recorded for the account across all quarters.
    fn count_snapshots(&self, account_id: &str) -> Result<usize>;
}

/// Trait defining the contract for Account service operations.
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    /// Creates a new account, inheriting the client's group when none is given.
    async fn create_account(&self, new_account: NewAccount) -> Result<Account>;

    async fn update_account(&self, account_update: AccountUpdate) -> Result<Account>;

    /// Refuses while snapshots still reference the account.
    async fn delete_account(&self, account_id: &str) -> Result<()>;

    fn get_account(&self, account_id: &str) -> Result<Account>;

    fn get_accounts(&self, group_id: Option<&str>) -> Result<Vec<Account>>;

    /// Imports an account roster. Rows naming an unknown client or an
    /// account number already on file are skipped and reported.
    async fn import_accounts_csv(&self, content: &str) -> Result<ImportSummary>;

    fn export_accounts_csv(&self) -> Result<String>;
}
