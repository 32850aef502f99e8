//! Billing repository and service traits.

use async_trait::async_trait;

use super::quarter_ledger::QuarterLedger;
use super::quarters_model::{NewQuarter, Quarter, QuarterUpdate};
use super::snapshots_model::{
    AccountSnapshot, Discrepancy, GroupSnapshot, ImportSummary, NewAccountSnapshot, QuarterExport,
};
use crate::errors::Result;

/// Persistence contract for quarters and their snapshots.
#[async_trait]
pub trait BillingRepositoryTrait: Send + Sync {
    fn get_quarter(&self, quarter_id: &str) -> Result<Quarter>;

    fn find_quarter_by_name(&self, name: &str) -> Result<Option<Quarter>>;

    fn list_quarters(&self) -> Result<Vec<Quarter>>;

    /// Creates an empty quarter: zero totals, `Open`, version 0.
    async fn create_quarter(&self, new_quarter: NewQuarter) -> Result<Quarter>;

    async fn update_quarter(&self, quarter_update: QuarterUpdate) -> Result<Quarter>;

    /// Deletes the quarter and all of its snapshots in one transaction.
    async fn delete_quarter(&self, quarter_id: &str) -> Result<usize>;

    /// Loads a quarter with every group and account snapshot it owns.
    fn load_ledger(&self, quarter_id: &str) -> Result<QuarterLedger>;

    /// Replaces the stored snapshots and totals of the ledger's quarter.
    ///
    /// Fails with `BillingError::ConcurrentModification` unless the stored
    /// version still equals the ledger's. Returns the ledger with the new
    /// version.
    async fn save_ledger(&self, ledger: QuarterLedger) -> Result<QuarterLedger>;

    fn get_account_snapshot(&self, snapshot_id: &str) -> Result<AccountSnapshot>;

    fn get_group_snapshot(&self, snapshot_id: &str) -> Result<GroupSnapshot>;

    /// Snapshots of one account across all quarters.
    fn list_account_snapshots_for_account(&self, account_id: &str) -> Result<Vec<AccountSnapshot>>;
}

/// Quarterly billing operations.
///
/// Every mutation loads the quarter's ledger, changes it in memory and
/// saves it back under a version check.
#[async_trait]
pub trait BillingServiceTrait: Send + Sync {
    fn get_quarter(&self, quarter_id: &str) -> Result<Quarter>;

    fn get_quarters(&self) -> Result<Vec<Quarter>>;

    /// The quarter with all of its snapshots.
    fn get_ledger(&self, quarter_id: &str) -> Result<QuarterLedger>;

    async fn create_quarter(&self, new_quarter: NewQuarter) -> Result<Quarter>;

    async fn update_quarter(&self, quarter_update: QuarterUpdate) -> Result<Quarter>;

    async fn delete_quarter(&self, quarter_id: &str) -> Result<()>;

    /// Manual entry of one account value, linked to its group immediately.
    async fn add_account_snapshot(
        &self,
        quarter_id: &str,
        new_snapshot: NewAccountSnapshot,
    ) -> Result<AccountSnapshot>;

    async fn delete_account_snapshot(&self, snapshot_id: &str) -> Result<()>;

    /// Unlinks the group's members and removes the group snapshot.
    async fn delete_group_snapshot(&self, snapshot_id: &str) -> Result<()>;

    async fn delete_all_account_snapshots(&self, quarter_id: &str) -> Result<usize>;

    /// Removes an account's snapshots from every quarter so the account
    /// itself can be deleted.
    async fn purge_account_snapshots(&self, account_id: &str) -> Result<usize>;

    async fn import_account_values(&self, quarter_id: &str, content: &str) -> Result<ImportSummary>;

    async fn generate_group_snapshots(&self, quarter_id: &str) -> Result<QuarterLedger>;

    async fn calculate_fees(&self, quarter_id: &str) -> Result<QuarterLedger>;

    /// Recomputes cached totals from the snapshots.
    async fn update_quarter_data(&self, quarter_id: &str) -> Result<Quarter>;

    fn reconcile_quarter(&self, quarter_id: &str) -> Result<Vec<Discrepancy>>;

    fn export_quarter_csv(&self, quarter_id: &str) -> Result<QuarterExport>;
}
