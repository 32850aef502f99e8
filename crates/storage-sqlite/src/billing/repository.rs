use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use wealthdesk_core::billing::{
    AccountSnapshot, BillingRepositoryTrait, GroupSnapshot, NewQuarter, Quarter, QuarterLedger,
    QuarterStatus, QuarterUpdate,
};
use wealthdesk_core::errors::{BillingError, Error};
use wealthdesk_core::Result;

use super::model::{AccountSnapshotDB, GroupSnapshotDB, QuarterDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{account_snapshots, group_snapshots, quarters};
use crate::utils::{chunk_for_insert, decimal_to_text};

const GROUP_SNAPSHOT_COLUMNS: usize = 7;
const ACCOUNT_SNAPSHOT_COLUMNS: usize = 12;

fn quarter_not_found(quarter_id: &str) -> Error {
    BillingError::NotFound {
        entity: "Quarter",
        id: quarter_id.to_string(),
    }
    .into()
}

fn find_quarter(conn: &mut SqliteConnection, quarter_id: &str) -> Result<Quarter> {
    quarters::table
        .find(quarter_id)
        .select(QuarterDB::as_select())
        .first::<QuarterDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .map(Quarter::from)
        .ok_or_else(|| quarter_not_found(quarter_id))
}

fn delete_snapshots(conn: &mut SqliteConnection, quarter_id: &str) -> Result<()> {
    // Account rows reference group rows, so they go first.
    diesel::delete(account_snapshots::table.filter(account_snapshots::quarter_id.eq(quarter_id)))
        .execute(conn)
        .map_err(StorageError::from)?;
    diesel::delete(group_snapshots::table.filter(group_snapshots::quarter_id.eq(quarter_id)))
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

/// Repository for quarters and their snapshot ledgers.
///
/// A ledger is always written whole: the quarter row is updated under a
/// version check and its snapshot rows are replaced in the same transaction.
pub struct BillingRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl BillingRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        BillingRepository { pool, writer }
    }
}

#[async_trait]
impl BillingRepositoryTrait for BillingRepository {
    fn get_quarter(&self, quarter_id: &str) -> Result<Quarter> {
        let mut conn = get_connection(&self.pool)?;
        find_quarter(&mut conn, quarter_id)
    }

    fn find_quarter_by_name(&self, name: &str) -> Result<Option<Quarter>> {
        let mut conn = get_connection(&self.pool)?;
        let quarter = quarters::table
            .filter(quarters::name.eq(name))
            .select(QuarterDB::as_select())
            .first::<QuarterDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(quarter.map(Quarter::from))
    }

    fn list_quarters(&self) -> Result<Vec<Quarter>> {
        let mut conn = get_connection(&self.pool)?;
        let results = quarters::table
            .select(QuarterDB::as_select())
            .order((quarters::from_date.desc(), quarters::name.asc()))
            .load::<QuarterDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(results.into_iter().map(Quarter::from).collect())
    }

    async fn create_quarter(&self, new_quarter: NewQuarter) -> Result<Quarter> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Quarter> {
                let now = Utc::now().naive_utc();
                let quarter = Quarter {
                    id: new_quarter
                        .id
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    name: new_quarter.name,
                    from_date: new_quarter.from_date,
                    to_date: new_quarter.to_date,
                    aum: Default::default(),
                    fee: Default::default(),
                    status: QuarterStatus::Open,
                    version: 0,
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(quarters::table)
                    .values(QuarterDB::from(&quarter))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(quarter)
            })
            .await
    }

    async fn update_quarter(&self, quarter_update: QuarterUpdate) -> Result<Quarter> {
        let quarter_id = quarter_update.id.clone().unwrap_or_default();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Quarter> {
                let updated = diesel::update(quarters::table.find(&quarter_id))
                    .set((
                        quarters::name.eq(quarter_update.name),
                        quarters::from_date.eq(quarter_update.from_date),
                        quarters::to_date.eq(quarter_update.to_date),
                        quarters::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(quarter_not_found(&quarter_id));
                }
                find_quarter(conn, &quarter_id)
            })
            .await
    }

    async fn delete_quarter(&self, quarter_id: &str) -> Result<usize> {
        let quarter_id = quarter_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                delete_snapshots(conn, &quarter_id)?;
                Ok(diesel::delete(quarters::table.find(&quarter_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    fn load_ledger(&self, quarter_id: &str) -> Result<QuarterLedger> {
        let mut conn = get_connection(&self.pool)?;
        let quarter = find_quarter(&mut conn, quarter_id)?;
        let groups = group_snapshots::table
            .filter(group_snapshots::quarter_id.eq(quarter_id))
            .select(GroupSnapshotDB::as_select())
            .order(group_snapshots::group_name.asc())
            .load::<GroupSnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;
        let accounts = account_snapshots::table
            .filter(account_snapshots::quarter_id.eq(quarter_id))
            .select(AccountSnapshotDB::as_select())
            .order(account_snapshots::account_number.asc())
            .load::<AccountSnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(QuarterLedger::new(
            quarter,
            groups.into_iter().map(GroupSnapshot::from).collect(),
            accounts.into_iter().map(AccountSnapshot::from).collect(),
        ))
    }

    async fn save_ledger(&self, ledger: QuarterLedger) -> Result<QuarterLedger> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<QuarterLedger> {
                let (mut quarter, groups, accounts) = ledger.into_parts();
                let now = Utc::now().naive_utc();

                let updated = diesel::update(
                    quarters::table
                        .filter(quarters::id.eq(&quarter.id))
                        .filter(quarters::version.eq(quarter.version)),
                )
                .set((
                    quarters::aum.eq(decimal_to_text(quarter.aum)),
                    quarters::fee.eq(decimal_to_text(quarter.fee)),
                    quarters::status.eq(quarter.status.as_str()),
                    quarters::version.eq(quarter.version + 1),
                    quarters::updated_at.eq(now),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;

                if updated == 0 {
                    // Either the quarter is gone or someone saved first.
                    find_quarter(conn, &quarter.id)?;
                    return Err(BillingError::ConcurrentModification {
                        quarter_id: quarter.id,
                        expected_version: quarter.version,
                    }
                    .into());
                }

                delete_snapshots(conn, &quarter.id)?;

                let group_rows: Vec<GroupSnapshotDB> =
                    groups.iter().cloned().map(GroupSnapshotDB::from).collect();
                for chunk in chunk_for_insert(&group_rows, GROUP_SNAPSHOT_COLUMNS) {
                    diesel::insert_into(group_snapshots::table)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                let account_rows: Vec<AccountSnapshotDB> =
                    accounts.iter().cloned().map(AccountSnapshotDB::from).collect();
                for chunk in chunk_for_insert(&account_rows, ACCOUNT_SNAPSHOT_COLUMNS) {
                    diesel::insert_into(account_snapshots::table)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                debug!(
                    "Saved quarter {} at version {} ({} group / {} account snapshots)",
                    quarter.id,
                    quarter.version + 1,
                    group_rows.len(),
                    account_rows.len()
                );

                quarter.version += 1;
                quarter.updated_at = now;
                Ok(QuarterLedger::new(quarter, groups, accounts))
            })
            .await
    }

    fn get_account_snapshot(&self, snapshot_id: &str) -> Result<AccountSnapshot> {
        let mut conn = get_connection(&self.pool)?;
        account_snapshots::table
            .find(snapshot_id)
            .select(AccountSnapshotDB::as_select())
            .first::<AccountSnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(AccountSnapshot::from)
            .ok_or_else(|| {
                BillingError::NotFound {
                    entity: "AccountSnapshot",
                    id: snapshot_id.to_string(),
                }
                .into()
            })
    }

    fn get_group_snapshot(&self, snapshot_id: &str) -> Result<GroupSnapshot> {
        let mut conn = get_connection(&self.pool)?;
        group_snapshots::table
            .find(snapshot_id)
            .select(GroupSnapshotDB::as_select())
            .first::<GroupSnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(GroupSnapshot::from)
            .ok_or_else(|| {
                BillingError::NotFound {
                    entity: "GroupSnapshot",
                    id: snapshot_id.to_string(),
                }
                .into()
            })
    }

    fn list_account_snapshots_for_account(&self, account_id: &str) -> Result<Vec<AccountSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let results = account_snapshots::table
            .filter(account_snapshots::account_id.eq(account_id))
            .select(AccountSnapshotDB::as_select())
            .load::<AccountSnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(results.into_iter().map(AccountSnapshot::from).collect())
    }
}
