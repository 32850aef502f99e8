//! Database models for quarters and snapshots.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use log::warn;

use wealthdesk_core::billing::{AccountSnapshot, GroupSnapshot, Quarter, QuarterStatus};

use crate::utils::{decimal_to_text, text_to_decimal};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::quarters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuarterDB {
    pub id: String,
    pub name: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub aum: String,
    pub fee: String,
    pub status: String,
    pub version: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<QuarterDB> for Quarter {
    fn from(db: QuarterDB) -> Self {
        let status = db.status.parse::<QuarterStatus>().unwrap_or_else(|_| {
            warn!(
                "Quarter {} has unknown status '{}', treating it as OPEN",
                db.id, db.status
            );
            QuarterStatus::Open
        });
        Self {
            id: db.id,
            name: db.name,
            from_date: db.from_date,
            to_date: db.to_date,
            aum: text_to_decimal(&db.aum),
            fee: text_to_decimal(&db.fee),
            status,
            version: db.version,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<&Quarter> for QuarterDB {
    fn from(domain: &Quarter) -> Self {
        Self {
            id: domain.id.clone(),
            name: domain.name.clone(),
            from_date: domain.from_date,
            to_date: domain.to_date,
            aum: decimal_to_text(domain.aum),
            fee: decimal_to_text(domain.fee),
            status: domain.status.as_str().to_string(),
            version: domain.version,
            created_at: domain.created_at,
            updated_at: domain.updated_at,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::group_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GroupSnapshotDB {
    pub id: String,
    pub quarter_id: String,
    pub group_id: String,
    pub group_name: String,
    pub fee_schedule_id: Option<String>,
    pub market_value: String,
    pub fee: String,
}

impl From<GroupSnapshotDB> for GroupSnapshot {
    fn from(db: GroupSnapshotDB) -> Self {
        Self {
            id: db.id,
            quarter_id: db.quarter_id,
            group_id: db.group_id,
            group_name: db.group_name,
            fee_schedule_id: db.fee_schedule_id,
            market_value: text_to_decimal(&db.market_value),
            fee: text_to_decimal(&db.fee),
        }
    }
}

impl From<GroupSnapshot> for GroupSnapshotDB {
    fn from(domain: GroupSnapshot) -> Self {
        Self {
            id: domain.id,
            quarter_id: domain.quarter_id,
            group_id: domain.group_id,
            group_name: domain.group_name,
            fee_schedule_id: domain.fee_schedule_id,
            market_value: decimal_to_text(domain.market_value),
            fee: decimal_to_text(domain.fee),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::account_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountSnapshotDB {
    pub id: String,
    pub quarter_id: String,
    pub account_id: String,
    pub account_number: String,
    pub group_id: Option<String>,
    pub group_snapshot_id: Option<String>,
    pub snapshot_date: NaiveDate,
    pub market_value: String,
    pub billable: bool,
    pub fee_schedule_id: Option<String>,
    pub group_weight: Option<String>,
    pub fee: String,
}

impl From<AccountSnapshotDB> for AccountSnapshot {
    fn from(db: AccountSnapshotDB) -> Self {
        Self {
            id: db.id,
            quarter_id: db.quarter_id,
            account_id: db.account_id,
            account_number: db.account_number,
            group_id: db.group_id,
            group_snapshot_id: db.group_snapshot_id,
            snapshot_date: db.snapshot_date,
            market_value: text_to_decimal(&db.market_value),
            billable: db.billable,
            fee_schedule_id: db.fee_schedule_id,
            group_weight: db.group_weight.as_deref().map(text_to_decimal),
            fee: text_to_decimal(&db.fee),
        }
    }
}

impl From<AccountSnapshot> for AccountSnapshotDB {
    fn from(domain: AccountSnapshot) -> Self {
        Self {
            id: domain.id,
            quarter_id: domain.quarter_id,
            account_id: domain.account_id,
            account_number: domain.account_number,
            group_id: domain.group_id,
            group_snapshot_id: domain.group_snapshot_id,
            snapshot_date: domain.snapshot_date,
            market_value: decimal_to_text(domain.market_value),
            billable: domain.billable,
            fee_schedule_id: domain.fee_schedule_id,
            group_weight: domain.group_weight.map(decimal_to_text),
            fee: decimal_to_text(domain.fee),
        }
    }
}
