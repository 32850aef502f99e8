//! Database model for accounts.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use wealthdesk_core::accounts::{Account, AccountUpdate, NewAccount};

/// Database model for accounts
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct AccountDB {
    pub id: String,
    pub account_number: String,
    pub description: Option<String>,
    pub client_id: Option<String>,
    pub group_id: Option<String>,
    pub custodian: Option<String>,
    pub billable: bool,
    pub discretionary: bool,
    pub fee_schedule_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<AccountDB> for Account {
    fn from(db: AccountDB) -> Self {
        Self {
            id: db.id,
            account_number: db.account_number,
            description: db.description,
            client_id: db.client_id,
            group_id: db.group_id,
            custodian: db.custodian,
            billable: db.billable,
            discretionary: db.discretionary,
            fee_schedule_id: db.fee_schedule_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewAccount> for AccountDB {
    fn from(domain: NewAccount) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: domain.id.unwrap_or_default(),
            account_number: domain.account_number,
            description: domain.description,
            client_id: domain.client_id,
            group_id: domain.group_id,
            custodian: domain.custodian,
            billable: domain.billable,
            discretionary: domain.discretionary,
            fee_schedule_id: domain.fee_schedule_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<AccountUpdate> for AccountDB {
    fn from(domain: AccountUpdate) -> Self {
        Self {
            id: domain.id.unwrap_or_default(),
            account_number: domain.account_number,
            description: domain.description,
            client_id: domain.client_id,
            group_id: domain.group_id,
            custodian: domain.custodian,
            billable: domain.billable,
            discretionary: domain.discretionary,
            fee_schedule_id: domain.fee_schedule_id,
            created_at: NaiveDateTime::default(), // filled from the existing record
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
