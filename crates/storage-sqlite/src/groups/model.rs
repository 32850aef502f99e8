//! Database models for billing groups and clients.

use diesel::prelude::*;

use wealthdesk_core::groups::{Client, ClientUpdate, Group, GroupUpdate, NewClient, NewGroup};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::billing_groups)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct GroupDB {
    pub id: String,
    pub name: String,
    pub fee_schedule_id: Option<String>,
}

impl From<GroupDB> for Group {
    fn from(db: GroupDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            fee_schedule_id: db.fee_schedule_id,
        }
    }
}

impl From<NewGroup> for GroupDB {
    fn from(domain: NewGroup) -> Self {
        Self {
            id: domain.id.unwrap_or_default(),
            name: domain.name,
            fee_schedule_id: domain.fee_schedule_id,
        }
    }
}

impl From<GroupUpdate> for GroupDB {
    fn from(domain: GroupUpdate) -> Self {
        Self {
            id: domain.id.unwrap_or_default(),
            name: domain.name,
            fee_schedule_id: domain.fee_schedule_id,
        }
    }
}

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::clients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ClientDB {
    pub id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub group_id: Option<String>,
}

impl From<ClientDB> for Client {
    fn from(db: ClientDB) -> Self {
        Self {
            id: db.id,
            first_name: db.first_name,
            middle_name: db.middle_name,
            last_name: db.last_name,
            email: db.email,
            group_id: db.group_id,
        }
    }
}

impl From<NewClient> for ClientDB {
    fn from(domain: NewClient) -> Self {
        Self {
            id: domain.id.unwrap_or_default(),
            first_name: domain.first_name,
            middle_name: domain.middle_name,
            last_name: domain.last_name,
            email: domain.email,
            group_id: domain.group_id,
        }
    }
}

impl From<ClientUpdate> for ClientDB {
    fn from(domain: ClientUpdate) -> Self {
        Self {
            id: domain.id.unwrap_or_default(),
            first_name: domain.first_name,
            middle_name: domain.middle_name,
            last_name: domain.last_name,
            email: domain.email,
            group_id: domain.group_id,
        }
    }
}
