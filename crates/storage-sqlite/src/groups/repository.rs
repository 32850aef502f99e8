use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use wealthdesk_core::groups::{
    Client, ClientImportRow, ClientUpdate, Group, GroupRepositoryTrait, GroupUpdate, NewClient,
    NewGroup,
};
use wealthdesk_core::Result;

use super::model::{ClientDB, GroupDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{accounts, billing_groups, clients};

pub struct GroupRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl GroupRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        GroupRepository { pool, writer }
    }
}

#[async_trait]
impl GroupRepositoryTrait for GroupRepository {
    fn get_by_id(&self, group_id: &str) -> Result<Group> {
        let mut conn = get_connection(&self.pool)?;
        let group = billing_groups::table
            .find(group_id)
            .select(GroupDB::as_select())
            .first::<GroupDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(group.into())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Group>> {
        let mut conn = get_connection(&self.pool)?;
        let group = billing_groups::table
            .filter(billing_groups::name.eq(name))
            .select(GroupDB::as_select())
            .first::<GroupDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(group.map(Group::from))
    }

    fn list(&self) -> Result<Vec<Group>> {
        let mut conn = get_connection(&self.pool)?;
        let groups = billing_groups::table
            .select(GroupDB::as_select())
            .order(billing_groups::name.asc())
            .load::<GroupDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(groups.into_iter().map(Group::from).collect())
    }

    async fn create(&self, new_group: NewGroup) -> Result<Group> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Group> {
                let mut group_db: GroupDB = new_group.into();
                if group_db.id.is_empty() {
                    group_db.id = Uuid::new_v4().to_string();
                }
                diesel::insert_into(billing_groups::table)
                    .values(&group_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(group_db.into())
            })
            .await
    }

    async fn update(&self, group_update: GroupUpdate) -> Result<Group> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Group> {
                let group_db: GroupDB = group_update.into();
                let updated = diesel::update(billing_groups::table.find(&group_db.id))
                    .set(&group_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(StorageError::from(diesel::result::Error::NotFound).into());
                }
                Ok(group_db.into())
            })
            .await
    }

    async fn delete(&self, group_id: &str) -> Result<usize> {
        let group_id = group_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(billing_groups::table.find(group_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    fn count_members(&self, group_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        let client_count = clients::table
            .filter(clients::group_id.eq(group_id))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        let account_count = accounts::table
            .filter(accounts::group_id.eq(group_id))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok((client_count + account_count) as usize)
    }

    async fn set_fee_schedule(
        &self,
        group_ids: Vec<String>,
        fee_schedule_id: Option<String>,
    ) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(
                    diesel::update(billing_groups::table.filter(billing_groups::id.eq_any(&group_ids)))
                        .set(billing_groups::fee_schedule_id.eq(fee_schedule_id))
                        .execute(conn)
                        .map_err(StorageError::from)?,
                )
            })
            .await
    }

    fn get_client(&self, client_id: &str) -> Result<Client> {
        let mut conn = get_connection(&self.pool)?;
        let client = clients::table
            .find(client_id)
            .select(ClientDB::as_select())
            .first::<ClientDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(client.into())
    }

    fn list_clients(&self, group_id: Option<&str>) -> Result<Vec<Client>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = clients::table.into_boxed();
        if let Some(group_id) = group_id {
            query = query.filter(clients::group_id.eq(group_id));
        }
        let results = query
            .select(ClientDB::as_select())
            .order((clients::last_name.asc(), clients::first_name.asc()))
            .load::<ClientDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(results.into_iter().map(Client::from).collect())
    }

    async fn create_client(&self, new_client: NewClient) -> Result<Client> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Client> {
                let mut client_db: ClientDB = new_client.into();
                if client_db.id.is_empty() {
                    client_db.id = Uuid::new_v4().to_string();
                }
                diesel::insert_into(clients::table)
                    .values(&client_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(client_db.into())
            })
            .await
    }

    async fn update_client(&self, client_update: ClientUpdate) -> Result<Client> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Client> {
                let client_db: ClientDB = client_update.into();
                let updated = diesel::update(clients::table.find(&client_db.id))
                    .set(&client_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(StorageError::from(diesel::result::Error::NotFound).into());
                }
                Ok(client_db.into())
            })
            .await
    }

    async fn delete_client(&self, client_id: &str) -> Result<usize> {
        let client_id = client_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                // Accounts keep their own group; only the client link goes.
                diesel::update(accounts::table.filter(accounts::client_id.eq(&client_id)))
                    .set(accounts::client_id.eq(None::<String>))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(diesel::delete(clients::table.find(&client_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    async fn import_clients(&self, rows: Vec<ClientImportRow>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut ids_by_name: HashMap<String, String> = HashMap::new();
                let mut created = 0;
                for row in rows {
                    let group_id = match row.group_name {
                        Some(name) => Some(match ids_by_name.get(&name) {
                            Some(existing) => existing.clone(),
                            None => {
                                let found = billing_groups::table
                                    .filter(billing_groups::name.eq(&name))
                                    .select(billing_groups::id)
                                    .first::<String>(conn)
                                    .optional()
                                    .map_err(StorageError::from)?;
                                let group_id = match found {
                                    Some(found) => found,
                                    None => {
                                        let group_db = GroupDB {
                                            id: Uuid::new_v4().to_string(),
                                            name: name.clone(),
                                            fee_schedule_id: None,
                                        };
                                        diesel::insert_into(billing_groups::table)
                                            .values(&group_db)
                                            .execute(conn)
                                            .map_err(StorageError::from)?;
                                        group_db.id
                                    }
                                };
                                ids_by_name.insert(name, group_id.clone());
                                group_id
                            }
                        }),
                        None => None,
                    };

                    let client_db = ClientDB {
                        id: Uuid::new_v4().to_string(),
                        first_name: row.first_name,
                        middle_name: row.middle_name,
                        last_name: row.last_name,
                        email: row.email,
                        group_id,
                    };
                    created += diesel::insert_into(clients::table)
                        .values(&client_db)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(created)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use tempfile::tempdir;

    fn create_test_repository() -> (GroupRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (GroupRepository::new(pool, writer), temp_dir)
    }

    fn new_group(id: &str, name: &str) -> NewGroup {
        NewGroup {
            id: Some(id.to_string()),
            name: name.to_string(),
            fee_schedule_id: None,
        }
    }

    #[tokio::test]
    async fn test_members_are_counted_across_clients() {
        let (repo, _dir) = create_test_repository();
        repo.create(new_group("g-smith", "Smith Household")).await.unwrap();
        assert_eq!(repo.count_members("g-smith").unwrap(), 0);

        repo.create_client(NewClient {
            id: None,
            first_name: "Ann".to_string(),
            middle_name: None,
            last_name: "Smith".to_string(),
            email: None,
            group_id: Some("g-smith".to_string()),
        })
        .await
        .unwrap();

        assert_eq!(repo.count_members("g-smith").unwrap(), 1);
        assert_eq!(repo.list_clients(Some("g-smith")).unwrap().len(), 1);
        assert!(repo.list_clients(Some("other")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_fee_schedule_touches_listed_groups_only() {
        let (repo, _dir) = create_test_repository();
        repo.create(new_group("a", "Alpha")).await.unwrap();
        repo.create(new_group("b", "Beta")).await.unwrap();

        // No schedule row exists, so use clearing to stay within the foreign key.
        let changed = repo
            .set_fee_schedule(vec!["a".to_string(), "missing".to_string()], None)
            .await
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(repo.find_by_name("Beta").unwrap().unwrap().id, "b");
    }

    #[tokio::test]
    async fn test_update_unknown_group_is_not_found() {
        let (repo, _dir) = create_test_repository();
        let err = repo
            .update(GroupUpdate {
                id: Some("nope".to_string()),
                name: "Nope".to_string(),
                fee_schedule_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            wealthdesk_core::Error::Database(wealthdesk_core::errors::DatabaseError::NotFound(_))
        ));
    }

    fn import_row(line: usize, first: &str, last: &str, group: Option<&str>) -> ClientImportRow {
        ClientImportRow {
            line,
            first_name: first.to_string(),
            middle_name: None,
            last_name: last.to_string(),
            email: None,
            group_name: group.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_import_clients_reuses_and_creates_groups() {
        let (repo, _dir) = create_test_repository();
        repo.create(new_group("g-smith", "Smith Household")).await.unwrap();

        let created = repo
            .import_clients(vec![
                import_row(2, "Ann", "Smith", Some("Smith Household")),
                import_row(3, "Cara", "Lee", Some("Lee Family")),
                import_row(4, "Dan", "Lee", Some("Lee Family")),
                import_row(5, "Bob", "Jones", None),
            ])
            .await
            .unwrap();
        assert_eq!(created, 4);

        assert_eq!(repo.list().unwrap().len(), 2);
        assert_eq!(repo.list_clients(Some("g-smith")).unwrap().len(), 1);
        let lee = repo.find_by_name("Lee Family").unwrap().unwrap();
        assert_eq!(repo.count_members(&lee.id).unwrap(), 2);
        assert_eq!(repo.list_clients(None).unwrap().len(), 4);
    }
}
