use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use wealthdesk_core::accounts::{Account, AccountRepositoryTrait, AccountUpdate, NewAccount};
use wealthdesk_core::Result;

use super::model::AccountDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::account_snapshots;
use crate::schema::accounts;
use crate::schema::accounts::dsl::*;

/// Repository for managing account data in the database
pub struct AccountRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AccountRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Account> {
                let mut account_db: AccountDB = new_account.into();
                if account_db.id.is_empty() {
                    account_db.id = uuid::Uuid::new_v4().to_string();
                }

                diesel::insert_into(accounts::table)
                    .values(&account_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(account_db.into())
            })
            .await
    }

    async fn create_many(&self, new_accounts: Vec<NewAccount>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut created = 0;
                for new_account in new_accounts {
                    let mut account_db: AccountDB = new_account.into();
                    if account_db.id.is_empty() {
                        account_db.id = uuid::Uuid::new_v4().to_string();
                    }
                    created += diesel::insert_into(accounts::table)
                        .values(&account_db)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(created)
            })
            .await
    }

    async fn update(&self, account_update: AccountUpdate) -> Result<Account> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Account> {
                let mut account_db: AccountDB = account_update.into();

                let existing = accounts
                    .select(AccountDB::as_select())
                    .find(&account_db.id)
                    .first::<AccountDB>(conn)
                    .map_err(StorageError::from)?;

                account_db.created_at = existing.created_at;

                diesel::update(accounts.find(&account_db.id))
                    .set(&account_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(account_db.into())
            })
            .await
    }

    async fn delete(&self, account_id: &str) -> Result<usize> {
        let account_id = account_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(accounts.find(account_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)?;

        let account = accounts
            .select(AccountDB::as_select())
            .find(account_id)
            .first::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(account.into())
    }

    fn find_by_number(&self, number: &str) -> Result<Option<Account>> {
        let mut conn = get_connection(&self.pool)?;

        let account = accounts
            .filter(account_number.eq(number))
            .select(AccountDB::as_select())
            .first::<AccountDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(account.map(Account::from))
    }

    /// Lists accounts ordered by number, optionally restricted to one group.
    fn list(&self, group_filter: Option<&str>) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = accounts::table.into_boxed();
        if let Some(group) = group_filter {
            query = query.filter(group_id.eq(group));
        }

        let results = query
            .select(AccountDB::as_select())
            .order(account_number.asc())
            .load::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(results.into_iter().map(Account::from).collect())
    }

    fn count_snapshots(&self, account_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)?;
        let count = account_snapshots::table
            .filter(account_snapshots::account_id.eq(account_id))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use tempfile::tempdir;

    fn create_test_repository() -> (AccountRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (AccountRepository::new(pool, writer), temp_dir)
    }

    fn new_account(number: &str) -> NewAccount {
        NewAccount {
            id: None,
            account_number: number.to_string(),
            description: Some("Joint brokerage".to_string()),
            client_id: None,
            group_id: None,
            custodian: Some("Schwab".to_string()),
            billable: true,
            discretionary: false,
            fee_schedule_id: None,
        }
    }

    #[tokio::test]
    async fn test_update_keeps_created_at_and_clears_optionals() {
        let (repo, _dir) = create_test_repository();
        let created = repo.create(new_account("1234-5678")).await.unwrap();

        let updated = repo
            .update(AccountUpdate {
                id: Some(created.id.clone()),
                account_number: "1234-5678".to_string(),
                description: None,
                client_id: None,
                group_id: None,
                custodian: None,
                billable: false,
                discretionary: true,
                fee_schedule_id: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        let reloaded = repo.get_by_id(&created.id).unwrap();
        assert_eq!(reloaded.description, None);
        assert!(!reloaded.billable);
        assert!(reloaded.discretionary);
    }

    #[tokio::test]
    async fn test_account_numbers_are_unique() {
        let (repo, _dir) = create_test_repository();
        repo.create(new_account("A-1")).await.unwrap();
        let err = repo.create(new_account("A-1")).await.unwrap_err();
        assert!(matches!(
            err,
            wealthdesk_core::Error::Database(wealthdesk_core::errors::DatabaseError::UniqueViolation(_))
        ));
        assert!(repo.find_by_number("A-1").unwrap().is_some());
        assert!(repo.find_by_number("B-2").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_number() {
        let (repo, _dir) = create_test_repository();
        repo.create(new_account("300")).await.unwrap();
        repo.create(new_account("100")).await.unwrap();

        let numbers: Vec<_> = repo
            .list(None)
            .unwrap()
            .into_iter()
            .map(|a| a.account_number)
            .collect();
        assert_eq!(numbers, vec!["100", "300"]);
        assert_eq!(repo.count_snapshots("anything").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_many_is_all_or_nothing() {
        let (repo, _dir) = create_test_repository();
        let created = repo
            .create_many(vec![new_account("100"), new_account("200")])
            .await
            .unwrap();
        assert_eq!(created, 2);

        let err = repo
            .create_many(vec![new_account("300"), new_account("100")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            wealthdesk_core::Error::Database(wealthdesk_core::errors::DatabaseError::UniqueViolation(_))
        ));
        assert!(repo.find_by_number("300").unwrap().is_none());
        assert_eq!(repo.list(None).unwrap().len(), 2);
    }
}
