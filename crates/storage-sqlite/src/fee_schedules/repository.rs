use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use wealthdesk_core::fee_schedules::{
    FeeRule, FeeRuleUpdate, FeeSchedule, FeeScheduleImportRow, FeeScheduleRepositoryTrait,
    FeeScheduleUpdate, NewFeeRule, NewFeeSchedule,
};
use wealthdesk_core::Result;

use super::model::{FeeRuleDB, FeeScheduleDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{accounts, billing_groups, fee_rules, fee_schedules};
use crate::utils::decimal_to_text;

pub struct FeeScheduleRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl FeeScheduleRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        FeeScheduleRepository { pool, writer }
    }
}

fn load_schedule(conn: &mut SqliteConnection, schedule_id: &str) -> Result<FeeSchedule> {
    let schedule = fee_schedules::table
        .find(schedule_id)
        .select(FeeScheduleDB::as_select())
        .first::<FeeScheduleDB>(conn)
        .map_err(StorageError::from)?;
    let rules = fee_rules::table
        .filter(fee_rules::schedule_id.eq(schedule_id))
        .select(FeeRuleDB::as_select())
        .load::<FeeRuleDB>(conn)
        .map_err(StorageError::from)?;
    Ok(schedule.into_domain(rules))
}

fn insert_schedule(conn: &mut SqliteConnection, schedule_id: String, name: String) -> Result<()> {
    let now = Utc::now().naive_utc();
    let schedule_db = FeeScheduleDB {
        id: schedule_id,
        name,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(fee_schedules::table)
        .values(&schedule_db)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

fn touch_schedule(conn: &mut SqliteConnection, schedule_id: &str) -> Result<()> {
    diesel::update(fee_schedules::table.find(schedule_id))
        .set(fee_schedules::updated_at.eq(Utc::now().naive_utc()))
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

#[async_trait]
impl FeeScheduleRepositoryTrait for FeeScheduleRepository {
    fn get_by_id(&self, schedule_id: &str) -> Result<FeeSchedule> {
        let mut conn = get_connection(&self.pool)?;
        load_schedule(&mut conn, schedule_id)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<FeeSchedule>> {
        let mut conn = get_connection(&self.pool)?;
        let found = fee_schedules::table
            .filter(fee_schedules::name.eq(name))
            .select(fee_schedules::id)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        match found {
            Some(schedule_id) => Ok(Some(load_schedule(&mut conn, &schedule_id)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<FeeSchedule>> {
        let mut conn = get_connection(&self.pool)?;
        let schedules = fee_schedules::table
            .select(FeeScheduleDB::as_select())
            .order(fee_schedules::name.asc())
            .load::<FeeScheduleDB>(&mut conn)
            .map_err(StorageError::from)?;
        let all_rules = fee_rules::table
            .select(FeeRuleDB::as_select())
            .load::<FeeRuleDB>(&mut conn)
            .map_err(StorageError::from)?;

        let mut rules_by_schedule: HashMap<String, Vec<FeeRuleDB>> = HashMap::new();
        for rule in all_rules {
            rules_by_schedule
                .entry(rule.schedule_id.clone())
                .or_default()
                .push(rule);
        }

        Ok(schedules
            .into_iter()
            .map(|s| {
                let rules = rules_by_schedule.remove(&s.id).unwrap_or_default();
                s.into_domain(rules)
            })
            .collect())
    }

    async fn create(&self, new_schedule: NewFeeSchedule) -> Result<FeeSchedule> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FeeSchedule> {
                let schedule_id = new_schedule
                    .id
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                insert_schedule(conn, schedule_id.clone(), new_schedule.name)?;
                load_schedule(conn, &schedule_id)
            })
            .await
    }

    async fn update(&self, schedule_update: FeeScheduleUpdate) -> Result<FeeSchedule> {
        let schedule_id = schedule_update.id.unwrap_or_default();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FeeSchedule> {
                diesel::update(fee_schedules::table.find(&schedule_id))
                    .set((
                        fee_schedules::name.eq(schedule_update.name),
                        fee_schedules::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                load_schedule(conn, &schedule_id)
            })
            .await
    }

    async fn delete(&self, schedule_id: &str) -> Result<usize> {
        let schedule_id = schedule_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(fee_rules::table.filter(fee_rules::schedule_id.eq(&schedule_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(diesel::delete(fee_schedules::table.find(&schedule_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    fn is_assigned(&self, schedule_id: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;
        let groups = billing_groups::table
            .filter(billing_groups::fee_schedule_id.eq(schedule_id))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        let account_count = accounts::table
            .filter(accounts::fee_schedule_id.eq(schedule_id))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(groups + account_count > 0)
    }

    fn get_rule(&self, rule_id: &str) -> Result<FeeRule> {
        let mut conn = get_connection(&self.pool)?;
        let rule = fee_rules::table
            .find(rule_id)
            .select(FeeRuleDB::as_select())
            .first::<FeeRuleDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rule.into())
    }

    async fn create_rule(&self, new_rule: NewFeeRule) -> Result<FeeRule> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FeeRule> {
                let mut rule_db: FeeRuleDB = new_rule.into();
                if rule_db.id.is_empty() {
                    rule_db.id = Uuid::new_v4().to_string();
                }
                let result_db = diesel::insert_into(fee_rules::table)
                    .values(&rule_db)
                    .returning(FeeRuleDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                touch_schedule(conn, &result_db.schedule_id)?;
                Ok(result_db.into())
            })
            .await
    }

    async fn update_rule(&self, rule_update: FeeRuleUpdate) -> Result<FeeRule> {
        let rule_id = rule_update.id.clone().unwrap_or_default();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<FeeRule> {
                let existing = fee_rules::table
                    .find(&rule_id)
                    .select(FeeRuleDB::as_select())
                    .first::<FeeRuleDB>(conn)
                    .map_err(StorageError::from)?;
                let rule_db = FeeRuleDB {
                    id: existing.id,
                    schedule_id: existing.schedule_id,
                    minimum: decimal_to_text(rule_update.minimum),
                    maximum: rule_update.maximum.map(decimal_to_text),
                    rate: decimal_to_text(rule_update.rate),
                    flat: decimal_to_text(rule_update.flat),
                };
                diesel::update(fee_rules::table.find(&rule_id))
                    .set(&rule_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                touch_schedule(conn, &rule_db.schedule_id)?;
                Ok(rule_db.into())
            })
            .await
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<usize> {
        let rule_id = rule_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(fee_rules::table.find(rule_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    async fn import_rows(&self, rows: Vec<FeeScheduleImportRow>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut ids_by_name: HashMap<String, String> = HashMap::new();
                let mut created = 0;
                for row in rows {
                    let schedule_id = match ids_by_name.get(&row.schedule_name) {
                        Some(existing) => existing.clone(),
                        None => {
                            let found = fee_schedules::table
                                .filter(fee_schedules::name.eq(&row.schedule_name))
                                .select(fee_schedules::id)
                                .first::<String>(conn)
                                .optional()
                                .map_err(StorageError::from)?;
                            let schedule_id = match found {
                                Some(found) => found,
                                None => {
                                    let new_id = Uuid::new_v4().to_string();
                                    insert_schedule(conn, new_id.clone(), row.schedule_name.clone())?;
                                    new_id
                                }
                            };
                            ids_by_name.insert(row.schedule_name.clone(), schedule_id.clone());
                            schedule_id
                        }
                    };

                    let rule_db = FeeRuleDB {
                        id: Uuid::new_v4().to_string(),
                        schedule_id,
                        minimum: decimal_to_text(row.minimum),
                        maximum: row.maximum.map(decimal_to_text),
                        rate: decimal_to_text(row.rate),
                        flat: decimal_to_text(row.flat),
                    };
                    diesel::insert_into(fee_rules::table)
                        .values(&rule_db)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    created += 1;
                }
                Ok(created)
            })
            .await
    }
}
