//! Database models for fee schedules.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use wealthdesk_core::fee_schedules::{FeeRule, FeeSchedule, NewFeeRule};

use crate::utils::{decimal_to_text, text_to_decimal};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::fee_schedules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FeeScheduleDB {
    pub id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl FeeScheduleDB {
    pub fn into_domain(self, rules: Vec<FeeRuleDB>) -> FeeSchedule {
        let mut rules: Vec<FeeRule> = rules.into_iter().map(FeeRule::from).collect();
        // Minimums are stored as TEXT, so order after parsing.
        rules.sort_by(|a, b| a.minimum.cmp(&b.minimum));
        FeeSchedule {
            id: self.id,
            name: self.name,
            rules,
        }
    }
}

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::fee_rules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct FeeRuleDB {
    pub id: String,
    pub schedule_id: String,
    pub minimum: String,
    pub maximum: Option<String>,
    pub rate: String,
    pub flat: String,
}

impl From<FeeRuleDB> for FeeRule {
    fn from(db: FeeRuleDB) -> Self {
        Self {
            id: db.id,
            schedule_id: db.schedule_id,
            minimum: text_to_decimal(&db.minimum),
            maximum: db.maximum.as_deref().map(text_to_decimal),
            rate: text_to_decimal(&db.rate),
            flat: text_to_decimal(&db.flat),
        }
    }
}

impl From<NewFeeRule> for FeeRuleDB {
    fn from(domain: NewFeeRule) -> Self {
        Self {
            id: domain.id.unwrap_or_default(),
            schedule_id: domain.schedule_id,
            minimum: decimal_to_text(domain.minimum),
            maximum: domain.maximum.map(decimal_to_text),
            rate: decimal_to_text(domain.rate),
            flat: decimal_to_text(domain.flat),
        }
    }
}
