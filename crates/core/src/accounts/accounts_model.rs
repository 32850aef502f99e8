//! Account domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{invalid_input, Result};

/// Domain model representing a custodial account.
///
/// Only `billable` accounts are charged. `group_id` is denormalized from
/// the owning client so the roll-up never has to walk the client table.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub account_number: String,
    pub description: Option<String>,
    pub client_id: Option<String>,
    pub group_id: Option<String>,
    /// Custodian name (e.g. the broker holding the assets)
    pub custodian: Option<String>,
    pub billable: bool,
    pub discretionary: bool,
    /// Used only when the account is billed on its own, outside a group.
    pub fee_schedule_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub account_number: String,
    pub description: Option<String>,
    pub client_id: Option<String>,
    /// Defaults to the client's group when omitted.
    pub group_id: Option<String>,
    pub custodian: Option<String>,
    pub billable: bool,
    pub discretionary: bool,
    pub fee_schedule_id: Option<String>,
}

impl NewAccount {
    pub fn validate(&self) -> Result<()> {
        if self.account_number.trim().is_empty() {
            return Err(invalid_input("Account number cannot be empty"));
        }
        Ok(())
    }
}

/// Input model for updating an existing account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub id: Option<String>,
    pub account_number: String,
    pub description: Option<String>,
    pub client_id: Option<String>,
    pub group_id: Option<String>,
    pub custodian: Option<String>,
    pub billable: bool,
    pub discretionary: bool,
    pub fee_schedule_id: Option<String>,
}

impl AccountUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_none() {
            return Err(invalid_input("Account ID is required for updates"));
        }
        if self.account_number.trim().is_empty() {
            return Err(invalid_input("Account number cannot be empty"));
        }
        Ok(())
    }
}
