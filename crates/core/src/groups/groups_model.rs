//! Billing group and client domain models.

use serde::{Deserialize, Serialize};

use crate::errors::{invalid_input, Result};

/// A billing household: fees are computed on the combined value of the
/// accounts of its clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub fee_schedule_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub fee_schedule_id: Option<String>,
}

impl NewGroup {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(invalid_input("Group name cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    pub id: Option<String>,
    pub name: String,
    pub fee_schedule_id: Option<String>,
}

impl GroupUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_none() {
            return Err(invalid_input("Group ID is required for updates"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid_input("Group name cannot be empty"));
        }
        Ok(())
    }
}

/// A person owning accounts, optionally part of a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub group_id: Option<String>,
}

impl Client {
    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub group_id: Option<String>,
}

impl NewClient {
    pub fn validate(&self) -> Result<()> {
        validate_client_name(&self.first_name, &self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUpdate {
    pub id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub group_id: Option<String>,
}

impl ClientUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_none() {
            return Err(invalid_input("Client ID is required for updates"));
        }
        validate_client_name(&self.first_name, &self.last_name)
    }
}

fn validate_client_name(first_name: &str, last_name: &str) -> Result<()> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(invalid_input("Client first and last name are required"));
    }
    Ok(())
}
