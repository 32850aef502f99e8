//! Tests for account and group domain model validation.

#[cfg(test)]
mod tests {
    use crate::accounts::{AccountUpdate, NewAccount};
    use crate::groups::{Client, NewClient, NewGroup};

    fn new_account(number: &str) -> NewAccount {
        NewAccount {
            id: None,
            account_number: number.to_string(),
            description: Some("Joint brokerage".to_string()),
            client_id: None,
            group_id: None,
            custodian: Some("Schwab".to_string()),
            billable: true,
            discretionary: true,
            fee_schedule_id: None,
        }
    }

    #[test]
    fn test_new_account_requires_number() {
        assert!(new_account("123-456").validate().is_ok());
        assert!(new_account("   ").validate().is_err());
    }

    #[test]
    fn test_account_update_requires_id() {
        let update = AccountUpdate {
            id: None,
            account_number: "123".to_string(),
            description: None,
            client_id: None,
            group_id: None,
            custodian: None,
            billable: false,
            discretionary: false,
            fee_schedule_id: None,
        };
        assert!(update.validate().is_err());

        let update = AccountUpdate {
            id: Some("acc-1".to_string()),
            ..update
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_new_account_deserializes_camel_case() {
        let json = r#"{
            "accountNumber": "987",
            "description": null,
            "clientId": "client-1",
            "groupId": null,
            "custodian": null,
            "billable": true,
            "discretionary": false,
            "feeScheduleId": null
        }"#;
        let account: NewAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.account_number, "987");
        assert_eq!(account.client_id.as_deref(), Some("client-1"));
        assert!(account.billable);
    }

    #[test]
    fn test_group_and_client_validation() {
        let group = NewGroup {
            id: None,
            name: "".to_string(),
            fee_schedule_id: None,
        };
        assert!(group.validate().is_err());

        let client = NewClient {
            id: None,
            first_name: "Ada".to_string(),
            middle_name: None,
            last_name: "".to_string(),
            email: None,
            group_id: None,
        };
        assert!(client.validate().is_err());
    }

    #[test]
    fn test_client_full_name() {
        let mut client = Client {
            id: "c1".to_string(),
            first_name: "Ada".to_string(),
            middle_name: Some("King".to_string()),
            last_name: "Lovelace".to_string(),
            email: None,
            group_id: None,
        };
        assert_eq!(client.full_name(), "Ada King Lovelace");
        client.middle_name = Some(String::new());
        assert_eq!(client.full_name(), "Ada Lovelace");
    }
}
