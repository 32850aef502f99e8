#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    use crate::errors::{BillingError, Error, Result};
    use crate::fee_schedules::{
        FeeRule, FeeRuleUpdate, FeeSchedule, FeeScheduleImportRow, FeeScheduleRepositoryTrait,
        FeeScheduleUpdate, NewFeeRule, NewFeeSchedule,
    };
    use crate::groups::{
        Client, ClientImportRow, ClientUpdate, Group, GroupRepositoryTrait, GroupService,
        GroupServiceTrait, GroupUpdate, NewClient, NewGroup,
    };

    fn not_found(entity: &'static str, id: &str) -> Error {
        BillingError::NotFound {
            entity,
            id: id.to_string(),
        }
        .into()
    }

    #[derive(Default)]
    struct MockGroupRepository {
        groups: Mutex<Vec<Group>>,
        clients: Mutex<Vec<Client>>,
        next_id: Mutex<u32>,
    }

    impl MockGroupRepository {
        fn next_id(&self, prefix: &str) -> String {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("{}-{}", prefix, next)
        }
    }

    #[async_trait]
    impl GroupRepositoryTrait for MockGroupRepository {
        fn get_by_id(&self, group_id: &str) -> Result<Group> {
            self.groups
                .lock()
                .unwrap()
                .iter()
                .find(|g| g.id == group_id)
                .cloned()
                .ok_or_else(|| not_found("Group", group_id))
        }

        fn find_by_name(&self, name: &str) -> Result<Option<Group>> {
            Ok(self
                .groups
                .lock()
                .unwrap()
                .iter()
                .find(|g| g.name == name)
                .cloned())
        }

        fn list(&self) -> Result<Vec<Group>> {
            Ok(self.groups.lock().unwrap().clone())
        }

        async fn create(&self, new_group: NewGroup) -> Result<Group> {
            let group = Group {
                id: new_group.id.unwrap_or_else(|| self.next_id("g")),
                name: new_group.name,
                fee_schedule_id: new_group.fee_schedule_id,
            };
            self.groups.lock().unwrap().push(group.clone());
            Ok(group)
        }

        async fn update(&self, _group_update: GroupUpdate) -> Result<Group> {
            unimplemented!()
        }

        async fn delete(&self, group_id: &str) -> Result<usize> {
            let mut groups = self.groups.lock().unwrap();
            let before = groups.len();
            groups.retain(|g| g.id != group_id);
            Ok(before - groups.len())
        }

        fn count_members(&self, group_id: &str) -> Result<usize> {
            Ok(self
                .clients
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.group_id.as_deref() == Some(group_id))
                .count())
        }

        async fn set_fee_schedule(
            &self,
            group_ids: Vec<String>,
            fee_schedule_id: Option<String>,
        ) -> Result<usize> {
            let mut groups = self.groups.lock().unwrap();
            let mut updated = 0;
            for group in groups.iter_mut().filter(|g| group_ids.contains(&g.id)) {
                group.fee_schedule_id = fee_schedule_id.clone();
                updated += 1;
            }
            Ok(updated)
        }

        fn get_client(&self, client_id: &str) -> Result<Client> {
            self.clients
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == client_id)
                .cloned()
                .ok_or_else(|| not_found("Client", client_id))
        }

        fn list_clients(&self, group_id: Option<&str>) -> Result<Vec<Client>> {
            Ok(self
                .clients
                .lock()
                .unwrap()
                .iter()
                .filter(|c| group_id.is_none() || c.group_id.as_deref() == group_id)
                .cloned()
                .collect())
        }

        async fn create_client(&self, new_client: NewClient) -> Result<Client> {
            let client = Client {
                id: new_client.id.unwrap_or_else(|| self.next_id("c")),
                first_name: new_client.first_name,
                middle_name: new_client.middle_name,
                last_name: new_client.last_name,
                email: new_client.email,
                group_id: new_client.group_id,
            };
            self.clients.lock().unwrap().push(client.clone());
            Ok(client)
        }

        async fn update_client(&self, _client_update: ClientUpdate) -> Result<Client> {
            unimplemented!()
        }

        async fn delete_client(&self, client_id: &str) -> Result<usize> {
            let mut clients = self.clients.lock().unwrap();
            let before = clients.len();
            clients.retain(|c| c.id != client_id);
            Ok(before - clients.len())
        }

        async fn import_clients(&self, rows: Vec<ClientImportRow>) -> Result<usize> {
            let count = rows.len();
            for row in rows {
                let group_id = match row.group_name {
                    Some(name) => Some(match self.find_by_name(&name)? {
                        Some(group) => group.id,
                        None => {
                            self.create(NewGroup {
                                id: None,
                                name,
                                fee_schedule_id: None,
                            })
                            .await?
                            .id
                        }
                    }),
                    None => None,
                };
                self.create_client(NewClient {
                    id: None,
                    first_name: row.first_name,
                    middle_name: row.middle_name,
                    last_name: row.last_name,
                    email: row.email,
                    group_id,
                })
                .await?;
            }
            Ok(count)
        }
    }

    struct MockFeeScheduleRepository;

    #[async_trait]
    impl FeeScheduleRepositoryTrait for MockFeeScheduleRepository {
        fn get_by_id(&self, schedule_id: &str) -> Result<FeeSchedule> {
            if schedule_id == "standard" {
                return Ok(FeeSchedule {
                    id: schedule_id.to_string(),
                    name: "Standard".to_string(),
                    rules: Vec::new(),
                });
            }
            Err(not_found("Fee schedule", schedule_id))
        }

        fn find_by_name(&self, _name: &str) -> Result<Option<FeeSchedule>> {
            unimplemented!()
        }

        fn list(&self) -> Result<Vec<FeeSchedule>> {
            unimplemented!()
        }

        async fn create(&self, _new_schedule: NewFeeSchedule) -> Result<FeeSchedule> {
            unimplemented!()
        }

        async fn update(&self, _schedule_update: FeeScheduleUpdate) -> Result<FeeSchedule> {
            unimplemented!()
        }

        async fn delete(&self, _schedule_id: &str) -> Result<usize> {
            unimplemented!()
        }

        fn is_assigned(&self, _schedule_id: &str) -> Result<bool> {
            unimplemented!()
        }

        fn get_rule(&self, _rule_id: &str) -> Result<FeeRule> {
            unimplemented!()
        }

        async fn create_rule(&self, _new_rule: NewFeeRule) -> Result<FeeRule> {
            unimplemented!()
        }

        async fn update_rule(&self, _rule_update: FeeRuleUpdate) -> Result<FeeRule> {
            unimplemented!()
        }

        async fn delete_rule(&self, _rule_id: &str) -> Result<usize> {
            unimplemented!()
        }

        async fn import_rows(&self, _rows: Vec<FeeScheduleImportRow>) -> Result<usize> {
            unimplemented!()
        }
    }

    fn service() -> (GroupService, Arc<MockGroupRepository>) {
        let repo = Arc::new(MockGroupRepository::default());
        (
            GroupService::new(repo.clone(), Arc::new(MockFeeScheduleRepository)),
            repo,
        )
    }

    fn new_group(name: &str) -> NewGroup {
        NewGroup {
            id: None,
            name: name.to_string(),
            fee_schedule_id: None,
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_group_is_not_found() {
        let (service, _) = service();
        let err = service.delete_group("missing").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Billing(BillingError::NotFound { entity: "Group", .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_group_with_members_is_refused() {
        let (service, _) = service();
        let group = service.create_group(new_group("Smith Household")).await.unwrap();
        let client = service
            .create_client(NewClient {
                id: None,
                first_name: "Ann".to_string(),
                middle_name: None,
                last_name: "Smith".to_string(),
                email: None,
                group_id: Some(group.id.clone()),
            })
            .await
            .unwrap();

        let err = service.delete_group(&group.id).await.unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));

        service.delete_client(&client.id).await.unwrap();
        service.delete_group(&group.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_unknown_client_is_not_found() {
        let (service, _) = service();
        let err = service.delete_client("missing").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Billing(BillingError::NotFound { entity: "Client", .. })
        ));
    }

    #[tokio::test]
    async fn test_clear_fee_schedule_of_unknown_group_is_not_found() {
        let (service, _) = service();
        let group = service.create_group(new_group("Jones")).await.unwrap();
        service
            .assign_fee_schedule("standard", vec![group.id.clone()])
            .await
            .unwrap();
        service.clear_fee_schedule(&group.id).await.unwrap();
        assert_eq!(service.get_group(&group.id).unwrap().fee_schedule_id, None);

        let err = service.clear_fee_schedule("missing").await.unwrap_err();
        assert!(matches!(err, Error::Billing(BillingError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_import_clients_creates_groups_and_skips_known_names() {
        let (service, repo) = service();
        service.create_group(new_group("Smith Household")).await.unwrap();
        service
            .create_client(NewClient {
                id: None,
                first_name: "Bob".to_string(),
                middle_name: None,
                last_name: "Jones".to_string(),
                email: None,
                group_id: None,
            })
            .await
            .unwrap();

        let csv = "First Name,Middle Name,Last Name,Email,Group\n\
                   Ann,,Smith,ann@example.com,Smith Household\n\
                   Bob,,Jones,,\n\
                   Cara,M,Lee,,Lee Family\n\
                   Ann,,Smith,,\n";
        let imported = service.import_clients_csv(csv).await.unwrap();
        assert_eq!(imported, 2);

        let groups = repo.list().unwrap();
        assert_eq!(groups.len(), 2);
        let lee = repo.find_by_name("Lee Family").unwrap().unwrap();
        let clients = service.get_clients(Some(&lee.id)).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].full_name(), "Cara M Lee");
        assert_eq!(service.get_clients(None).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_export_clients_csv() {
        let (service, _) = service();
        let csv = "First Name,Middle Name,Last Name,Email,Group\n\
                   Ann,,Smith,ann@example.com,Smith Household\n\
                   Bob,J,Jones,,\n";
        service.import_clients_csv(csv).await.unwrap();

        assert_eq!(service.export_clients_csv().unwrap(), csv);
    }

    #[tokio::test]
    async fn test_import_clients_rejects_nameless_rows() {
        let (service, repo) = service();
        let csv = "First Name,Middle Name,Last Name,Email,Group\n\
                   Ann,,Smith,,\n\
                   Bob,,,bob@example.com,\n";
        let err = service.import_clients_csv(csv).await.unwrap_err();
        assert!(matches!(err, Error::Billing(BillingError::Import { line: 3, .. })));
        assert!(repo.list_clients(None).unwrap().is_empty());
    }
}
