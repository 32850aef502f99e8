#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::billing::{AccountSnapshot, Quarter, QuarterLedger, QuarterStatus};
    use crate::errors::{BillingError, Error};
    use crate::fee_schedules::{FeeRule, FeeSchedule};
    use crate::groups::Group;

    fn tiered_schedule() -> FeeSchedule {
        FeeSchedule {
            id: "tiered".to_string(),
            name: "Tiered".to_string(),
            rules: vec![
                FeeRule {
                    id: "r1".to_string(),
                    schedule_id: "tiered".to_string(),
                    minimum: dec!(0),
                    maximum: Some(dec!(100000)),
                    rate: dec!(0.04),
                    flat: dec!(50),
                },
                FeeRule {
                    id: "r2".to_string(),
                    schedule_id: "tiered".to_string(),
                    minimum: dec!(100000),
                    maximum: None,
                    rate: dec!(0.02),
                    flat: dec!(25),
                },
            ],
        }
    }

    fn smith_group() -> Group {
        Group {
            id: "g-smith".to_string(),
            name: "Smith Household".to_string(),
            fee_schedule_id: Some("tiered".to_string()),
        }
    }

    fn quarter() -> Quarter {
        let now = Utc::now().naive_utc();
        Quarter {
            id: "q1".to_string(),
            name: "2024 Q1".to_string(),
            from_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            aum: Decimal::ZERO,
            fee: Decimal::ZERO,
            status: QuarterStatus::Open,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn snapshot(id: &str, group_id: Option<&str>, market_value: Decimal, billable: bool) -> AccountSnapshot {
        AccountSnapshot {
            id: format!("as-{}", id),
            quarter_id: "q1".to_string(),
            account_id: format!("acc-{}", id),
            account_number: format!("100-{}", id),
            group_id: group_id.map(str::to_string),
            group_snapshot_id: None,
            snapshot_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            market_value,
            billable,
            fee_schedule_id: None,
            group_weight: None,
            fee: Decimal::ZERO,
        }
    }

    /// A quarter holding unlinked snapshots with a consistent `aum`.
    fn pending_ledger(snapshots: Vec<AccountSnapshot>) -> QuarterLedger {
        let mut q = quarter();
        q.aum = snapshots.iter().map(|s| s.market_value).sum();
        QuarterLedger::new(q, Vec::new(), snapshots)
    }

    fn smith_ledger() -> QuarterLedger {
        pending_ledger(vec![
            snapshot("a", Some("g-smith"), dec!(100000), true),
            snapshot("b", Some("g-smith"), dec!(50000), true),
        ])
    }

    fn fee_of(ledger: &QuarterLedger, snapshot_id: &str) -> Decimal {
        ledger.account_snapshot(snapshot_id).unwrap().fee
    }

    #[test]
    fn test_generate_group_snapshots_links_members() {
        let mut ledger = smith_ledger();
        let linked = ledger.generate_group_snapshots(&[smith_group()]).unwrap();

        assert_eq!(linked, 2);
        assert_eq!(ledger.group_snapshots().len(), 1);
        let gs = &ledger.group_snapshots()[0];
        assert_eq!(gs.market_value, dec!(150000));
        assert_eq!(gs.group_name, "Smith Household");
        assert_eq!(gs.fee_schedule_id.as_deref(), Some("tiered"));
        assert_eq!(ledger.members(&gs.id).count(), 2);
        assert_eq!(ledger.quarter().status, QuarterStatus::SnapshotsLinked);
        assert!(ledger.reconcile().is_empty());
    }

    #[test]
    fn test_generate_group_snapshots_is_idempotent() {
        let mut ledger = smith_ledger();
        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        let linked_again = ledger.generate_group_snapshots(&[smith_group()]).unwrap();

        assert_eq!(linked_again, 0);
        assert_eq!(ledger.group_snapshots().len(), 1);
        assert_eq!(ledger.group_snapshots()[0].market_value, dec!(150000));
    }

    #[test]
    fn test_generate_group_snapshots_unknown_group_changes_nothing() {
        let mut ledger = smith_ledger();
        let before = ledger.clone();
        let err = ledger.generate_group_snapshots(&[]).unwrap_err();

        assert!(matches!(
            err,
            Error::Billing(BillingError::NotFound { entity: "Group", .. })
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_calculate_fees_allocates_group_fee() {
        let mut ledger = smith_ledger();
        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        let zeroed = ledger.calculate_fees(&[tiered_schedule()]).unwrap();

        assert!(zeroed.is_empty());
        assert_eq!(ledger.group_snapshots()[0].fee, dec!(1325.00));
        let a = ledger.account_snapshot("as-a").unwrap();
        let b = ledger.account_snapshot("as-b").unwrap();
        assert_eq!(a.group_weight, Some(dec!(0.6667)));
        assert_eq!(b.group_weight, Some(dec!(0.3333)));
        assert_eq!(a.fee, dec!(883.38));
        assert_eq!(b.fee, dec!(441.62));
        assert_eq!(a.fee + b.fee, dec!(1325.00));

        assert_eq!(ledger.quarter().aum, dec!(150000));
        assert_eq!(ledger.quarter().fee, dec!(1325.00));
        assert_eq!(ledger.quarter().status, QuarterStatus::AccountFeesAllocated);
        assert!(ledger.reconcile().is_empty());
    }

    #[test]
    fn test_steps_out_of_order_are_rejected() {
        let mut ledger = smith_ledger();
        let err = ledger.generate_group_fees(&[tiered_schedule()]).unwrap_err();
        assert!(matches!(
            err,
            Error::Billing(BillingError::InvalidState { .. })
        ));

        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        let err = ledger.generate_account_fees(&[tiered_schedule()]).unwrap_err();
        match err {
            Error::Billing(BillingError::InvalidState {
                expected, actual, ..
            }) => {
                assert_eq!(expected, "GROUP_FEES_COMPUTED");
                assert_eq!(actual, "SNAPSHOTS_LINKED");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_billable_member_counts_in_denominator() {
        let mut ledger = pending_ledger(vec![
            snapshot("a", Some("g-smith"), dec!(100000), true),
            snapshot("c", Some("g-smith"), dec!(100000), false),
        ]);
        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        ledger.calculate_fees(&[tiered_schedule()]).unwrap();

        assert_eq!(ledger.group_snapshots()[0].fee, dec!(1575.00));
        let a = ledger.account_snapshot("as-a").unwrap();
        let c = ledger.account_snapshot("as-c").unwrap();
        assert_eq!(a.group_weight, Some(dec!(0.5)));
        assert_eq!(a.fee, dec!(787.50));
        assert_eq!(c.group_weight, None);
        assert_eq!(c.fee, Decimal::ZERO);
        // The group fee is still what the quarter bills.
        assert_eq!(ledger.quarter().fee, dec!(1575.00));
    }

    #[test]
    fn test_zero_value_group_is_zeroed_not_failed() {
        let mut ledger = pending_ledger(vec![
            snapshot("a", Some("g-smith"), dec!(0), true),
            snapshot("b", Some("g-smith"), dec!(0), true),
        ]);
        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        let zeroed = ledger.calculate_fees(&[tiered_schedule()]).unwrap();

        let gs_id = ledger.group_snapshots()[0].id.clone();
        assert_eq!(zeroed, vec![gs_id]);
        // Flat fees of both rules are still charged to the group.
        assert_eq!(ledger.group_snapshots()[0].fee, dec!(75.00));
        assert_eq!(fee_of(&ledger, "as-a"), Decimal::ZERO);
        assert_eq!(ledger.account_snapshot("as-a").unwrap().group_weight, None);
        assert_eq!(ledger.quarter().status, QuarterStatus::AccountFeesAllocated);
        assert!(ledger.reconcile().is_empty());
    }

    #[test]
    fn test_standalone_account_priced_on_own_schedule() {
        let mut standalone = snapshot("s", None, dec!(10000), true);
        standalone.fee_schedule_id = Some("tiered".to_string());
        let unassigned = snapshot("u", None, dec!(10000), true);
        let mut ledger = pending_ledger(vec![standalone, unassigned]);

        ledger.generate_group_snapshots(&[]).unwrap();
        ledger.calculate_fees(&[tiered_schedule()]).unwrap();

        assert!(ledger.group_snapshots().is_empty());
        assert_eq!(fee_of(&ledger, "as-s"), dec!(175.00));
        assert_eq!(fee_of(&ledger, "as-u"), Decimal::ZERO);
        assert_eq!(ledger.quarter().fee, dec!(175.00));
        assert_eq!(ledger.quarter().aum, dec!(20000));
        assert!(ledger.reconcile().is_empty());
    }

    #[test]
    fn test_linking_ends_standalone_status() {
        let mut ledger = pending_ledger(vec![
            snapshot("a", Some("g-smith"), dec!(100000), true),
            snapshot("s", None, dec!(10000), true),
        ]);
        assert!(ledger.account_snapshots().iter().all(|s| s.is_standalone()));

        ledger.generate_group_snapshots(&[smith_group()]).unwrap();

        let standalone: Vec<&str> = ledger
            .account_snapshots()
            .iter()
            .filter(|s| s.is_standalone())
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(standalone, vec!["as-s"]);
    }

    #[test]
    fn test_add_then_remove_restores_totals() {
        let mut ledger = smith_ledger();
        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        ledger.calculate_fees(&[tiered_schedule()]).unwrap();
        let aum = ledger.quarter().aum;
        let fee = ledger.quarter().fee;

        let group = smith_group();
        ledger
            .add_account_snapshot(snapshot("d", Some("g-smith"), dec!(50000), true), Some(&group))
            .unwrap();
        assert_eq!(ledger.quarter().aum, dec!(200000));
        assert_eq!(ledger.group_snapshots()[0].market_value, dec!(200000));
        assert_eq!(ledger.quarter().status, QuarterStatus::SnapshotsLinked);

        ledger.remove_account_snapshot("as-d").unwrap();
        assert_eq!(ledger.quarter().aum, aum);
        assert_eq!(ledger.quarter().fee, fee);
        assert_eq!(ledger.group_snapshots()[0].market_value, dec!(150000));
        assert!(ledger.reconcile().is_empty());
    }

    #[test]
    fn test_add_creates_group_snapshot_on_first_member() {
        let mut ledger = QuarterLedger::new(quarter(), Vec::new(), Vec::new());
        let group = smith_group();
        let added = ledger
            .add_account_snapshot(snapshot("a", Some("g-smith"), dec!(1000), true), Some(&group))
            .unwrap()
            .clone();

        assert_eq!(ledger.group_snapshots().len(), 1);
        assert_eq!(
            added.group_snapshot_id.as_deref(),
            Some(ledger.group_snapshots()[0].id.as_str())
        );
        assert_eq!(ledger.group_snapshots()[0].market_value, dec!(1000));
        assert_eq!(ledger.quarter().status, QuarterStatus::SnapshotsLinked);
    }

    #[test]
    fn test_removing_last_member_removes_group_snapshot() {
        let mut ledger = smith_ledger();
        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        ledger.calculate_fees(&[tiered_schedule()]).unwrap();

        ledger.remove_account_snapshot("as-a").unwrap();
        assert_eq!(ledger.group_snapshots().len(), 1);
        // Stale until fees are recalculated, but still counted.
        assert_eq!(ledger.quarter().fee, dec!(1325.00));

        ledger.remove_account_snapshot("as-b").unwrap();
        assert!(ledger.group_snapshots().is_empty());
        assert_eq!(ledger.quarter().aum, Decimal::ZERO);
        assert_eq!(ledger.quarter().fee, Decimal::ZERO);
        assert_eq!(ledger.quarter().status, QuarterStatus::Open);
    }

    #[test]
    fn test_remove_unknown_snapshot() {
        let mut ledger = smith_ledger();
        let err = ledger.remove_account_snapshot("nope").unwrap_err();
        assert!(matches!(
            err,
            Error::Billing(BillingError::NotFound {
                entity: "AccountSnapshot",
                ..
            })
        ));
    }

    #[test]
    fn test_remove_group_snapshot_unlinks_members() {
        let mut ledger = smith_ledger();
        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        ledger.calculate_fees(&[tiered_schedule()]).unwrap();
        let gs_id = ledger.group_snapshots()[0].id.clone();

        let removed = ledger.remove_group_snapshot(&gs_id).unwrap();
        assert_eq!(removed.fee, dec!(1325.00));
        assert!(ledger.group_snapshots().is_empty());
        assert_eq!(ledger.quarter().aum, dec!(150000));
        assert_eq!(ledger.quarter().fee, Decimal::ZERO);
        assert_eq!(ledger.quarter().status, QuarterStatus::Open);
        for member in ledger.account_snapshots() {
            assert!(member.is_pending_link());
            assert_eq!(member.group_weight, None);
            assert_eq!(member.fee, Decimal::ZERO);
        }

        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        assert_eq!(ledger.group_snapshots()[0].market_value, dec!(150000));
    }

    #[test]
    fn test_duplicate_account_in_quarter_rejected() {
        let mut ledger = QuarterLedger::new(quarter(), Vec::new(), Vec::new());
        ledger
            .add_account_snapshot(snapshot("a", None, dec!(10), true), None)
            .unwrap();
        let err = ledger
            .add_account_snapshot(snapshot("a", None, dec!(20), true), None)
            .unwrap_err();
        assert!(matches!(err, Error::Billing(BillingError::Duplicate(_))));
        assert_eq!(ledger.quarter().aum, dec!(10));
    }

    #[test]
    fn test_update_quarter_data_corrects_drift_and_is_fixed_point() {
        let mut ledger = smith_ledger();
        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        ledger.calculate_fees(&[tiered_schedule()]).unwrap();

        let (mut q, groups, accounts) = ledger.into_parts();
        q.aum = dec!(1);
        q.fee = dec!(2);
        let mut ledger = QuarterLedger::new(q, groups, accounts);

        let drift = ledger.reconcile();
        assert_eq!(drift.len(), 2);
        assert!(drift.iter().any(|d| d.field == "quarter.aum" && d.recomputed == dec!(150000)));

        let corrections = ledger.update_quarter_data();
        assert_eq!(corrections, drift);
        assert_eq!(ledger.quarter().aum, dec!(150000));
        assert_eq!(ledger.quarter().fee, dec!(1325.00));

        let snapshot = ledger.clone();
        assert!(ledger.update_quarter_data().is_empty());
        assert_eq!(ledger, snapshot);
    }

    #[test]
    fn test_clear_resets_quarter() {
        let mut ledger = smith_ledger();
        ledger.generate_group_snapshots(&[smith_group()]).unwrap();
        assert_eq!(ledger.clear(), 2);
        assert!(ledger.group_snapshots().is_empty());
        assert_eq!(ledger.quarter().aum, Decimal::ZERO);
        assert_eq!(ledger.quarter().fee, Decimal::ZERO);
        assert_eq!(ledger.quarter().status, QuarterStatus::Open);
    }
}
