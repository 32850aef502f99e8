//! In-memory roll-up of one quarter.
//!
//! A `QuarterLedger` owns a quarter together with all of its group and
//! account snapshots. Account snapshots are the source of truth. Group
//! market values and the quarter's `aum`/`fee` are cached totals that the
//! ledger keeps current in two ways:
//!
//! * incrementally, when a snapshot is added or removed, and
//! * by a full recomputation ([`QuarterLedger::update_quarter_data`]).
//!
//! [`QuarterLedger::reconcile`] compares the two and reports any drift.
//!
//! Totals:
//! * `quarter.aum` is the sum of every account snapshot's market value.
//! * `quarter.fee` is the sum of group snapshot fees plus the fees of account
//!   snapshots not linked to a group snapshot.
//! * A group snapshot's market value is the sum of its linked members.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fee_assignment::{allocate_fee, assign_fee, group_weight};
use super::quarters_model::{Quarter, QuarterStatus};
use super::snapshots_model::{AccountSnapshot, Discrepancy, GroupSnapshot};
use crate::errors::{BillingError, Result};
use crate::fee_schedules::FeeSchedule;
use crate::groups::Group;
use crate::utils::decimal_utils::normalize_market_value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuarterLedger {
    quarter: Quarter,
    group_snapshots: Vec<GroupSnapshot>,
    account_snapshots: Vec<AccountSnapshot>,
}

struct Totals {
    aum: Decimal,
    fee: Decimal,
    group_values: Vec<Decimal>,
}

impl QuarterLedger {
    pub fn new(
        quarter: Quarter,
        group_snapshots: Vec<GroupSnapshot>,
        account_snapshots: Vec<AccountSnapshot>,
    ) -> Self {
        Self {
            quarter,
            group_snapshots,
            account_snapshots,
        }
    }

    pub fn quarter(&self) -> &Quarter {
        &self.quarter
    }

    pub fn group_snapshots(&self) -> &[GroupSnapshot] {
        &self.group_snapshots
    }

    pub fn account_snapshots(&self) -> &[AccountSnapshot] {
        &self.account_snapshots
    }

    pub fn into_parts(self) -> (Quarter, Vec<GroupSnapshot>, Vec<AccountSnapshot>) {
        (self.quarter, self.group_snapshots, self.account_snapshots)
    }

    pub fn group_snapshot(&self, snapshot_id: &str) -> Option<&GroupSnapshot> {
        self.group_snapshots.iter().find(|gs| gs.id == snapshot_id)
    }

    pub fn account_snapshot(&self, snapshot_id: &str) -> Option<&AccountSnapshot> {
        self.account_snapshots.iter().find(|s| s.id == snapshot_id)
    }

    pub fn contains_account(&self, account_id: &str) -> bool {
        self.account_snapshots
            .iter()
            .any(|s| s.account_id == account_id)
    }

    /// Linked members of a group snapshot.
    pub fn members<'a>(&'a self, group_snapshot_id: &'a str) -> impl Iterator<Item = &'a AccountSnapshot> {
        self.account_snapshots
            .iter()
            .filter(move |s| s.group_snapshot_id.as_deref() == Some(group_snapshot_id))
    }

    // ---------------------------------------------------------------------
    // Pipeline
    // ---------------------------------------------------------------------

    /// Links every grouped account snapshot to its group's snapshot for this
    /// quarter, creating group snapshots on first sight.
    ///
    /// Returns the number of account snapshots newly linked.
    pub fn generate_group_snapshots(&mut self, groups: &[Group]) -> Result<usize> {
        let groups_by_id: HashMap<&str, &Group> =
            groups.iter().map(|g| (g.id.as_str(), g)).collect();

        // Check every reference before touching anything.
        for snapshot in self.account_snapshots.iter().filter(|s| s.is_pending_link()) {
            let group_id = snapshot.group_id.as_deref().unwrap_or_default();
            if !groups_by_id.contains_key(group_id) {
                return Err(BillingError::NotFound {
                    entity: "Group",
                    id: group_id.to_string(),
                }
                .into());
            }
        }

        let pending: Vec<usize> = self
            .account_snapshots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_pending_link())
            .map(|(idx, _)| idx)
            .collect();

        self.track(|ledger| {
            for &idx in &pending {
                let group_id = ledger.account_snapshots[idx]
                    .group_id
                    .clone()
                    .unwrap_or_default();
                if let Some(group) = groups_by_id.get(group_id.as_str()) {
                    ledger.link(idx, group);
                }
            }
            Ok(())
        })?;

        self.quarter.status = QuarterStatus::SnapshotsLinked;
        debug!(
            "Quarter {}: linked {} account snapshots into {} group snapshots",
            self.quarter.id,
            pending.len(),
            self.group_snapshots.len()
        );
        Ok(pending.len())
    }

    /// Evaluates each group snapshot's schedule against its market value.
    pub fn generate_group_fees(&mut self, schedules: &[FeeSchedule]) -> Result<()> {
        self.require_status(QuarterStatus::SnapshotsLinked)?;
        let schedules = index_schedules(schedules);

        self.track(|ledger| {
            for gs in ledger.group_snapshots.iter_mut() {
                let schedule = gs
                    .fee_schedule_id
                    .as_deref()
                    .and_then(|id| schedules.get(id).copied());
                // Groups are always billable.
                let fee = assign_fee(true, schedule, gs.market_value);
                ledger.quarter.fee += fee - gs.fee;
                gs.fee = fee;
            }
            Ok(())
        })?;

        self.quarter.status = QuarterStatus::GroupFeesComputed;
        Ok(())
    }

    /// Allocates each group fee to its billable members by weight and prices
    /// standalone accounts on their own schedules.
    ///
    /// The weight denominator is the full group market value, non-billable
    /// members included. A group whose market value is zero cannot be
    /// weighted; its members are left with no weight and a zero fee.
    /// Returns the ids of such groups.
    pub fn generate_account_fees(&mut self, schedules: &[FeeSchedule]) -> Result<Vec<String>> {
        self.require_status(QuarterStatus::GroupFeesComputed)?;
        let schedules = index_schedules(schedules);
        let groups: HashMap<String, (Decimal, Decimal)> = self
            .group_snapshots
            .iter()
            .map(|gs| (gs.id.clone(), (gs.market_value, gs.fee)))
            .collect();
        let mut zero_value_groups: HashSet<String> = HashSet::new();

        self.track(|ledger| {
            for snapshot in ledger.account_snapshots.iter_mut() {
                match snapshot.group_snapshot_id.as_deref() {
                    Some(gs_id) => {
                        let (group_value, group_fee) =
                            groups.get(gs_id).copied().unwrap_or_default();
                        if !snapshot.billable {
                            snapshot.group_weight = None;
                            snapshot.fee = Decimal::ZERO;
                            continue;
                        }
                        match group_weight(gs_id, snapshot.market_value, group_value) {
                            Ok(weight) => {
                                snapshot.group_weight = Some(weight);
                                snapshot.fee = allocate_fee(group_fee, weight);
                            }
                            Err(err) => {
                                if zero_value_groups.insert(gs_id.to_string()) {
                                    warn!("{}; allocation zeroed", err);
                                }
                                snapshot.group_weight = None;
                                snapshot.fee = Decimal::ZERO;
                            }
                        }
                    }
                    None => {
                        let schedule = snapshot
                            .fee_schedule_id
                            .as_deref()
                            .and_then(|id| schedules.get(id).copied());
                        let fee = assign_fee(snapshot.billable, schedule, snapshot.market_value);
                        ledger.quarter.fee += fee - snapshot.fee;
                        snapshot.group_weight = None;
                        snapshot.fee = fee;
                    }
                }
            }
            Ok(())
        })?;

        self.quarter.status = QuarterStatus::AccountFeesAllocated;
        info!(
            "Quarter {}: fees allocated, aum {} fee {}",
            self.quarter.id, self.quarter.aum, self.quarter.fee
        );
        let mut zeroed: Vec<String> = zero_value_groups.into_iter().collect();
        zeroed.sort();
        Ok(zeroed)
    }

    /// Group fees then account fees.
    pub fn calculate_fees(&mut self, schedules: &[FeeSchedule]) -> Result<Vec<String>> {
        self.generate_group_fees(schedules)?;
        self.generate_account_fees(schedules)
    }

    // ---------------------------------------------------------------------
    // Totals
    // ---------------------------------------------------------------------

    /// Recomputes every cached total from the account snapshots and returns
    /// the corrections that were applied.
    pub fn update_quarter_data(&mut self) -> Vec<Discrepancy> {
        let corrections = self.reconcile();
        let totals = self.recompute();
        for (gs, value) in self.group_snapshots.iter_mut().zip(totals.group_values) {
            gs.market_value = value;
        }
        self.quarter.aum = totals.aum;
        self.quarter.fee = totals.fee;
        if !corrections.is_empty() {
            warn!(
                "Quarter {}: corrected {} cached totals",
                self.quarter.id,
                corrections.len()
            );
        }
        corrections
    }

    /// Cached totals that disagree with a full recomputation.
    pub fn reconcile(&self) -> Vec<Discrepancy> {
        let totals = self.recompute();
        let mut discrepancies = Vec::new();

        for (gs, value) in self.group_snapshots.iter().zip(&totals.group_values) {
            if gs.market_value != *value {
                discrepancies.push(Discrepancy {
                    field: "group_snapshot.market_value".to_string(),
                    entity_id: gs.id.clone(),
                    cached: gs.market_value,
                    recomputed: *value,
                });
            }
        }
        if self.quarter.aum != totals.aum {
            discrepancies.push(Discrepancy {
                field: "quarter.aum".to_string(),
                entity_id: self.quarter.id.clone(),
                cached: self.quarter.aum,
                recomputed: totals.aum,
            });
        }
        if self.quarter.fee != totals.fee {
            discrepancies.push(Discrepancy {
                field: "quarter.fee".to_string(),
                entity_id: self.quarter.id.clone(),
                cached: self.quarter.fee,
                recomputed: totals.fee,
            });
        }
        discrepancies
    }

    fn recompute(&self) -> Totals {
        let group_values = self
            .group_snapshots
            .iter()
            .map(|gs| self.members(&gs.id).map(|s| s.market_value).sum::<Decimal>())
            .collect();
        let aum = self.account_snapshots.iter().map(|s| s.market_value).sum::<Decimal>();
        let fee = self.group_snapshots.iter().map(|gs| gs.fee).sum::<Decimal>()
            + self
                .account_snapshots
                .iter()
                .filter(|s| s.is_standalone())
                .map(|s| s.fee)
                .sum::<Decimal>();
        Totals {
            aum,
            fee,
            group_values,
        }
    }

    // ---------------------------------------------------------------------
    // Incremental mutations
    // ---------------------------------------------------------------------

    /// Adds an account snapshot and folds it into the totals.
    ///
    /// When `group` is given the snapshot is linked straight away, creating
    /// the group snapshot if this is the group's first account this quarter.
    pub fn add_account_snapshot(
        &mut self,
        mut snapshot: AccountSnapshot,
        group: Option<&Group>,
    ) -> Result<&AccountSnapshot> {
        if self.contains_account(&snapshot.account_id) {
            return Err(BillingError::Duplicate(format!(
                "Account {} already has a snapshot in quarter {}",
                snapshot.account_number, self.quarter.name
            ))
            .into());
        }
        snapshot.market_value = normalize_market_value(snapshot.market_value)?;
        snapshot.quarter_id = self.quarter.id.clone();
        snapshot.group_snapshot_id = None;
        snapshot.group_weight = None;
        snapshot.fee = Decimal::ZERO;

        self.track(|ledger| {
            ledger.quarter.aum += snapshot.market_value;
            ledger.account_snapshots.push(snapshot);
            let idx = ledger.account_snapshots.len() - 1;
            if let Some(group) = group {
                ledger.link(idx, group);
            }
            Ok(())
        })?;

        self.settle_status();
        let idx = self.account_snapshots.len() - 1;
        Ok(&self.account_snapshots[idx])
    }

    /// Removes an account snapshot and reverses its contribution. A group
    /// snapshot left without members is removed as well.
    pub fn remove_account_snapshot(&mut self, snapshot_id: &str) -> Result<AccountSnapshot> {
        let idx = self
            .account_snapshots
            .iter()
            .position(|s| s.id == snapshot_id)
            .ok_or_else(|| BillingError::NotFound {
                entity: "AccountSnapshot",
                id: snapshot_id.to_string(),
            })?;

        let removed = self.track(|ledger| {
            let removed = ledger.account_snapshots.remove(idx);
            ledger.quarter.aum -= removed.market_value;
            match removed.group_snapshot_id.as_deref() {
                Some(gs_id) => {
                    if let Some(gs) = ledger.group_snapshots.iter_mut().find(|gs| gs.id == gs_id) {
                        gs.market_value -= removed.market_value;
                    }
                    if ledger.members(gs_id).next().is_none() {
                        ledger.drop_group_snapshot(gs_id);
                    }
                }
                None => ledger.quarter.fee -= removed.fee,
            }
            Ok(removed)
        })?;

        self.settle_status();
        Ok(removed)
    }

    /// Removes a group snapshot. Its members stay in the quarter, unlinked
    /// and without an allocation.
    pub fn remove_group_snapshot(&mut self, snapshot_id: &str) -> Result<GroupSnapshot> {
        if self.group_snapshot(snapshot_id).is_none() {
            return Err(BillingError::NotFound {
                entity: "GroupSnapshot",
                id: snapshot_id.to_string(),
            }
            .into());
        }

        let removed = self.track(|ledger| {
            for member in ledger
                .account_snapshots
                .iter_mut()
                .filter(|s| s.group_snapshot_id.as_deref() == Some(snapshot_id))
            {
                member.group_snapshot_id = None;
                member.group_weight = None;
                member.fee = Decimal::ZERO;
            }
            ledger
                .drop_group_snapshot(snapshot_id)
                .ok_or_else(|| {
                    BillingError::NotFound {
                        entity: "GroupSnapshot",
                        id: snapshot_id.to_string(),
                    }
                    .into()
                })
        })?;

        self.settle_status();
        Ok(removed)
    }

    /// Removes every snapshot of the quarter. Returns the number of account
    /// snapshots removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.account_snapshots.len();
        self.account_snapshots.clear();
        self.group_snapshots.clear();
        self.quarter.aum = Decimal::ZERO;
        self.quarter.fee = Decimal::ZERO;
        self.settle_status();
        removed
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn link(&mut self, idx: usize, group: &Group) {
        let market_value = self.account_snapshots[idx].market_value;
        let gs_id = match self
            .group_snapshots
            .iter_mut()
            .find(|gs| gs.group_id == group.id)
        {
            Some(gs) => {
                gs.market_value += market_value;
                gs.id.clone()
            }
            None => {
                let gs = GroupSnapshot {
                    id: Uuid::new_v4().to_string(),
                    quarter_id: self.quarter.id.clone(),
                    group_id: group.id.clone(),
                    group_name: group.name.clone(),
                    fee_schedule_id: group.fee_schedule_id.clone(),
                    market_value,
                    fee: Decimal::ZERO,
                };
                let id = gs.id.clone();
                self.group_snapshots.push(gs);
                id
            }
        };

        let snapshot = &mut self.account_snapshots[idx];
        // An unlinked row counts toward the quarter fee on its own.
        self.quarter.fee -= snapshot.fee;
        snapshot.fee = Decimal::ZERO;
        snapshot.group_weight = None;
        snapshot.group_id = Some(group.id.clone());
        snapshot.group_snapshot_id = Some(gs_id);
    }

    fn drop_group_snapshot(&mut self, snapshot_id: &str) -> Option<GroupSnapshot> {
        let idx = self
            .group_snapshots
            .iter()
            .position(|gs| gs.id == snapshot_id)?;
        let removed = self.group_snapshots.remove(idx);
        self.quarter.fee -= removed.fee;
        Some(removed)
    }

    fn require_status(&self, expected: QuarterStatus) -> Result<()> {
        if self.quarter.status < expected {
            return Err(BillingError::InvalidState {
                quarter_id: self.quarter.id.clone(),
                expected: expected.to_string(),
                actual: self.quarter.status.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Status after the snapshot set changed: earlier fee results are stale.
    fn settle_status(&mut self) {
        self.quarter.status = if self.account_snapshots.is_empty()
            || self.account_snapshots.iter().any(|s| s.is_pending_link())
        {
            QuarterStatus::Open
        } else {
            QuarterStatus::SnapshotsLinked
        };
    }

    /// Runs an incremental update. In debug builds, a ledger that was
    /// consistent before the update must still be consistent after it.
    fn track<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let was_consistent = cfg!(debug_assertions) && self.reconcile().is_empty();
        let out = op(self)?;
        if was_consistent {
            let drift = self.reconcile();
            debug_assert!(drift.is_empty(), "incremental totals drifted: {:?}", drift);
        }
        Ok(out)
    }
}

fn index_schedules(schedules: &[FeeSchedule]) -> HashMap<&str, &FeeSchedule> {
    schedules.iter().map(|s| (s.id.as_str(), s)).collect()
}
