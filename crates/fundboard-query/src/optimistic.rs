//! Overlapping optimistic transfers on one fund's cap table.
//!
//! Every transfer that starts while another one on the same fund is still in
//! flight joins that fund's group. The group keeps the cap table as it was
//! before its first transfer, and the cached table is always that snapshot
//! with the group's still-pending and confirmed transfers replayed on top. A
//! failed transfer drops out of the replay, so its units never survive in the
//! cache. Once the last transfer settles the group is discarded; if none of
//! them succeeded the snapshot is back in place unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fundboard_domain::{CapTable, CreateTransferRequest, apply_transfer};
use uuid::Uuid;

use crate::cache::QueryCache;
use crate::key::QueryKey;

/// Handle for one optimistic transfer, settled with
/// [`QueryCache::settle_transfer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransfer {
    fund_id: Uuid,
    id: u64,
}

#[derive(Debug, Clone)]
struct ProvisionalTransfer {
    id: u64,
    from_owner: String,
    to_owner: String,
    units: i64,
    acquired_at: DateTime<Utc>,
}

#[derive(Debug)]
struct TransferGroup {
    snapshot: Option<CapTable>,
    pending: Vec<ProvisionalTransfer>,
    confirmed: Vec<ProvisionalTransfer>,
}

impl TransferGroup {
    fn projected(&self) -> Option<CapTable> {
        let snapshot = self.snapshot.as_ref()?;
        let entries = self
            .confirmed
            .iter()
            .chain(&self.pending)
            .fold(snapshot.entries.clone(), |entries, transfer| {
                apply_transfer(
                    &entries,
                    &transfer.from_owner,
                    &transfer.to_owner,
                    transfer.units,
                    transfer.acquired_at,
                )
            });
        Some(CapTable {
            entries,
            ..snapshot.clone()
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct OptimisticTransfers {
    groups: HashMap<Uuid, TransferGroup>,
    next_id: u64,
}

impl OptimisticTransfers {
    pub(crate) fn clear(&mut self) {
        self.groups.clear();
    }

    pub(crate) fn in_flight(&self, fund_id: Uuid) -> usize {
        self.groups
            .get(&fund_id)
            .map_or(0, |group| group.pending.len())
    }
}

impl QueryCache {
    /// Registers a transfer about to be sent and installs the projected cap
    /// table. Nothing is written when the fund's group started without a
    /// cached table.
    pub fn begin_transfer(
        &mut self,
        fund_id: Uuid,
        request: &CreateTransferRequest,
        acquired_at: DateTime<Utc>,
    ) -> PendingTransfer {
        let key = QueryKey::CapTable(fund_id);
        let snapshot = if self.transfers.groups.contains_key(&fund_id) {
            None
        } else {
            self.get::<CapTable>(&key)
        };

        self.transfers.next_id += 1;
        let id = self.transfers.next_id;
        let group = self
            .transfers
            .groups
            .entry(fund_id)
            .or_insert_with(|| TransferGroup {
                snapshot,
                pending: Vec::new(),
                confirmed: Vec::new(),
            });
        group.pending.push(ProvisionalTransfer {
            id,
            from_owner: request.from_owner.clone(),
            to_owner: request.to_owner.clone(),
            units: request.units,
            acquired_at,
        });

        if let Some(projected) = group.projected() {
            self.set(key, projected);
        }
        PendingTransfer { fund_id, id }
    }

    /// Settles a transfer started with [`QueryCache::begin_transfer`] and
    /// reinstalls the projection without it when it failed.
    pub fn settle_transfer(&mut self, pending: PendingTransfer, succeeded: bool) {
        let Some(group) = self.transfers.groups.get_mut(&pending.fund_id) else {
            tracing::debug!(fund_id = %pending.fund_id, "transfer settled after cache was cleared");
            return;
        };
        let Some(index) = group
            .pending
            .iter()
            .position(|transfer| transfer.id == pending.id)
        else {
            return;
        };

        let transfer = group.pending.remove(index);
        if succeeded {
            group.confirmed.push(transfer);
        }
        let projected = group.projected();
        if group.pending.is_empty() {
            self.transfers.groups.remove(&pending.fund_id);
        }
        if let Some(projected) = projected {
            self.set(QueryKey::CapTable(pending.fund_id), projected);
        }
    }

    /// Transfers on `fund_id` still waiting for the server.
    #[must_use]
    pub fn transfers_in_flight(&self, fund_id: Uuid) -> usize {
        self.transfers.in_flight(fund_id)
    }
}
