//! Provisional cap-table computation for a transfer awaiting server confirmation.

use chrono::{DateTime, Utc};

use crate::model::CapTableEntry;

/// Applies a transfer of `units` from `from_owner` to `to_owner` to a local copy
/// of the cap table.
///
/// The sender's entry is removed when its balance reaches exactly zero. A
/// balance driven below zero is kept as-is; it only lives until the next
/// refetch replaces it with the server's state. An absent recipient is
/// appended with `acquired_at`. Every other entry keeps its relative order.
/// A transfer to oneself leaves the units untouched.
#[must_use]
pub fn apply_transfer(
    entries: &[CapTableEntry],
    from_owner: &str,
    to_owner: &str,
    units: i64,
    acquired_at: DateTime<Utc>,
) -> Vec<CapTableEntry> {
    if from_owner == to_owner {
        return recompute_percentages(entries.to_vec());
    }

    let mut updated = Vec::with_capacity(entries.len() + 1);
    let mut recipient_found = false;

    for entry in entries {
        if entry.owner_name == from_owner {
            let remaining = entry.units - units;
            if remaining != 0 {
                updated.push(CapTableEntry {
                    units: remaining,
                    ..entry.clone()
                });
            }
        } else if entry.owner_name == to_owner {
            recipient_found = true;
            updated.push(CapTableEntry {
                units: entry.units + units,
                ..entry.clone()
            });
        } else {
            updated.push(entry.clone());
        }
    }

    if !recipient_found {
        updated.push(CapTableEntry {
            owner_name: to_owner.to_string(),
            units,
            percentage: 0.0,
            acquired_at,
        });
    }

    recompute_percentages(updated)
}

/// Sets each entry's percentage to its share of the summed units. A table
/// whose units sum to zero or less gets 0 everywhere.
#[must_use]
pub fn recompute_percentages(mut entries: Vec<CapTableEntry>) -> Vec<CapTableEntry> {
    let total: i64 = entries.iter().map(|entry| entry.units).sum();
    for entry in &mut entries {
        entry.percentage = if total > 0 {
            entry.units as f64 / total as f64 * 100.0
        } else {
            0.0
        };
    }
    entries
}
