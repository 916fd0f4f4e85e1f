use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::{CapTable, CapTableEntry, Fund, Transfer};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerHolding {
    pub fund_id: Uuid,
    pub fund_name: String,
    pub units: i64,
    pub percentage: f64,
    pub total_units: i64,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedOwner {
    pub name: String,
    pub holdings: Vec<OwnerHolding>,
}

impl AggregatedOwner {
    #[must_use]
    pub fn total_funds(&self) -> usize {
        self.holdings.len()
    }
}

/// Groups cap-table entries across funds by owner name.
///
/// `cap_tables` pairs each fund with its loaded cap table; holdings keep the
/// order of that slice. Owners are sorted by number of funds held (most first),
/// then by name, compared case-insensitively with the raw name as tiebreak.
#[must_use]
pub fn aggregate_owners(cap_tables: &[(Fund, CapTable)]) -> Vec<AggregatedOwner> {
    let mut by_owner: BTreeMap<&str, Vec<OwnerHolding>> = BTreeMap::new();
    for (fund, cap_table) in cap_tables {
        for entry in &cap_table.entries {
            by_owner
                .entry(entry.owner_name.as_str())
                .or_default()
                .push(OwnerHolding {
                    fund_id: fund.id,
                    fund_name: fund.name.clone(),
                    units: entry.units,
                    percentage: entry.percentage,
                    total_units: fund.total_units,
                    acquired_at: entry.acquired_at,
                });
        }
    }

    let mut owners: Vec<AggregatedOwner> = by_owner
        .into_iter()
        .map(|(name, holdings)| AggregatedOwner {
            name: name.to_string(),
            holdings,
        })
        .collect();
    owners.sort_by(|left, right| {
        right
            .total_funds()
            .cmp(&left.total_funds())
            .then_with(|| compare_names(&left.name, &right.name))
    });
    owners
}

fn compare_names(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

/// Returns the transfers ordered by execution time, newest first. Ties keep
/// their incoming order.
#[must_use]
pub fn newest_first(transfers: &[Transfer]) -> Vec<Transfer> {
    let mut sorted = transfers.to_vec();
    sorted.sort_by(|left, right| right.transferred_at.cmp(&left.transferred_at));
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    Received,
    Sent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerMovement {
    pub transfer_id: Uuid,
    pub direction: TransferDirection,
    pub counterparty: String,
    pub units: i64,
    pub transferred_at: DateTime<Utc>,
}

/// One owner's position and transfer history within a single fund.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerActivity {
    pub owner_name: String,
    pub units: i64,
    pub percentage: f64,
    pub total_received: i64,
    pub total_sent: i64,
    pub timeline: Vec<OwnerMovement>,
}

#[must_use]
pub fn owner_activity(
    owner_name: &str,
    entry: &CapTableEntry,
    fund_total_units: i64,
    transfers: &[Transfer],
) -> OwnerActivity {
    let percentage = if fund_total_units > 0 {
        entry.units as f64 / fund_total_units as f64 * 100.0
    } else {
        0.0
    };

    let mut total_received = 0;
    let mut total_sent = 0;
    let mut timeline = Vec::new();
    for transfer in newest_first(transfers) {
        let movement = if transfer.to_owner == owner_name {
            total_received += transfer.units;
            OwnerMovement {
                transfer_id: transfer.id,
                direction: TransferDirection::Received,
                counterparty: transfer.from_owner,
                units: transfer.units,
                transferred_at: transfer.transferred_at,
            }
        } else if transfer.from_owner == owner_name {
            total_sent += transfer.units;
            OwnerMovement {
                transfer_id: transfer.id,
                direction: TransferDirection::Sent,
                counterparty: transfer.to_owner,
                units: transfer.units,
                transferred_at: transfer.transferred_at,
            }
        } else {
            continue;
        };
        timeline.push(movement);
    }

    OwnerActivity {
        owner_name: owner_name.to_string(),
        units: entry.units,
        percentage,
        total_received,
        total_sent,
        timeline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0)
            .single()
            .unwrap_or_default()
    }

    fn fund(name: &str, total_units: i64) -> Fund {
        Fund {
            id: Uuid::new_v4(),
            name: name.to_string(),
            total_units,
            created_at: at(1),
        }
    }

    fn cap_table(fund: &Fund, holdings: &[(&str, i64)]) -> CapTable {
        CapTable {
            fund_id: fund.id,
            entries: holdings
                .iter()
                .map(|(owner, units)| CapTableEntry {
                    owner_name: (*owner).to_string(),
                    units: *units,
                    percentage: *units as f64 / fund.total_units as f64 * 100.0,
                    acquired_at: at(1),
                })
                .collect(),
            total: holdings.len() as i64,
            limit: 100,
            offset: 0,
        }
    }

    fn transfer(from: &str, to: &str, units: i64, day: u32) -> Transfer {
        Transfer {
            id: Uuid::new_v4(),
            fund_id: Uuid::nil(),
            from_owner: from.to_string(),
            to_owner: to.to_string(),
            units,
            transferred_at: at(day),
        }
    }

    #[test]
    fn owners_sorted_by_fund_count_then_name() {
        let growth = fund("Growth", 1000);
        let venture = fund("Venture", 500);
        let tables = vec![
            (growth.clone(), cap_table(&growth, &[("zeta", 600), ("Alpha", 400)])),
            (venture.clone(), cap_table(&venture, &[("zeta", 250), ("beta", 250)])),
        ];

        let owners = aggregate_owners(&tables);
        let names: Vec<_> = owners.iter().map(|owner| owner.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "Alpha", "beta"]);
        assert_eq!(owners[0].total_funds(), 2);
        assert_eq!(owners[0].holdings[0].fund_name, "Growth");
        assert_eq!(owners[0].holdings[1].fund_name, "Venture");
        assert_eq!(owners[0].holdings[1].total_units, 500);
    }

    #[test]
    fn no_cap_tables_means_no_owners() {
        assert!(aggregate_owners(&[]).is_empty());
    }

    #[test]
    fn history_is_newest_first() {
        let transfers = vec![
            transfer("A", "B", 1, 1),
            transfer("A", "C", 2, 3),
            transfer("B", "C", 3, 2),
        ];
        let units: Vec<_> = newest_first(&transfers).iter().map(|t| t.units).collect();
        assert_eq!(units, vec![2, 3, 1]);
    }

    #[test]
    fn owner_activity_totals_and_timeline() {
        let entry = CapTableEntry {
            owner_name: "B".to_string(),
            units: 150,
            percentage: 15.0,
            acquired_at: at(1),
        };
        let transfers = vec![
            transfer("A", "B", 200, 1),
            transfer("B", "C", 50, 2),
            transfer("A", "C", 10, 3),
        ];

        let activity = owner_activity("B", &entry, 1000, &transfers);
        assert_eq!(activity.total_received, 200);
        assert_eq!(activity.total_sent, 50);
        assert!((activity.percentage - 15.0).abs() < f64::EPSILON);
        assert_eq!(activity.timeline.len(), 2);
        assert_eq!(activity.timeline[0].direction, TransferDirection::Sent);
        assert_eq!(activity.timeline[0].counterparty, "C");
        assert_eq!(activity.timeline[1].direction, TransferDirection::Received);
        assert_eq!(activity.timeline[1].counterparty, "A");
    }

    #[test]
    fn owner_activity_handles_zero_total() {
        let entry = CapTableEntry {
            owner_name: "A".to_string(),
            units: 0,
            percentage: 0.0,
            acquired_at: at(1),
        };
        let activity = owner_activity("A", &entry, 0, &[]);
        assert!(activity.percentage.abs() < f64::EPSILON);
        assert!(activity.timeline.is_empty());
    }
}
