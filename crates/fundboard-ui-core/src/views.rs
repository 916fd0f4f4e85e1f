//! Display-ready rows for the fund detail, owners and owner detail screens.

use fundboard_domain::{
    AggregatedOwner, CapTable, Fund, OwnerActivity, Transfer, TransferDirection, newest_first,
};
use serde::Serialize;
use uuid::Uuid;

use crate::format::{format_date, format_date_time, format_percentage, format_units, percent_of};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundHeader {
    pub id: Uuid,
    pub name: String,
    pub total_units: String,
    pub created: String,
}

impl FundHeader {
    #[must_use]
    pub fn new(fund: &Fund) -> Self {
        Self {
            id: fund.id,
            name: fund.name.clone(),
            total_units: format_units(fund.total_units),
            created: format_date(fund.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapTableRow {
    pub owner_name: String,
    pub units: String,
    pub percentage: String,
    pub acquired: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRow {
    pub id: Uuid,
    pub from_owner: String,
    pub to_owner: String,
    pub units: String,
    pub transferred: String,
}

impl TransferRow {
    #[must_use]
    pub fn new(transfer: &Transfer) -> Self {
        Self {
            id: transfer.id,
            from_owner: transfer.from_owner.clone(),
            to_owner: transfer.to_owner.clone(),
            units: format_units(transfer.units),
            transferred: format_date_time(transfer.transferred_at),
        }
    }
}

/// Fund header, cap table and newest-first transfer history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundDetailView {
    pub header: FundHeader,
    pub cap_table: Vec<CapTableRow>,
    pub transfers: Vec<TransferRow>,
}

impl FundDetailView {
    /// Percentages are computed against the fund's total units rather than
    /// the sum of listed holdings, so a partial page still shows true shares.
    #[must_use]
    pub fn build(fund: &Fund, cap_table: &CapTable, transfers: &[Transfer]) -> Self {
        let cap_table = cap_table
            .entries
            .iter()
            .map(|entry| CapTableRow {
                owner_name: entry.owner_name.clone(),
                units: format_units(entry.units),
                percentage: format_percentage(percent_of(entry.units, fund.total_units)),
                acquired: format_date(entry.acquired_at),
            })
            .collect();
        let transfers = newest_first(transfers).iter().map(TransferRow::new).collect();
        Self {
            header: FundHeader::new(fund),
            cap_table,
            transfers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingRow {
    pub fund_id: Uuid,
    pub fund_name: String,
    pub units: String,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRow {
    pub name: String,
    pub fund_count: usize,
    pub holdings: Vec<HoldingRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnersView {
    pub owners: Vec<OwnerRow>,
}

impl OwnersView {
    /// Keeps the aggregation order: fund count descending, then name.
    #[must_use]
    pub fn build(owners: &[AggregatedOwner]) -> Self {
        let owners = owners
            .iter()
            .map(|owner| OwnerRow {
                name: owner.name.clone(),
                fund_count: owner.total_funds(),
                holdings: owner
                    .holdings
                    .iter()
                    .map(|holding| HoldingRow {
                        fund_id: holding.fund_id,
                        fund_name: holding.fund_name.clone(),
                        units: format_units(holding.units),
                        percentage: format_percentage(percent_of(
                            holding.units,
                            holding.total_units,
                        )),
                    })
                    .collect(),
            })
            .collect();
        Self { owners }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRow {
    pub description: String,
    pub units: String,
    pub transferred: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDetailView {
    pub owner_name: String,
    pub fund_name: String,
    pub units: String,
    pub percentage: String,
    pub total_received: String,
    pub total_sent: String,
    pub timeline: Vec<MovementRow>,
}

impl OwnerDetailView {
    #[must_use]
    pub fn build(fund: &Fund, activity: &OwnerActivity) -> Self {
        let timeline = activity
            .timeline
            .iter()
            .map(|movement| {
                let (description, sign) = match movement.direction {
                    TransferDirection::Received => {
                        (format!("Received from {}", movement.counterparty), '+')
                    }
                    TransferDirection::Sent => (format!("Sent to {}", movement.counterparty), '-'),
                };
                MovementRow {
                    description,
                    units: format!("{sign}{}", format_units(movement.units)),
                    transferred: format_date_time(movement.transferred_at),
                }
            })
            .collect();

        Self {
            owner_name: activity.owner_name.clone(),
            fund_name: fund.name.clone(),
            units: format_units(activity.units),
            percentage: format_percentage(activity.percentage),
            total_received: format_units(activity.total_received),
            total_sent: format_units(activity.total_sent),
            timeline,
        }
    }
}
