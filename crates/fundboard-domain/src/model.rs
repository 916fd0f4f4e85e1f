use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub id: Uuid,
    pub name: String,
    pub total_units: i64,
    pub created_at: DateTime<Utc>,
}

/// One owner's holding in a fund.
///
/// `percentage` is derived and informational; `units` is authoritative. Units
/// are signed because an optimistic local copy may briefly hold a negative
/// balance before the server state is refetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapTableEntry {
    pub owner_name: String,
    pub units: i64,
    pub percentage: f64,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapTable {
    pub fund_id: Uuid,
    pub entries: Vec<CapTableEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl CapTable {
    #[must_use]
    pub fn total_units(&self) -> i64 {
        self.entries.iter().map(|entry| entry.units).sum()
    }

    #[must_use]
    pub fn entry(&self, owner_name: &str) -> Option<&CapTableEntry> {
        self.entries
            .iter()
            .find(|entry| entry.owner_name == owner_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub from_owner: String,
    pub to_owner: String,
    pub units: i64,
    pub transferred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundList {
    pub funds: Vec<Fund>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferList {
    pub fund_id: Uuid,
    pub transfers: Vec<Transfer>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFundRequest {
    pub name: String,
    pub total_units: i64,
    pub initial_owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<Uuid>,
    pub from_owner: String,
    pub to_owner: String,
    pub units: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_funds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_transfers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_ownership: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageParamsError {
    #[error("limit must be between 1 and {MAX_LIMIT}, got {0}")]
    LimitOutOfRange(u32),
}

/// Pagination window for list endpoints. `None` leaves the server default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PageParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageParams {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Result<Self, PageParamsError> {
        if let Some(limit) = limit
            && !(1..=MAX_LIMIT).contains(&limit)
        {
            return Err(PageParamsError::LimitOutOfRange(limit));
        }
        Ok(Self { limit, offset })
    }

    /// Query string including the leading `?`, or empty when nothing is set.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut pairs = Vec::with_capacity(2);
        if let Some(limit) = self.limit {
            pairs.push(format!("limit={limit}"));
        }
        if let Some(offset) = self.offset {
            pairs.push(format!("offset={offset}"));
        }
        if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs.join("&"))
        }
    }
}
