use std::fmt;

use fundboard_domain::PageParams;
use uuid::Uuid;

/// Identifies one cached read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    FundList(PageParams),
    Fund(Uuid),
    CapTable(Uuid),
    Transfers(Uuid),
}

/// Resource type of a key, used to invalidate every key of one kind at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryScope {
    FundLists,
    Funds,
    CapTables,
    Transfers,
}

impl QueryKey {
    #[must_use]
    pub fn scope(&self) -> QueryScope {
        match self {
            Self::FundList(_) => QueryScope::FundLists,
            Self::Fund(_) => QueryScope::Funds,
            Self::CapTable(_) => QueryScope::CapTables,
            Self::Transfers(_) => QueryScope::Transfers,
        }
    }

    #[must_use]
    pub fn fund_id(&self) -> Option<Uuid> {
        match self {
            Self::FundList(_) => None,
            Self::Fund(id) | Self::CapTable(id) | Self::Transfers(id) => Some(*id),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FundList(page) => write!(f, "funds{}", page.query_string()),
            Self::Fund(id) => write!(f, "fund/{id}"),
            Self::CapTable(id) => write!(f, "cap-table/{id}"),
            Self::Transfers(id) => write!(f, "transfers/{id}"),
        }
    }
}
