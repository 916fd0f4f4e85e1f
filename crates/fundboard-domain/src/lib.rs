//! Fund, cap table and transfer types shared by the Fundboard client crates.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod model;
pub mod owners;
pub mod reconcile;
pub mod validation;

pub use model::{
    CapTable, CapTableEntry, CreateFundRequest, CreateTransferRequest, DEFAULT_LIMIT, Fund,
    FundList, MAX_LIMIT, PageParams, PageParamsError, ResetSummary, Transfer, TransferList,
};
pub use owners::{
    AggregatedOwner, OwnerActivity, OwnerHolding, OwnerMovement, TransferDirection,
    aggregate_owners, newest_first, owner_activity,
};
pub use reconcile::{apply_transfer, recompute_percentages};
pub use validation::{
    Field, FieldErrors, FundDraft, TransferDraft, group_thousands, validate_create_fund,
    validate_create_transfer,
};
