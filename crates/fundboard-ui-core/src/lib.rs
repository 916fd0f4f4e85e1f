//! Presentation state shared by Fundboard front ends.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod banner;
pub mod form;
pub mod format;
pub mod list;
pub mod modal;
pub mod views;

pub use banner::{
    ErrorBanner, FUND_FAILED_MESSAGE, LOAD_FAILED_MESSAGE, RESET_FAILED_MESSAGE,
    TRANSFER_FAILED_MESSAGE,
};
pub use form::{FormDraft, FormState, SubmitBlocked};
pub use format::{format_date, format_date_time, format_percentage, format_units, percent_of};
pub use list::ListView;
pub use modal::{CloseTrigger, Modal, ModalKind};
pub use views::{
    CapTableRow, FundDetailView, FundHeader, HoldingRow, MovementRow, OwnerDetailView, OwnerRow,
    OwnersView, TransferRow,
};
