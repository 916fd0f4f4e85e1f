//! Key-addressed cache for Fundboard reads, with optimistic transfer
//! submission.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod cache;
pub mod client;
pub mod key;
pub mod mutation;
pub mod optimistic;

pub use cache::{CachedData, FetchTicket, QueryCache, QueryData, QueryState, QueryStatus};
pub use client::QueryClient;
pub use key::{QueryKey, QueryScope};
pub use mutation::MutationError;
pub use optimistic::PendingTransfer;
