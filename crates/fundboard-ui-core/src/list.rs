use fundboard_query::{QueryState, QueryStatus};

use crate::banner::{ErrorBanner, LOAD_FAILED_MESSAGE};

/// What a list region shows. Loading takes precedence over an error, and an
/// error over cached rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView<T> {
    Loading,
    Failed(ErrorBanner),
    Empty,
    Populated(Vec<T>),
}

impl<T> ListView<T> {
    #[must_use]
    pub fn from_query(state: &QueryState, rows: Option<Vec<T>>) -> Self {
        if state.status == QueryStatus::Loading {
            return Self::Loading;
        }
        if let Some(error) = &state.error {
            return Self::Failed(ErrorBanner::from_api(error, LOAD_FAILED_MESSAGE));
        }
        match rows {
            Some(rows) if !rows.is_empty() => Self::Populated(rows),
            Some(_) => Self::Empty,
            None if state.status == QueryStatus::Idle => Self::Loading,
            None => Self::Empty,
        }
    }

    /// Whether a manual retry action is offered.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    #[must_use]
    pub fn rows(&self) -> &[T] {
        match self {
            Self::Populated(rows) => rows,
            _ => &[],
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ListView<U> {
        match self {
            Self::Loading => ListView::Loading,
            Self::Failed(banner) => ListView::Failed(banner),
            Self::Empty => ListView::Empty,
            Self::Populated(rows) => ListView::Populated(rows.into_iter().map(f).collect()),
        }
    }
}
