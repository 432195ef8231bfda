//! Navigation errors and non-error navigation outcomes.

use thiserror::Error;

use crate::{sheet::EntryId, state::SheetStateError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failure reported by a platform presenter.
pub enum PresenterError {
    /// The presenter has no surface for the entry.
    #[error("no presented surface for {0}")]
    UnknownEntry(EntryId),
    /// The platform refused or failed the operation.
    #[error("presenter operation `{operation}` failed: {message}")]
    Failed {
        /// Operation token (`open`, `close`, `cancel`).
        operation: &'static str,
        /// Platform-provided detail.
        message: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors surfaced by navigation calls.
///
/// Vetoes and attachment timeouts are not errors; see [`NavigationResult`].
pub enum NavigationError {
    /// No registration exists for the requested name.
    #[error("no sheet registered under `{0}`")]
    SheetNotRegistered(String),
    /// No registration exists for the requested sheet type.
    #[error("no sheet registered for type `{0}`")]
    TypeNotRegistered(&'static str),
    /// `pop`/`current` was used on an empty navigation stack.
    #[error("navigation stack is empty")]
    EmptyStack,
    /// The sheet's detent configuration is invalid.
    #[error(transparent)]
    InvalidState(#[from] SheetStateError),
    /// The platform presenter failed.
    #[error(transparent)]
    Presenter(#[from] PresenterError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How a navigation call ended.
pub enum NavigationStatus {
    /// The navigation step was carried out.
    Completed,
    /// A confirmation predicate declined; nothing changed.
    Cancelled,
    /// There was nothing to do (empty stack, stale presenter notification).
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Successful outcome of a navigation call.
pub struct NavigationResult {
    /// Outcome of the step.
    pub status: NavigationStatus,
    /// Whether the window-attachment wait elapsed and the sheet was opened in forced mode.
    pub presentation_timed_out: bool,
}

impl NavigationResult {
    /// Completed navigation.
    pub const COMPLETED: Self = Self::with_status(NavigationStatus::Completed);
    /// Vetoed navigation.
    pub const CANCELLED: Self = Self::with_status(NavigationStatus::Cancelled);
    /// No-op navigation.
    pub const SKIPPED: Self = Self::with_status(NavigationStatus::Skipped);

    const fn with_status(status: NavigationStatus) -> Self {
        Self {
            status,
            presentation_timed_out: false,
        }
    }

    /// Completed navigation whose open was forced after the attachment timeout.
    pub const fn completed_after_timeout() -> Self {
        Self {
            status: NavigationStatus::Completed,
            presentation_timed_out: true,
        }
    }

    /// Returns whether a confirmation predicate declined the navigation.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.status, NavigationStatus::Cancelled)
    }

    /// Returns whether the navigation step was carried out.
    pub const fn is_completed(&self) -> bool {
        matches!(self.status, NavigationStatus::Completed)
    }
}
