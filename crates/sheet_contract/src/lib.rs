//! Shared contract types between the bottom-sheet navigation runtime and the sheets it presents.
//!
//! Sheets and view-models opt into navigation behavior by implementing zero or more of the
//! capability traits in [`capability`]. Capability presence is queried through
//! [`NavigationCapabilities`] rather than through a shared base type, so a view-model can confirm
//! navigation without also receiving lifecycle notifications and vice versa.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod capability;
pub mod error;
pub mod parameters;
pub mod sheet;
pub mod state;

pub use capability::{
    confirm_navigation, CapabilityFuture, ConfirmNavigation, ConfirmNavigationAsync,
    NavigationAware, NavigationAwareAsync, NavigationCapabilities,
};
pub use error::{NavigationError, NavigationResult, NavigationStatus, PresenterError};
pub use parameters::NavigationParameters;
pub use sheet::{EntryId, Sheet, SheetOptions, ViewModel};
pub use state::{SheetDetents, SheetState, SheetStateError, SheetStates};
