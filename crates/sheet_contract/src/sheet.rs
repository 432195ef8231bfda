//! Sheet and view-model contracts plus the options a sheet is presented with.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{
    capability::NavigationCapabilities,
    state::{SheetState, SheetStates},
};

/// Stable identifier of one presented navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sheet#{}", self.0)
    }
}

/// Presentation options resolved for a sheet before it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetOptions {
    /// Detents the sheet may occupy.
    pub allowed_states: SheetStates,
    /// Detent to open at; falls back to the first allowed detent.
    pub initial_state: Option<SheetState>,
    /// Whether user gestures (drag down, tap outside, back) may dismiss the sheet.
    pub cancelable: bool,
    /// Whether the presenter draws a drag handle.
    pub has_handle: bool,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            allowed_states: SheetStates::ALL,
            initial_state: None,
            cancelable: true,
            has_handle: true,
        }
    }
}

/// A presentable bottom sheet.
pub trait Sheet: NavigationCapabilities {
    /// Options the sheet opens with before manifest and registration overrides apply.
    fn options(&self) -> SheetOptions {
        SheetOptions::default()
    }

    /// Binds the resolved view-model as the sheet's data context.
    fn set_binding_context(&self, _view_model: Rc<dyn ViewModel>) {}
}

/// A view-model bound to a sheet.
pub trait ViewModel: NavigationCapabilities {}
