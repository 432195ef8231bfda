//! Navigation entries and their serializable diagnostic views.

use std::rc::Rc;

use serde::Serialize;
use sheet_contract::{
    EntryId, NavigationCapabilities, Sheet, SheetDetents, SheetState, SheetStateError,
    SheetStates, ViewModel,
};
use sheet_host::PresentRequest;

use crate::registry::ResolvedSheet;

/// One presented sheet on the navigation stack.
pub struct NavigationEntry {
    id: EntryId,
    name: String,
    sheet: Rc<dyn Sheet>,
    view_model: Option<Rc<dyn ViewModel>>,
    detents: SheetDetents,
    cancelable: bool,
    has_handle: bool,
    subscribed: bool,
    surface_dismissed: bool,
}

impl NavigationEntry {
    /// Builds an entry from a resolved sheet.
    ///
    /// # Errors
    ///
    /// Returns [`SheetStateError::EmptyAllowedStates`] when the resolved options allow no detent.
    pub fn new(id: EntryId, resolved: ResolvedSheet) -> Result<Self, SheetStateError> {
        let detents = SheetDetents::new(
            resolved.options.allowed_states,
            resolved.options.initial_state,
        )?;
        Ok(Self {
            id,
            name: resolved.name,
            sheet: resolved.sheet,
            view_model: resolved.view_model,
            detents,
            cancelable: resolved.options.cancelable,
            has_handle: resolved.options.has_handle,
            subscribed: true,
            surface_dismissed: false,
        })
    }

    /// Entry id.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Registration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sheet instance.
    pub fn sheet(&self) -> &Rc<dyn Sheet> {
        &self.sheet
    }

    /// Bound view-model.
    pub fn view_model(&self) -> Option<&Rc<dyn ViewModel>> {
        self.view_model.as_ref()
    }

    /// Downcasts the sheet to its concrete type.
    pub fn sheet_as<T: 'static>(&self) -> Option<&T> {
        let capabilities: &dyn NavigationCapabilities = self.sheet.as_ref();
        capabilities.downcast_ref::<T>()
    }

    /// Downcasts the view-model to its concrete type.
    pub fn view_model_as<T: 'static>(&self) -> Option<&T> {
        let capabilities: &dyn NavigationCapabilities = self.view_model.as_deref()?;
        capabilities.downcast_ref::<T>()
    }

    /// Current detent.
    pub fn state(&self) -> SheetState {
        self.detents.current()
    }

    /// Allowed detents.
    pub fn allowed_states(&self) -> SheetStates {
        self.detents.allowed()
    }

    /// Whether user gestures may dismiss the sheet.
    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// Whether presenter notifications for this entry are still honored.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Whether the presenter closed this entry's surface while it was buried.
    pub fn is_surface_dismissed(&self) -> bool {
        self.surface_dismissed
    }

    pub(crate) fn detents_mut(&mut self) -> &mut SheetDetents {
        &mut self.detents
    }

    pub(crate) fn set_subscribed(&mut self, subscribed: bool) {
        self.subscribed = subscribed;
    }

    pub(crate) fn set_surface_dismissed(&mut self, dismissed: bool) {
        self.surface_dismissed = dismissed;
    }

    /// Capability targets in notification order: the sheet, then its view-model.
    pub(crate) fn targets(&self) -> Vec<Rc<dyn NavigationCapabilities>> {
        let mut targets: Vec<Rc<dyn NavigationCapabilities>> = vec![self.sheet.clone()];
        if let Some(view_model) = &self.view_model {
            targets.push(view_model.clone());
        }
        targets
    }

    pub(crate) fn present_request(&self, forced: bool) -> PresentRequest {
        PresentRequest {
            entry_id: self.id,
            name: self.name.clone(),
            sheet: self.sheet.clone(),
            state: self.detents.current(),
            allowed_states: self.detents.allowed(),
            cancelable: self.cancelable,
            has_handle: self.has_handle,
            forced,
        }
    }

    /// What the presenter may read back about this entry.
    pub fn presentation(&self) -> PresentationSnapshot {
        PresentationSnapshot {
            state: self.detents.current(),
            allowed_states: self.detents.allowed(),
            cancelable: self.cancelable,
        }
    }

    /// Serializable diagnostic view.
    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            id: self.id,
            name: self.name.clone(),
            state: self.detents.current(),
            allowed_states: self.detents.allowed().decompose().collect(),
            cancelable: self.cancelable,
            has_view_model: self.view_model.is_some(),
        }
    }
}

impl std::fmt::Debug for NavigationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("detents", &self.detents)
            .field("cancelable", &self.cancelable)
            .field("subscribed", &self.subscribed)
            .field("surface_dismissed", &self.surface_dismissed)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Logical presentation state exposed to the platform presenter.
pub struct PresentationSnapshot {
    /// Current detent.
    pub state: SheetState,
    /// Allowed detents.
    pub allowed_states: SheetStates,
    /// Whether user gestures may dismiss the sheet.
    pub cancelable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Diagnostic view of one entry.
pub struct EntrySnapshot {
    /// Entry id.
    pub id: EntryId,
    /// Registration name.
    pub name: String,
    /// Current detent.
    pub state: SheetState,
    /// Allowed detents in priority order.
    pub allowed_states: Vec<SheetState>,
    /// Whether user gestures may dismiss the sheet.
    pub cancelable: bool,
    /// Whether a view-model is bound.
    pub has_view_model: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Diagnostic view of the whole stack, bottom first.
pub struct StackSnapshot {
    /// Entries from bottom to top.
    pub entries: Vec<EntrySnapshot>,
}

impl StackSnapshot {
    /// Names from bottom to top.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }
}
