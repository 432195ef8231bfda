//! Presenter contract between the navigation runtime and the platform surface, plus adapters.

use std::{cell::RefCell, collections::BTreeSet, future::Future, pin::Pin, rc::Rc};

use futures::channel::oneshot;
use sheet_contract::{EntryId, PresenterError, Sheet, SheetState, SheetStates};

/// Object-safe boxed future used by [`SheetPresenter`] async methods.
pub type PresenterFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Everything the presenter needs to show one entry.
#[derive(Clone)]
pub struct PresentRequest {
    /// Entry being presented.
    pub entry_id: EntryId,
    /// Registration name of the sheet.
    pub name: String,
    /// Sheet instance to render.
    pub sheet: Rc<dyn Sheet>,
    /// Detent to show.
    pub state: SheetState,
    /// Detents the user may drag between.
    pub allowed_states: SheetStates,
    /// Whether user gestures may dismiss the surface.
    pub cancelable: bool,
    /// Whether to draw a drag handle.
    pub has_handle: bool,
    /// Set when the attachment wait timed out and the open proceeds regardless.
    pub forced: bool,
}

impl std::fmt::Debug for PresentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentRequest")
            .field("entry_id", &self.entry_id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("allowed_states", &self.allowed_states)
            .field("cancelable", &self.cancelable)
            .field("has_handle", &self.has_handle)
            .field("forced", &self.forced)
            .finish_non_exhaustive()
    }
}

/// Platform surface driven by the navigation runtime.
///
/// Notifications in the other direction (closed, state changed, canceled by user) are delivered
/// by calling back into the navigation service.
pub trait SheetPresenter {
    /// Resolves once the hosting window can show `entry_id`.
    ///
    /// The runtime bounds this wait, so implementations may leave it pending indefinitely.
    fn wait_attached<'a>(&'a self, entry_id: EntryId) -> PresenterFuture<'a, ()>;

    /// Shows a sheet.
    fn open<'a>(&'a self, request: PresentRequest)
        -> PresenterFuture<'a, Result<(), PresenterError>>;

    /// Dismisses a sheet with its regular close transition.
    fn close<'a>(&'a self, entry_id: EntryId) -> PresenterFuture<'a, Result<(), PresenterError>>;

    /// Tears a sheet down without a close transition.
    ///
    /// Used after a user gesture already dismissed the surface; must tolerate surfaces that are
    /// already gone.
    fn cancel<'a>(&'a self, entry_id: EntryId) -> PresenterFuture<'a, Result<(), PresenterError>>;

    /// Moves a presented sheet to `state`.
    fn set_current_state(&self, entry_id: EntryId, state: SheetState);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Notifications raised by the presenter.
pub enum PresenterEvent {
    /// The surface closed on its own (system back, animation finished after a gesture).
    Closed,
    /// The user dragged the sheet to another detent.
    StateChanged(SheetState),
    /// A user gesture asked to dismiss the sheet.
    CanceledByUser,
}

impl PresenterEvent {
    /// Returns a stable string token for diagnostics.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::StateChanged(_) => "state-changed",
            Self::CanceledByUser => "canceled-by-user",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Presenter for hosts without a visible surface.
pub struct NoopSheetPresenter;

impl SheetPresenter for NoopSheetPresenter {
    fn wait_attached<'a>(&'a self, _entry_id: EntryId) -> PresenterFuture<'a, ()> {
        Box::pin(async {})
    }

    fn open<'a>(
        &'a self,
        _request: PresentRequest,
    ) -> PresenterFuture<'a, Result<(), PresenterError>> {
        Box::pin(async { Ok(()) })
    }

    fn close<'a>(&'a self, _entry_id: EntryId) -> PresenterFuture<'a, Result<(), PresenterError>> {
        Box::pin(async { Ok(()) })
    }

    fn cancel<'a>(
        &'a self,
        _entry_id: EntryId,
    ) -> PresenterFuture<'a, Result<(), PresenterError>> {
        Box::pin(async { Ok(()) })
    }

    fn set_current_state(&self, _entry_id: EntryId, _state: SheetState) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One command received by a [`RecordingSheetPresenter`].
pub enum PresenterCommand {
    /// `open` call.
    Open {
        /// Entry opened.
        entry_id: EntryId,
        /// Registration name.
        name: String,
        /// Detent requested.
        state: SheetState,
        /// Allowed detents.
        allowed_states: SheetStates,
        /// Whether the open was forced after an attachment timeout.
        forced: bool,
    },
    /// `close` call.
    Close {
        /// Entry closed.
        entry_id: EntryId,
    },
    /// `cancel` call.
    Cancel {
        /// Entry canceled.
        entry_id: EntryId,
    },
    /// `set_current_state` call.
    SetCurrentState {
        /// Entry moved.
        entry_id: EntryId,
        /// Detent requested.
        state: SheetState,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// How a [`RecordingSheetPresenter`] answers attachment waits.
pub enum AttachmentMode {
    /// Attached right away.
    #[default]
    Immediate,
    /// Never attached; only the runtime timeout ends the wait.
    Never,
    /// Attached when [`RecordingSheetPresenter::attach_pending`] is called.
    Manual,
}

#[derive(Default)]
struct RecordingState {
    commands: Vec<PresenterCommand>,
    visible: BTreeSet<EntryId>,
    attachment: AttachmentMode,
    pending_attachments: Vec<oneshot::Sender<()>>,
    fail_next: Option<&'static str>,
}

impl RecordingState {
    fn take_failure(&mut self, operation: &'static str) -> Result<(), PresenterError> {
        if self.fail_next == Some(operation) {
            self.fail_next = None;
            return Err(PresenterError::Failed {
                operation,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
/// In-memory presenter that records every command and tracks which surfaces are visible.
pub struct RecordingSheetPresenter {
    inner: Rc<RefCell<RecordingState>>,
}

impl RecordingSheetPresenter {
    /// Creates a presenter answering attachment waits according to `mode`.
    pub fn with_attachment(mode: AttachmentMode) -> Self {
        let presenter = Self::default();
        presenter.inner.borrow_mut().attachment = mode;
        presenter
    }

    /// Returns a copy of the recorded commands.
    pub fn commands(&self) -> Vec<PresenterCommand> {
        self.inner.borrow().commands.clone()
    }

    /// Drains the recorded commands.
    pub fn take_commands(&self) -> Vec<PresenterCommand> {
        std::mem::take(&mut self.inner.borrow_mut().commands)
    }

    /// Returns whether `entry_id` is currently shown.
    pub fn is_visible(&self, entry_id: EntryId) -> bool {
        self.inner.borrow().visible.contains(&entry_id)
    }

    /// Returns the shown entries in id order.
    pub fn visible_entries(&self) -> Vec<EntryId> {
        self.inner.borrow().visible.iter().copied().collect()
    }

    /// Completes every attachment wait issued so far in [`AttachmentMode::Manual`].
    pub fn attach_pending(&self) {
        let pending = std::mem::take(&mut self.inner.borrow_mut().pending_attachments);
        for sender in pending {
            let _ = sender.send(());
        }
    }

    /// Makes the next call of `operation` (`open`, `close`, `cancel`) fail.
    pub fn fail_next(&self, operation: &'static str) {
        self.inner.borrow_mut().fail_next = Some(operation);
    }

    /// Hides a surface the way a platform gesture would, without recording a command.
    pub fn dismiss_by_gesture(&self, entry_id: EntryId) {
        self.inner.borrow_mut().visible.remove(&entry_id);
    }
}

impl SheetPresenter for RecordingSheetPresenter {
    fn wait_attached<'a>(&'a self, _entry_id: EntryId) -> PresenterFuture<'a, ()> {
        let mode = self.inner.borrow().attachment;
        match mode {
            AttachmentMode::Immediate => Box::pin(async {}),
            AttachmentMode::Never => Box::pin(futures::future::pending()),
            AttachmentMode::Manual => {
                let (sender, receiver) = oneshot::channel();
                self.inner.borrow_mut().pending_attachments.push(sender);
                Box::pin(async move {
                    let _ = receiver.await;
                })
            }
        }
    }

    fn open<'a>(
        &'a self,
        request: PresentRequest,
    ) -> PresenterFuture<'a, Result<(), PresenterError>> {
        Box::pin(async move {
            let mut inner = self.inner.borrow_mut();
            inner.take_failure("open")?;
            inner.commands.push(PresenterCommand::Open {
                entry_id: request.entry_id,
                name: request.name,
                state: request.state,
                allowed_states: request.allowed_states,
                forced: request.forced,
            });
            inner.visible.insert(request.entry_id);
            Ok(())
        })
    }

    fn close<'a>(&'a self, entry_id: EntryId) -> PresenterFuture<'a, Result<(), PresenterError>> {
        Box::pin(async move {
            let mut inner = self.inner.borrow_mut();
            inner.take_failure("close")?;
            if !inner.visible.remove(&entry_id) {
                return Err(PresenterError::UnknownEntry(entry_id));
            }
            inner.commands.push(PresenterCommand::Close { entry_id });
            Ok(())
        })
    }

    fn cancel<'a>(&'a self, entry_id: EntryId) -> PresenterFuture<'a, Result<(), PresenterError>> {
        Box::pin(async move {
            let mut inner = self.inner.borrow_mut();
            inner.take_failure("cancel")?;
            inner.visible.remove(&entry_id);
            inner.commands.push(PresenterCommand::Cancel { entry_id });
            Ok(())
        })
    }

    fn set_current_state(&self, entry_id: EntryId, state: SheetState) {
        self.inner
            .borrow_mut()
            .commands
            .push(PresenterCommand::SetCurrentState { entry_id, state });
    }
}
