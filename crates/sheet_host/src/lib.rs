//! Platform-host contracts consumed by the sheet navigation runtime.
//!
//! The runtime never draws anything. It drives a [`SheetPresenter`] supplied by the platform
//! layer, bounds its waits with a [`HostTimer`], and detaches fire-and-forget work onto a
//! [`TaskSpawner`]. This crate defines those seams plus the adapters used by
//! headless hosts and tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod host;
pub mod presenter;
pub mod spawner;
pub mod timer;

pub use host::SheetHost;
pub use presenter::{
    AttachmentMode, NoopSheetPresenter, PresentRequest, PresenterCommand, PresenterEvent,
    PresenterFuture, RecordingSheetPresenter, SheetPresenter,
};
pub use spawner::{DroppingSpawner, InlineSpawner, LocalPoolSpawner, TaskSpawner};
pub use timer::{ElapsedTimer, HostTimer, PendingTimer, TimerFuture, TokioTimer};
