//! Navigation runtime for bottom-sheet surfaces.
//!
//! [`NavigationService`] owns a LIFO [`NavigationStack`] of presented sheets resolved from an
//! immutable [`SheetRegistry`], runs the confirmation and lifecycle protocols in order, and keeps
//! the logical stack reconciled with the platform presenter when a user gesture dismisses a sheet
//! behind the service's back.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod logging;
pub mod model;
pub mod registry;
pub mod service;
pub mod stack;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, NavigationConfig, SheetManifest, DEFAULT_ATTACH_TIMEOUT_MS};
pub use logging::{install_tracing, LoggingError};
pub use model::{EntrySnapshot, NavigationEntry, PresentationSnapshot, StackSnapshot};
pub use registry::{ResolvedSheet, SheetRegistration, SheetRegistry, SheetRegistryBuilder};
pub use service::NavigationService;
pub use stack::NavigationStack;
