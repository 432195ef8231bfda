//! Tracing subscriber installation for hosts embedding the navigation runtime.

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Debug, Error)]
/// Failures installing the global tracing subscriber.
pub enum LoggingError {
    /// A global subscriber was already set by this process.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[source] tracing::subscriber::SetGlobalDefaultError),
}

fn build_subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
}

/// Installs a global fmt subscriber filtered by `RUST_LOG`, falling back to `default_filter`.
///
/// # Errors
///
/// Returns [`LoggingError::AlreadyInstalled`] when a global subscriber already exists.
pub fn install_tracing(default_filter: &str) -> Result<(), LoggingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing::subscriber::set_global_default(build_subscriber(filter))
        .map_err(LoggingError::AlreadyInstalled)
}
