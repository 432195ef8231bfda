//! Navigation configuration and per-sheet manifests loaded from TOML.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use sheet_contract::{SheetOptions, SheetState, SheetStates};
use thiserror::Error;

/// Default bound on the wait for a sheet's hosting window.
pub const DEFAULT_ATTACH_TIMEOUT_MS: u64 = 500;

#[derive(Debug, Error)]
/// Configuration loading failures.
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse navigation config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A sheet manifest is internally inconsistent.
    #[error("invalid manifest for sheet `{name}`: {reason}")]
    InvalidManifest {
        /// Sheet registration name.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Runtime configuration for a navigation service.
pub struct NavigationConfig {
    /// Bound on the window-attachment wait before an open is forced.
    pub attach_timeout_ms: u64,
    /// Presentation defaults keyed by sheet registration name.
    pub sheets: BTreeMap<String, SheetManifest>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            attach_timeout_ms: DEFAULT_ATTACH_TIMEOUT_MS,
            sheets: BTreeMap::new(),
        }
    }
}

impl NavigationConfig {
    /// Parses and validates a TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::InvalidManifest`] for inconsistent sheet manifests.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every sheet manifest.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidManifest`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sheets
            .iter()
            .try_for_each(|(name, manifest)| manifest.validate(name))
    }

    /// Attachment wait bound as a [`Duration`].
    pub fn attach_timeout(&self) -> Duration {
        Duration::from_millis(self.attach_timeout_ms)
    }

    /// Replaces the attachment wait bound.
    pub fn with_attach_timeout(mut self, timeout: Duration) -> Self {
        self.attach_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Adds or replaces the manifest for `name`.
    pub fn with_sheet(mut self, name: impl Into<String>, manifest: SheetManifest) -> Self {
        self.sheets.insert(name.into(), manifest);
        self
    }

    /// Manifest registered for `name`.
    pub fn manifest(&self, name: &str) -> Option<&SheetManifest> {
        self.sheets.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Declarative presentation defaults for one sheet.
///
/// Unset fields keep whatever the sheet itself reports through `Sheet::options`.
pub struct SheetManifest {
    /// Allowed detents.
    pub allowed_states: Option<Vec<SheetState>>,
    /// Detent to open at.
    pub initial_state: Option<SheetState>,
    /// Whether user gestures may dismiss the sheet.
    pub cancelable: Option<bool>,
    /// Whether the presenter draws a drag handle.
    pub has_handle: Option<bool>,
}

impl SheetManifest {
    /// Layers the manifest over `options`.
    pub fn apply(&self, options: &mut SheetOptions) {
        if let Some(states) = &self.allowed_states {
            options.allowed_states = states.iter().copied().collect();
        }
        if let Some(state) = self.initial_state {
            options.initial_state = Some(state);
        }
        if let Some(cancelable) = self.cancelable {
            options.cancelable = cancelable;
        }
        if let Some(has_handle) = self.has_handle {
            options.has_handle = has_handle;
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &'static str| ConfigError::InvalidManifest {
            name: name.to_string(),
            reason,
        };
        let Some(states) = &self.allowed_states else {
            return Ok(());
        };
        let allowed: SheetStates = states.iter().copied().collect();
        if allowed.is_empty() {
            return Err(invalid("allowed_states must not be empty"));
        }
        match self.initial_state {
            Some(state) if !SheetState::is_allowed(state, allowed) => {
                Err(invalid("initial_state must be one of allowed_states"))
            }
            _ => Ok(()),
        }
    }
}
