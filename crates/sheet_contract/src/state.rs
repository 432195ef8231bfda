//! Sheet detent model: atomic states, allowed-state sets, and the synchronized pair of both.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

bitflags! {
    /// Set of detents a sheet may occupy.
    ///
    /// Combined values such as `MEDIUM | LARGE` are sets, never a fourth detent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SheetStates: u8 {
        /// Collapsed detent showing only the peek area.
        const PEEK = 1;
        /// Half-height detent.
        const MEDIUM = 1 << 1;
        /// Full-height detent.
        const LARGE = 1 << 2;
        /// Every detent.
        const ALL = Self::PEEK.bits() | Self::MEDIUM.bits() | Self::LARGE.bits();
    }
}

impl SheetStates {
    /// Yields the atomic states contained in this set in priority order.
    pub fn decompose(self) -> impl Iterator<Item = SheetState> {
        SheetState::PRIORITY
            .into_iter()
            .filter(move |state| self.contains(state.flag()))
    }
}

impl Default for SheetStates {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromIterator<SheetState> for SheetStates {
    fn from_iter<I: IntoIterator<Item = SheetState>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, state| set | state.flag())
    }
}

/// One detent a sheet can rest at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SheetState {
    /// Collapsed detent.
    Peek,
    /// Half-height detent.
    Medium,
    /// Full-height detent.
    Large,
}

impl SheetState {
    /// Fallback order used when a default state has to be derived.
    pub const PRIORITY: [SheetState; 3] = [Self::Peek, Self::Medium, Self::Large];

    /// Returns the single-bit flag for this state.
    pub const fn flag(self) -> SheetStates {
        match self {
            Self::Peek => SheetStates::PEEK,
            Self::Medium => SheetStates::MEDIUM,
            Self::Large => SheetStates::LARGE,
        }
    }

    /// Converts a single-bit set back into its atomic state.
    ///
    /// Returns `None` for empty or combined sets.
    pub fn from_flag(flag: SheetStates) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|state| state.flag() == flag)
    }

    /// Returns whether `candidate` is part of `allowed`.
    pub fn is_allowed(candidate: SheetState, allowed: SheetStates) -> bool {
        allowed.contains(candidate.flag())
    }

    /// Returns the first allowed state in [`Self::PRIORITY`] order.
    ///
    /// # Errors
    ///
    /// Returns [`SheetStateError::EmptyAllowedStates`] when `allowed` holds no detent.
    pub fn default_for(allowed: SheetStates) -> Result<SheetState, SheetStateError> {
        allowed
            .decompose()
            .next()
            .ok_or(SheetStateError::EmptyAllowedStates)
    }

    /// Returns a stable lowercase token for diagnostics.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Peek => "peek",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl std::fmt::Display for SheetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
/// Invalid detent configuration or selection.
pub enum SheetStateError {
    /// A sheet was configured without any allowed detent.
    #[error("a sheet must allow at least one state")]
    EmptyAllowedStates,
    /// A state outside the allowed set was requested.
    #[error("state `{state}` is not allowed (allowed: {allowed:?})")]
    NotAllowed {
        /// Requested state.
        state: SheetState,
        /// Allowed set at the time of the request.
        allowed: SheetStates,
    },
}

/// Allowed detents plus the current one, with `current` always contained in `allowed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetDetents {
    allowed: SheetStates,
    current: SheetState,
}

impl SheetDetents {
    /// Creates detents from an allowed set and an optional preferred starting state.
    ///
    /// A preferred state outside `allowed` is replaced by the derived default.
    ///
    /// # Errors
    ///
    /// Returns [`SheetStateError::EmptyAllowedStates`] when `allowed` is empty.
    pub fn new(
        allowed: SheetStates,
        preferred: Option<SheetState>,
    ) -> Result<Self, SheetStateError> {
        let fallback = SheetState::default_for(allowed)?;
        let current = preferred
            .filter(|state| SheetState::is_allowed(*state, allowed))
            .unwrap_or(fallback);
        Ok(Self { allowed, current })
    }

    /// Allowed detents.
    pub fn allowed(&self) -> SheetStates {
        self.allowed
    }

    /// Current detent.
    pub fn current(&self) -> SheetState {
        self.current
    }

    /// Moves to `state`, returning whether the current detent changed.
    ///
    /// # Errors
    ///
    /// Returns [`SheetStateError::NotAllowed`] and leaves the detents untouched when `state` is not
    /// allowed.
    pub fn select(&mut self, state: SheetState) -> Result<bool, SheetStateError> {
        if !SheetState::is_allowed(state, self.allowed) {
            return Err(SheetStateError::NotAllowed {
                state,
                allowed: self.allowed,
            });
        }
        let changed = self.current != state;
        self.current = state;
        Ok(changed)
    }

    /// Replaces the allowed set, re-deriving the current detent when it fell out of the set.
    ///
    /// Returns whether the current detent changed.
    ///
    /// # Errors
    ///
    /// Returns [`SheetStateError::EmptyAllowedStates`] and leaves the detents untouched when
    /// `allowed` is empty.
    pub fn set_allowed(&mut self, allowed: SheetStates) -> Result<bool, SheetStateError> {
        let fallback = SheetState::default_for(allowed)?;
        self.allowed = allowed;
        if SheetState::is_allowed(self.current, allowed) {
            return Ok(false);
        }
        self.current = fallback;
        Ok(true)
    }
}
