//! Guard policy - decides whether a session may end in "proceed".
//!
//! ## Rules
//!
//! - **Intercepted, strict**: never. The proceed control is not offered at all.
//! - **Intercepted, standard**: only once the pre-action countdown completed.
//! - **Self-initiated**: always; these sessions are never gated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Strictness of the guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardIntensity {
    /// Proceeding is allowed after the countdown completes.
    #[default]
    Standard,
    /// Proceeding is never allowed.
    Strict,
}

/// Why a session was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// The user tried to open a guarded target app.
    Intercepted,
    /// The user started a pause voluntarily.
    SelfInitiated,
}

/// Guard settings. Owned by the application config; sessions only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub intensity: GuardIntensity,
    /// Length of the pre-action countdown for intercepted sessions.
    #[serde(default = "default_min_action_seconds")]
    pub min_action_seconds: u32,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

fn default_min_action_seconds() -> u32 {
    90
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: GuardIntensity::Standard,
            min_action_seconds: default_min_action_seconds(),
            updated_at: Utc::now(),
        }
    }
}

/// How the proceed control should be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affordance {
    /// The control is absent.
    Hidden,
    /// Shown but not selectable.
    Disabled,
    Enabled,
}

/// Whether "proceed" is permitted. Pure and total.
pub fn can_proceed(mode: SessionMode, intensity: GuardIntensity, did_complete_action: bool) -> bool {
    match (mode, intensity) {
        (SessionMode::Intercepted, GuardIntensity::Strict) => false,
        (SessionMode::Intercepted, GuardIntensity::Standard) => did_complete_action,
        (SessionMode::SelfInitiated, _) => true,
    }
}

/// Presentation of the proceed control for the same inputs as [`can_proceed`].
pub fn proceed_affordance(
    mode: SessionMode,
    intensity: GuardIntensity,
    did_complete_action: bool,
) -> Affordance {
    if mode == SessionMode::Intercepted && intensity == GuardIntensity::Strict {
        return Affordance::Hidden;
    }
    if can_proceed(mode, intensity, did_complete_action) {
        Affordance::Enabled
    } else {
        Affordance::Disabled
    }
}
