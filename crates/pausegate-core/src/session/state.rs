use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::guard::{self, Affordance, GuardIntensity, SessionMode};
use crate::navigation::Category;

/// Length of one breathing half-cycle, in ticks.
pub const PHASE_SECONDS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStep {
    /// Pre-action countdown. The only entry step.
    Action,
    /// Optional emotion check-in.
    Reflection,
    /// Back / delay / proceed choice.
    Result,
    /// Second countdown that loops back to `Result`.
    Delay,
    /// Hand-off information before leaving for the target app.
    ProceedInfo,
}

impl SessionStep {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStep::Action => "action",
            SessionStep::Reflection => "reflection",
            SessionStep::Result => "result",
            SessionStep::Delay => "delay",
            SessionStep::ProceedInfo => "proceed_info",
        }
    }

    /// Frame category shown while the session is in this step.
    pub fn category(self) -> Category {
        match self {
            SessionStep::Action => Category::Breathing,
            SessionStep::Reflection => Category::Checkin,
            SessionStep::Result => Category::Decision,
            SessionStep::Delay => Category::Delay,
            SessionStep::ProceedInfo => Category::ProceedInfo,
        }
    }
}

impl fmt::Display for SessionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathPhase {
    Inhale,
    Exhale,
}

impl BreathPhase {
    pub fn toggled(self) -> Self {
        match self {
            BreathPhase::Inhale => BreathPhase::Exhale,
            BreathPhase::Exhale => BreathPhase::Inhale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Bored,
    Stressed,
    Lonely,
    Tired,
    Anxious,
    Habit,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Bored,
        Emotion::Stressed,
        Emotion::Lonely,
        Emotion::Tired,
        Emotion::Anxious,
        Emotion::Habit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Bored => "bored",
            Emotion::Stressed => "stressed",
            Emotion::Lonely => "lonely",
            Emotion::Tired => "tired",
            Emotion::Anxious => "anxious",
            Emotion::Habit => "habit",
        }
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown emotion '{s}'"))
    }
}

/// Options offered in the result step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    /// Abandon the guarded action.
    Back,
    Delay,
    Proceed,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The user chose Back in the result step.
    Returned,
    /// The user went on to the target app.
    Proceeded,
    /// Explicit close from any step.
    Cancelled,
    /// The session frame was popped or reset away.
    NavigatedAway,
    /// Full app reset or recovery.
    Reset,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::Returned => "returned",
            CloseReason::Proceeded => "proceeded",
            CloseReason::Cancelled => "cancelled",
            CloseReason::NavigatedAway => "navigated_away",
            CloseReason::Reset => "reset",
        }
    }
}

/// Session timing knobs that are not part of the guard itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Countdown length for self-initiated sessions.
    #[serde(default = "default_self_initiated_seconds")]
    pub self_initiated_seconds: u32,
    /// Length of the delay countdown.
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u32,
    /// Whether "I'm done" before the countdown ends satisfies the guard.
    #[serde(default)]
    pub early_exit_counts_as_complete: bool,
}

fn default_self_initiated_seconds() -> u32 {
    60
}

fn default_delay_seconds() -> u32 {
    120
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            self_initiated_seconds: default_self_initiated_seconds(),
            delay_seconds: default_delay_seconds(),
            early_exit_counts_as_complete: false,
        }
    }
}

/// Working memory of one intervention. Discarded on close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub mode: SessionMode,
    /// Guard intensity at the moment the session opened.
    pub intensity: GuardIntensity,
    pub step: SessionStep,
    pub required_seconds: u32,
    pub remaining_seconds: u32,
    pub phase: BreathPhase,
    pub phase_remaining: u32,
    pub did_complete_action: bool,
    pub selected_emotion: Option<Emotion>,
    pub delay_seconds: u32,
    pub delay_remaining_seconds: u32,
    pub opened_at: DateTime<Utc>,
}

impl SessionState {
    pub fn can_proceed(&self) -> bool {
        guard::can_proceed(self.mode, self.intensity, self.did_complete_action)
    }

    pub fn proceed_affordance(&self) -> Affordance {
        guard::proceed_affordance(self.mode, self.intensity, self.did_complete_action)
    }

    /// 0.0 .. 1.0 progress of the pre-action countdown.
    pub fn action_progress(&self) -> f64 {
        if self.required_seconds == 0 {
            return 1.0;
        }
        1.0 - (self.remaining_seconds as f64 / self.required_seconds as f64)
    }
}

/// What is kept of a session after it closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub mode: SessionMode,
    pub reason: CloseReason,
    pub last_step: SessionStep,
    pub required_seconds: u32,
    pub did_complete_action: bool,
    pub selected_emotion: Option<Emotion>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}
