use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::guard::{GuardIntensity, SessionMode};
use crate::navigation::{Category, FrameId, TransitionKind};
use crate::session::{BreathPhase, Emotion, SessionStep, SessionSummary};

/// Counter increments for the application's stats recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsSignal {
    /// The user tried to open a guarded app.
    Attempt,
    /// The user backed out instead of proceeding.
    Return,
}

/// Every state change in the controller produces an Event.
/// The CLI prints them; the stats recorder consumes `Signal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    FrameChanged {
        frame: FrameId,
        category: Category,
        transition: TransitionKind,
        depth: usize,
        at: DateTime<Utc>,
    },
    SessionOpened {
        session_id: Uuid,
        mode: SessionMode,
        intensity: GuardIntensity,
        required_seconds: u32,
        at: DateTime<Utc>,
    },
    /// One second of a countdown elapsed.
    Ticked {
        step: SessionStep,
        remaining_seconds: u32,
        /// Breathing pacing; only present during the action step.
        phase: Option<BreathPhase>,
        phase_remaining: Option<u32>,
        at: DateTime<Utc>,
    },
    StepChanged {
        from: SessionStep,
        to: SessionStep,
        did_complete_action: bool,
        at: DateTime<Utc>,
    },
    EmotionSelected {
        emotion: Emotion,
        at: DateTime<Utc>,
    },
    SessionClosed {
        summary: SessionSummary,
        at: DateTime<Utc>,
    },
    Signal {
        signal: StatsSignal,
        at: DateTime<Utc>,
    },
    /// Control passed to the target app.
    HandedOff {
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn signal(signal: StatsSignal) -> Self {
        Event::Signal {
            signal,
            at: Utc::now(),
        }
    }

    pub fn as_signal(&self) -> Option<StatsSignal> {
        match self {
            Event::Signal { signal, .. } => Some(*signal),
            _ => None,
        }
    }
}
