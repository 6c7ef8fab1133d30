mod machine;
mod state;

pub use machine::Session;
pub use state::{
    BreathPhase, Choice, CloseReason, Emotion, SessionSettings, SessionState, SessionStep,
    SessionSummary, PHASE_SECONDS,
};
