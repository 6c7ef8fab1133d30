//! Intervention session state machine.
//!
//! ## Steps
//!
//! ```text
//! Action -> Reflection -> Result -> (Delay -> Result | ProceedInfo)
//! ```
//!
//! The machine owns at most one repeating timer (the action or delay
//! countdown) and cancels it on every exit from a timed step. Closing is
//! explicit and consumes the session, so nothing can tick after it.
//!
//! ## Usage
//!
//! ```ignore
//! let (mut session, events) = Session::open(mode, &guard, &settings, &mut clock);
//! // For each delivery from the scheduler:
//! session.on_tick(fired.token, &mut clock)?;
//! ```

use chrono::Utc;
use uuid::Uuid;

use super::state::{
    BreathPhase, Choice, CloseReason, Emotion, SessionSettings, SessionState, SessionStep,
    SessionSummary, PHASE_SECONDS,
};
use crate::error::SessionError;
use crate::events::Event;
use crate::guard::{GuardConfig, SessionMode};
use crate::timer::{CancelToken, Scheduler, TimerTask, TICK_INTERVAL_MS};

#[derive(Debug)]
pub struct Session {
    state: SessionState,
    settings: SessionSettings,
    timer: Option<CancelToken>,
}

impl Session {
    /// Open a session in the action step and start its countdown.
    pub fn open(
        mode: SessionMode,
        guard: &GuardConfig,
        settings: &SessionSettings,
        scheduler: &mut dyn Scheduler,
    ) -> (Self, Vec<Event>) {
        let required_seconds = match mode {
            SessionMode::Intercepted => guard.min_action_seconds,
            SessionMode::SelfInitiated => settings.self_initiated_seconds,
        }
        .max(1);

        let state = SessionState {
            id: Uuid::new_v4(),
            mode,
            intensity: guard.intensity,
            step: SessionStep::Action,
            required_seconds,
            remaining_seconds: required_seconds,
            phase: BreathPhase::Inhale,
            phase_remaining: PHASE_SECONDS,
            did_complete_action: false,
            selected_emotion: None,
            delay_seconds: settings.delay_seconds.max(1),
            delay_remaining_seconds: 0,
            opened_at: Utc::now(),
        };

        let timer = scheduler.schedule_repeating(TICK_INTERVAL_MS, TimerTask::SessionTick);
        let event = Event::SessionOpened {
            session_id: state.id,
            mode,
            intensity: state.intensity,
            required_seconds,
            at: state.opened_at,
        };

        (
            Self {
                state,
                settings: settings.clone(),
                timer: Some(timer),
            },
            vec![event],
        )
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn step(&self) -> SessionStep {
        self.state.step
    }

    /// The countdown timer currently owned by the session.
    pub fn timer(&self) -> Option<CancelToken> {
        self.timer
    }

    /// Fail with `InvalidTransition` unless the session is in `step`.
    pub fn expect_step(&self, step: SessionStep, input: &'static str) -> Result<(), SessionError> {
        if self.state.step == step {
            Ok(())
        } else {
            Err(self.invalid(input))
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply one second of the running countdown.
    pub fn on_tick(
        &mut self,
        token: CancelToken,
        scheduler: &mut dyn Scheduler,
    ) -> Result<Vec<Event>, SessionError> {
        if self.timer != Some(token) {
            return Err(self.invalid("tick"));
        }

        match self.state.step {
            SessionStep::Action => {
                let state = &mut self.state;
                state.remaining_seconds = state.remaining_seconds.saturating_sub(1);
                state.phase_remaining = state.phase_remaining.saturating_sub(1);
                if state.phase_remaining == 0 {
                    state.phase = state.phase.toggled();
                    state.phase_remaining = PHASE_SECONDS;
                }
                let mut events = vec![Event::Ticked {
                    step: SessionStep::Action,
                    remaining_seconds: state.remaining_seconds,
                    phase: Some(state.phase),
                    phase_remaining: Some(state.phase_remaining),
                    at: Utc::now(),
                }];

                if self.state.remaining_seconds == 0 {
                    self.state.did_complete_action = true;
                    self.stop_timer(scheduler);
                    events.push(self.enter(SessionStep::Reflection));
                }
                Ok(events)
            }
            SessionStep::Delay => {
                let state = &mut self.state;
                state.delay_remaining_seconds = state.delay_remaining_seconds.saturating_sub(1);
                let mut events = vec![Event::Ticked {
                    step: SessionStep::Delay,
                    remaining_seconds: state.delay_remaining_seconds,
                    phase: None,
                    phase_remaining: None,
                    at: Utc::now(),
                }];

                if self.state.delay_remaining_seconds == 0 {
                    self.stop_timer(scheduler);
                    events.push(self.enter(SessionStep::Result));
                }
                Ok(events)
            }
            _ => Err(self.invalid("tick")),
        }
    }

    /// "I'm done": leave the countdown early.
    ///
    /// An early exit does not satisfy the guard unless
    /// `early_exit_counts_as_complete` is set.
    pub fn mark_done(&mut self, scheduler: &mut dyn Scheduler) -> Result<Vec<Event>, SessionError> {
        self.expect_step(SessionStep::Action, "mark_done")?;
        self.stop_timer(scheduler);
        if self.settings.early_exit_counts_as_complete || self.state.remaining_seconds == 0 {
            self.state.did_complete_action = true;
        }
        Ok(vec![self.enter(SessionStep::Reflection)])
    }

    pub fn select_emotion(&mut self, emotion: Emotion) -> Result<Vec<Event>, SessionError> {
        self.expect_step(SessionStep::Reflection, "select_emotion")?;
        self.state.selected_emotion = Some(emotion);
        Ok(vec![
            Event::EmotionSelected {
                emotion,
                at: Utc::now(),
            },
            self.enter(SessionStep::Result),
        ])
    }

    /// Skip (or back out of) the reflection step.
    pub fn skip_reflection(&mut self) -> Result<Vec<Event>, SessionError> {
        self.expect_step(SessionStep::Reflection, "skip_reflection")?;
        Ok(vec![self.enter(SessionStep::Result)])
    }

    /// Delay or proceed from the result step.
    ///
    /// `Choice::Back` ends the session, which only the owner can do; it is
    /// rejected here so callers route it through `close`.
    pub fn choose(
        &mut self,
        choice: Choice,
        scheduler: &mut dyn Scheduler,
    ) -> Result<Vec<Event>, SessionError> {
        match choice {
            Choice::Back => Err(self.invalid("back")),
            Choice::Delay => {
                self.expect_step(SessionStep::Result, "delay")?;
                self.state.delay_remaining_seconds = self.state.delay_seconds;
                self.stop_timer(scheduler);
                self.timer =
                    Some(scheduler.schedule_repeating(TICK_INTERVAL_MS, TimerTask::SessionTick));
                Ok(vec![self.enter(SessionStep::Delay)])
            }
            Choice::Proceed => {
                self.expect_step(SessionStep::Result, "proceed")?;
                if !self.state.can_proceed() {
                    return Err(self.invalid("proceed"));
                }
                Ok(vec![self.enter(SessionStep::ProceedInfo)])
            }
        }
    }

    /// End the session. Its timer is cancelled before this returns.
    pub fn close(mut self, reason: CloseReason, scheduler: &mut dyn Scheduler) -> SessionSummary {
        self.stop_timer(scheduler);
        SessionSummary {
            id: self.state.id,
            mode: self.state.mode,
            reason,
            last_step: self.state.step,
            required_seconds: self.state.required_seconds,
            did_complete_action: self.state.did_complete_action,
            selected_emotion: self.state.selected_emotion,
            opened_at: self.state.opened_at,
            closed_at: Utc::now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter(&mut self, to: SessionStep) -> Event {
        let from = self.state.step;
        self.state.step = to;
        Event::StepChanged {
            from,
            to,
            did_complete_action: self.state.did_complete_action,
            at: Utc::now(),
        }
    }

    fn stop_timer(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(token) = self.timer.take() {
            scheduler.cancel(token);
        }
    }

    fn invalid(&self, input: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            step: self.state.step,
            input,
        }
    }
}
