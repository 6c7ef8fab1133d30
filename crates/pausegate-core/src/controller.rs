//! Intervention controller.
//!
//! Owns the navigator, the (at most one) active session and the scheduler
//! that drives its countdowns. Every operation returns the events it caused,
//! in the order they happened.
//!
//! The session's frame sits at a fixed stack index. Step changes rewrite that
//! entry in place with the next category variant; popping below it, resetting
//! the stack, or replacing it with a non-session frame ends the session.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::debounce::Debounce;
use crate::error::{CatalogError, CoreError, Result, SessionError};
use crate::events::{Event, StatsSignal};
use crate::guard::{GuardConfig, SessionMode};
use crate::navigation::{Catalog, Category, FrameId, Navigator, OpenOptions};
use crate::present::{self, ScreenDescriptor};
use crate::session::{
    Choice, CloseReason, Emotion, Session, SessionSettings, SessionState, SessionStep,
};
use crate::timer::{Fired, ManualClock, Scheduler};

use chrono::Utc;

/// The external hand-off to the guarded app.
pub trait TargetApp {
    fn proceed_to_target_app(&mut self);
}

/// Default hand-off: records the hand-off in the log only.
#[derive(Debug, Default)]
pub struct LogTargetApp;

impl TargetApp for LogTargetApp {
    fn proceed_to_target_app(&mut self) {
        info!("handing off to target app");
    }
}

/// User input accepted by [`Controller::handle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Open {
        frame: FrameId,
        #[serde(default)]
        replace: bool,
    },
    Pop,
    Exit,
    Follow {
        label: String,
    },
    /// The user tried to launch the guarded app.
    InterceptLaunch,
    StartSession,
    MarkDone,
    SelectEmotion {
        emotion: Emotion,
    },
    SkipReflection,
    Choose {
        choice: Choice,
    },
    GoToTarget,
    CloseSession,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Open { .. } => "open",
            Command::Pop => "pop",
            Command::Exit => "exit",
            Command::Follow { .. } => "follow",
            Command::InterceptLaunch => "intercept_launch",
            Command::StartSession => "start_session",
            Command::MarkDone => "mark_done",
            Command::SelectEmotion { .. } => "select_emotion",
            Command::SkipReflection => "skip_reflection",
            Command::Choose { .. } => "choose",
            Command::GoToTarget => "go_to_target",
            Command::CloseSession => "close_session",
        }
    }
}

struct ActiveSession {
    session: Session,
    /// Stack index of the session's frame.
    frame_index: usize,
}

fn require<'a>(
    active: &'a mut Option<ActiveSession>,
    input: &'static str,
) -> Result<&'a mut ActiveSession, SessionError> {
    active
        .as_mut()
        .ok_or(SessionError::NoActiveSession { input })
}

pub struct Controller<S: Scheduler> {
    navigator: Navigator,
    active: Option<ActiveSession>,
    scheduler: S,
    guard: GuardConfig,
    settings: SessionSettings,
    debounce: Debounce,
    target: Box<dyn TargetApp>,
}

impl<S: Scheduler> Controller<S> {
    pub fn new(catalog: Catalog, guard: GuardConfig, settings: SessionSettings, scheduler: S) -> Self {
        Self {
            navigator: Navigator::new(catalog),
            active: None,
            scheduler,
            guard,
            settings,
            debounce: Debounce::default(),
            target: Box::new(LogTargetApp),
        }
    }

    pub fn with_debounce(mut self, debounce: Debounce) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_target_app(mut self, target: Box<dyn TargetApp>) -> Self {
        self.target = target;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.active.as_ref().map(|a| a.session.state())
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn guard(&self) -> &GuardConfig {
        &self.guard
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Applies to sessions opened after the call.
    pub fn set_guard_config(&mut self, guard: GuardConfig) {
        self.guard = guard;
    }

    /// The visible frame plus session state, ready for rendering.
    pub fn screen(&self) -> ScreenDescriptor {
        let session = self
            .active
            .as_ref()
            .map(|a| (a.session.state(), a.frame_index));
        present::describe(&self.navigator, session)
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Debounced entry point for user input.
    ///
    /// Invalid session transitions are logged and ignored. Navigation errors
    /// are returned with the stack unchanged.
    pub fn handle(&mut self, command: Command) -> Result<Vec<Event>> {
        let now = self.scheduler.now_ms();
        if !self.debounce.should_accept(now) {
            debug!(command = command.name(), now, "input: debounced");
            return Ok(Vec::new());
        }

        let name = command.name();
        let outcome = match command {
            Command::Open { frame, replace } => self.open(&frame, OpenOptions { replace }),
            Command::Pop => self.pop(),
            Command::Exit => Ok(self.exit()),
            Command::Follow { label } => self.follow(&label),
            Command::InterceptLaunch => self.intercept_launch(),
            Command::StartSession => self.open_session(SessionMode::SelfInitiated),
            Command::MarkDone => self.mark_done(),
            Command::SelectEmotion { emotion } => self.select_emotion(emotion),
            Command::SkipReflection => self.skip_reflection(),
            Command::Choose { choice } => self.choose(choice),
            Command::GoToTarget => self.go_to_target(),
            Command::CloseSession => self.close_session(),
        };

        match outcome {
            Err(CoreError::Session(err)) => {
                warn!(command = name, error = %err, "input: ignored");
                Ok(Vec::new())
            }
            Err(err) => {
                warn!(command = name, error = %err, "input: rejected");
                Err(err)
            }
            ok => ok,
        }
    }

    /// Apply a timer delivery from the scheduler.
    pub fn on_fired(&mut self, fired: Fired) -> Vec<Event> {
        let Some(active) = self.active.as_mut() else {
            warn!(token = fired.token.id(), "timer: delivery without a session");
            return Vec::new();
        };
        let before = active.session.step();
        match active.session.on_tick(fired.token, &mut self.scheduler) {
            Ok(mut events) => {
                self.after_step(before, &mut events);
                events
            }
            Err(err) => {
                warn!(error = %err, "timer: ignored");
                Vec::new()
            }
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    pub fn open(&mut self, frame: &FrameId, opts: OpenOptions) -> Result<Vec<Event>> {
        let replaces_session = opts.replace && self.session_frame_is_top();
        self.navigator.open(frame, opts)?;

        let mut events = Vec::new();
        if replaces_session {
            let is_session_frame = self
                .navigator
                .category_of(frame)
                .zip(self.session().map(|s| s.step.category()))
                .is_some_and(|(a, b)| a == b);
            if !is_session_frame {
                events.extend(self.end_session(CloseReason::NavigatedAway));
            }
        }
        events.push(self.frame_changed());
        Ok(events)
    }

    /// Pop the top frame. At the root this fails with `StackUnderflow`;
    /// use [`Controller::exit`] instead.
    pub fn pop(&mut self) -> Result<Vec<Event>> {
        self.navigator.pop()?;
        let mut events = Vec::new();
        if self
            .active
            .as_ref()
            .is_some_and(|a| a.frame_index >= self.navigator.depth())
        {
            events.extend(self.end_session(CloseReason::NavigatedAway));
        }
        events.push(self.frame_changed());
        Ok(events)
    }

    pub fn reset(&mut self, frame: &FrameId) -> Result<Vec<Event>> {
        self.navigator.reset(frame)?;
        let mut events = self.end_session(CloseReason::NavigatedAway);
        events.push(self.frame_changed());
        Ok(events)
    }

    /// Leave to the root frame. Never fails.
    pub fn exit(&mut self) -> Vec<Event> {
        self.navigator.exit();
        let mut events = self.end_session(CloseReason::NavigatedAway);
        events.push(self.frame_changed());
        events
    }

    pub fn follow(&mut self, label: &str) -> Result<Vec<Event>> {
        let replaces_session = self.session_frame_is_top();
        let depth = self.navigator.depth();
        self.navigator.follow(label)?;

        let mut events = Vec::new();
        // A replacing link swaps the session frame out from under it.
        if replaces_session && self.navigator.depth() == depth {
            events.extend(self.end_session(CloseReason::NavigatedAway));
        }
        events.push(self.frame_changed());
        Ok(events)
    }

    // ── Session ──────────────────────────────────────────────────────

    /// The user tried to open the guarded app.
    ///
    /// With the guard enabled this opens an intercepted session; otherwise
    /// the launch passes straight through to the target app.
    pub fn intercept_launch(&mut self) -> Result<Vec<Event>> {
        if self.guard.enabled {
            return self.open_session(SessionMode::Intercepted);
        }
        if self.active.is_some() {
            return Err(SessionError::AlreadyActive.into());
        }
        info!("guard disabled; passing launch through");
        self.target.proceed_to_target_app();
        Ok(vec![
            Event::signal(StatsSignal::Attempt),
            Event::HandedOff { at: Utc::now() },
        ])
    }

    pub fn open_session(&mut self, mode: SessionMode) -> Result<Vec<Event>> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyActive.into());
        }

        let frame = self
            .navigator
            .next_variant(SessionStep::Action.category(), 0)
            .cloned()
            .ok_or(CatalogError::MissingCategory(Category::Breathing))?;
        self.navigator.open(&frame, OpenOptions::push())?;

        let (session, mut events) =
            Session::open(mode, &self.guard, &self.settings, &mut self.scheduler);
        info!(
            session = %session.state().id,
            mode = ?mode,
            required_seconds = session.state().required_seconds,
            "session: opened"
        );
        self.active = Some(ActiveSession {
            session,
            frame_index: self.navigator.depth() - 1,
        });

        if mode == SessionMode::Intercepted {
            events.push(Event::signal(StatsSignal::Attempt));
        }
        events.push(self.frame_changed());
        Ok(events)
    }

    pub fn mark_done(&mut self) -> Result<Vec<Event>> {
        let active = require(&mut self.active, "mark_done")?;
        let before = active.session.step();
        let mut events = active.session.mark_done(&mut self.scheduler)?;
        self.after_step(before, &mut events);
        Ok(events)
    }

    pub fn select_emotion(&mut self, emotion: Emotion) -> Result<Vec<Event>> {
        let active = require(&mut self.active, "select_emotion")?;
        let before = active.session.step();
        let mut events = active.session.select_emotion(emotion)?;
        self.after_step(before, &mut events);
        Ok(events)
    }

    pub fn skip_reflection(&mut self) -> Result<Vec<Event>> {
        let active = require(&mut self.active, "skip_reflection")?;
        let before = active.session.step();
        let mut events = active.session.skip_reflection()?;
        self.after_step(before, &mut events);
        Ok(events)
    }

    /// Back closes the session; delay and proceed move the machine.
    ///
    /// Only an intercepted session records a return, so returns never
    /// outnumber attempts.
    pub fn choose(&mut self, choice: Choice) -> Result<Vec<Event>> {
        let active = require(&mut self.active, "choose")?;
        if choice == Choice::Back {
            active.session.expect_step(SessionStep::Result, "back")?;
            let intercepted = active.session.state().mode == SessionMode::Intercepted;
            let mut events = self.close_and_unwind(CloseReason::Returned);
            if intercepted {
                events.push(Event::signal(StatsSignal::Return));
            }
            return Ok(events);
        }

        let before = active.session.step();
        let mut events = active.session.choose(choice, &mut self.scheduler)?;
        self.after_step(before, &mut events);
        Ok(events)
    }

    /// Hand off to the target app from the proceed-info step.
    pub fn go_to_target(&mut self) -> Result<Vec<Event>> {
        let active = require(&mut self.active, "go_to_target")?;
        active
            .session
            .expect_step(SessionStep::ProceedInfo, "go_to_target")?;
        if !active.session.state().can_proceed() {
            return Err(SessionError::InvalidTransition {
                step: SessionStep::ProceedInfo,
                input: "go_to_target",
            }
            .into());
        }

        self.target.proceed_to_target_app();
        let mut events = vec![Event::HandedOff { at: Utc::now() }];
        events.extend(self.close_and_unwind(CloseReason::Proceeded));
        Ok(events)
    }

    /// Explicit close from any step.
    pub fn close_session(&mut self) -> Result<Vec<Event>> {
        require(&mut self.active, "close_session")?;
        Ok(self.close_and_unwind(CloseReason::Cancelled))
    }

    /// Close any session and return to the root frame.
    pub fn recover(&mut self) -> Vec<Event> {
        let mut events = self.end_session(CloseReason::Reset);
        self.navigator.exit();
        events.push(self.frame_changed());
        events
    }

    /// Full app reset: as `recover`, and the variant cursor restarts.
    pub fn reset_app(&mut self) -> Vec<Event> {
        let events = self.recover();
        self.navigator.reset_cursor();
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn session_frame_is_top(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.frame_index + 1 == self.navigator.depth())
    }

    fn frame_changed(&self) -> Event {
        let top = self.navigator.top();
        Event::FrameChanged {
            frame: top.frame.clone(),
            category: self.navigator.current_category(),
            transition: top.transition,
            depth: self.navigator.depth(),
            at: Utc::now(),
        }
    }

    /// After a machine transition, move the cursor and show the new step's
    /// variant in the session's stack slot.
    fn after_step(&mut self, before: SessionStep, events: &mut Vec<Event>) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let step = active.session.step();
        if step == before {
            return;
        }
        let index = active.frame_index;
        debug!(from = %before, to = %step, "session: step");

        self.navigator.advance_cursor();
        let Some(frame) = self.navigator.next_variant(step.category(), 0).cloned() else {
            return;
        };
        if let Err(err) = self.navigator.replace_at(index, &frame) {
            warn!(error = %err, "session: frame update failed");
            return;
        }
        if index + 1 == self.navigator.depth() {
            events.push(self.frame_changed());
        }
    }

    /// Drop the session and cancel its timer. Leaves the stack alone.
    fn end_session(&mut self, reason: CloseReason) -> Vec<Event> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };
        let summary = active.session.close(reason, &mut self.scheduler);
        info!(session = %summary.id, reason = reason.as_str(), "session: closed");
        vec![Event::SessionClosed {
            summary,
            at: Utc::now(),
        }]
    }

    /// Drop the session and pop its frame plus anything above it.
    fn close_and_unwind(&mut self, reason: CloseReason) -> Vec<Event> {
        let Some(index) = self.active.as_ref().map(|a| a.frame_index) else {
            return Vec::new();
        };
        let mut events = self.end_session(reason);
        while self.navigator.depth() > index.max(1) {
            if self.navigator.pop().is_err() {
                break;
            }
        }
        events.push(self.frame_changed());
        events
    }
}

impl Controller<ManualClock> {
    /// Move the virtual clock forward, applying every timer that falls due
    /// in order.
    pub fn advance(&mut self, ms: u64) -> Vec<Event> {
        let until = self.scheduler.now_ms().saturating_add(ms);
        let mut events = Vec::new();
        while let Some(fired) = self.scheduler.next_due(until) {
            events.extend(self.on_fired(fired));
        }
        self.scheduler.set_now(until);
        events
    }
}
