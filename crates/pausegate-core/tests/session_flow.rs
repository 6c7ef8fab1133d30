//! End-to-end session scenarios driven through the controller on the
//! virtual clock.

use pausegate_core::controller::{Command, Controller};
use pausegate_core::events::{Event, StatsSignal};
use pausegate_core::guard::{Affordance, GuardConfig, GuardIntensity, SessionMode};
use pausegate_core::navigation::{Catalog, Category, FrameId, OpenOptions};
use pausegate_core::present::View;
use pausegate_core::session::{Choice, CloseReason, SessionSettings, SessionStep};
use pausegate_core::timer::{ManualClock, Scheduler, TICK_INTERVAL_MS};

// ============================================================================
// Helpers
// ============================================================================

fn controller(intensity: GuardIntensity) -> Controller<ManualClock> {
    let guard = GuardConfig {
        intensity,
        min_action_seconds: 90,
        ..GuardConfig::default()
    };
    Controller::new(
        Catalog::builtin(),
        guard,
        SessionSettings::default(),
        ManualClock::new(),
    )
}

fn ticks(c: &mut Controller<ManualClock>, n: u64) -> Vec<Event> {
    c.advance(n * TICK_INTERVAL_MS)
}

fn step(c: &Controller<ManualClock>) -> SessionStep {
    c.session().expect("session is open").step
}

fn proceed_affordance(c: &Controller<ManualClock>) -> Option<Affordance> {
    match c.screen().view {
        View::Decision { choices } => choices
            .into_iter()
            .find(|choice| choice.choice == Choice::Proceed)
            .map(|choice| choice.affordance),
        other => panic!("expected decision view, got {other:?}"),
    }
}

fn closed_reason(events: &[Event]) -> Option<CloseReason> {
    events.iter().find_map(|e| match e {
        Event::SessionClosed { summary, .. } => Some(summary.reason),
        _ => None,
    })
}

// ============================================================================
// Countdown
// ============================================================================

#[test]
fn ninety_ticks_complete_the_action() {
    let mut c = controller(GuardIntensity::Standard);
    c.intercept_launch().unwrap();
    ticks(&mut c, 90);

    let state = c.session().unwrap();
    assert!(state.did_complete_action);
    assert_eq!(state.step, SessionStep::Reflection);
    assert_eq!(c.navigator().current_category(), Category::Checkin);
}

#[test]
fn eighty_nine_ticks_stay_in_action() {
    let mut c = controller(GuardIntensity::Standard);
    c.intercept_launch().unwrap();
    ticks(&mut c, 89);

    let state = c.session().unwrap();
    assert!(!state.did_complete_action);
    assert_eq!(state.step, SessionStep::Action);
    assert_eq!(state.remaining_seconds, 1);
}

#[test]
fn close_at_forty_five_then_reopen_starts_fresh() {
    let mut c = controller(GuardIntensity::Standard);
    c.intercept_launch().unwrap();
    ticks(&mut c, 45);
    assert_eq!(c.session().unwrap().remaining_seconds, 45);
    let first_id = c.session().unwrap().id;

    let events = c.close_session().unwrap();
    assert_eq!(closed_reason(&events), Some(CloseReason::Cancelled));
    assert_eq!(c.scheduler().live_count(), 0);

    c.intercept_launch().unwrap();
    let state = c.session().unwrap();
    assert_ne!(state.id, first_id);
    assert_eq!(state.step, SessionStep::Action);
    assert_eq!(state.remaining_seconds, state.required_seconds);
    assert_eq!(state.remaining_seconds, 90);
}

// ============================================================================
// Guard scenarios
// ============================================================================

#[test]
fn standard_interception_reaches_proceed_info() {
    let mut c = controller(GuardIntensity::Standard);
    let opened = c.intercept_launch().unwrap();
    assert!(opened
        .iter()
        .any(|e| e.as_signal() == Some(StatsSignal::Attempt)));

    ticks(&mut c, 90);
    c.skip_reflection().unwrap();
    assert_eq!(step(&c), SessionStep::Result);
    assert_eq!(proceed_affordance(&c), Some(Affordance::Enabled));

    c.choose(Choice::Proceed).unwrap();
    assert_eq!(step(&c), SessionStep::ProceedInfo);
    assert_eq!(c.navigator().current_category(), Category::ProceedInfo);

    let events = c.go_to_target().unwrap();
    assert!(matches!(events[0], Event::HandedOff { .. }));
    assert_eq!(closed_reason(&events), Some(CloseReason::Proceeded));
    assert_eq!(c.navigator().current_category(), Category::Home);
}

#[test]
fn standard_interception_blocks_early_exit() {
    let mut c = controller(GuardIntensity::Standard);
    c.intercept_launch().unwrap();
    ticks(&mut c, 30);
    c.mark_done().unwrap();
    c.skip_reflection().unwrap();

    assert_eq!(proceed_affordance(&c), Some(Affordance::Disabled));
    assert!(c.choose(Choice::Proceed).is_err());
    assert_eq!(step(&c), SessionStep::Result);
}

#[test]
fn strict_interception_never_offers_proceed() {
    let mut c = controller(GuardIntensity::Strict);
    c.intercept_launch().unwrap();
    ticks(&mut c, 90);
    assert!(c.session().unwrap().did_complete_action);
    c.skip_reflection().unwrap();

    assert_eq!(proceed_affordance(&c), None);
    assert!(c.choose(Choice::Proceed).is_err());

    // Still absent after a delay loop.
    c.choose(Choice::Delay).unwrap();
    ticks(&mut c, 120);
    assert_eq!(step(&c), SessionStep::Result);
    assert_eq!(proceed_affordance(&c), None);

    let events = c.choose(Choice::Back).unwrap();
    assert_eq!(closed_reason(&events), Some(CloseReason::Returned));
    assert_eq!(events.last().and_then(Event::as_signal), Some(StatsSignal::Return));
}

#[test]
fn guard_changes_apply_to_the_next_session_only() {
    let mut c = controller(GuardIntensity::Standard);
    c.intercept_launch().unwrap();
    let strict = GuardConfig {
        intensity: GuardIntensity::Strict,
        ..c.guard().clone()
    };
    c.set_guard_config(strict);
    ticks(&mut c, 90);
    c.skip_reflection().unwrap();
    assert_eq!(proceed_affordance(&c), Some(Affordance::Enabled));

    c.close_session().unwrap();
    c.intercept_launch().unwrap();
    assert_eq!(c.session().unwrap().intensity, GuardIntensity::Strict);
}

// ============================================================================
// Self-initiated delay loop
// ============================================================================

#[test]
fn delay_loop_preserves_completion_flag() {
    for finish_countdown in [true, false] {
        let mut c = controller(GuardIntensity::Strict);
        c.open_session(SessionMode::SelfInitiated).unwrap();
        if finish_countdown {
            ticks(&mut c, 60);
        } else {
            c.mark_done().unwrap();
        }
        let completed = c.session().unwrap().did_complete_action;
        assert_eq!(completed, finish_countdown);

        c.select_emotion("tired".parse().unwrap()).unwrap();
        c.choose(Choice::Delay).unwrap();
        assert_eq!(step(&c), SessionStep::Delay);
        assert_eq!(c.session().unwrap().delay_remaining_seconds, 120);

        ticks(&mut c, 119);
        assert_eq!(step(&c), SessionStep::Delay);
        ticks(&mut c, 1);
        assert_eq!(step(&c), SessionStep::Result);
        assert_eq!(c.session().unwrap().did_complete_action, completed);
        assert_eq!(c.scheduler().live_count(), 0);

        // Self-initiated sessions may always proceed.
        assert_eq!(proceed_affordance(&c), Some(Affordance::Enabled));
    }
}

#[test]
fn returns_never_outnumber_attempts() {
    let mut c = controller(GuardIntensity::Standard);
    let mut signals = Vec::new();
    for mode in [SessionMode::SelfInitiated, SessionMode::SelfInitiated, SessionMode::Intercepted] {
        signals.extend(c.open_session(mode).unwrap());
        c.mark_done().unwrap();
        c.skip_reflection().unwrap();
        signals.extend(c.choose(Choice::Back).unwrap());
    }

    let count = |wanted| {
        signals
            .iter()
            .filter(|e| e.as_signal() == Some(wanted))
            .count()
    };
    assert_eq!(count(StatsSignal::Attempt), 1);
    assert_eq!(count(StatsSignal::Return), 1);
}

// ============================================================================
// Screen
// ============================================================================

#[test]
fn frame_pushed_above_session_shows_static_view() {
    let mut c = controller(GuardIntensity::Standard);
    c.intercept_launch().unwrap();
    ticks(&mut c, 10);
    assert!(matches!(c.screen().view, View::Breathing { .. }));

    c.open(&FrameId::from("1:81"), OpenOptions::push()).unwrap();
    let screen = c.screen();
    assert_eq!(screen.depth, 3);
    assert_eq!(screen.category, Category::Breathing);
    assert_eq!(screen.view, View::Static);

    c.pop().unwrap();
    assert!(matches!(c.screen().view, View::Breathing { remaining_seconds: 80, .. }));
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn leaving_a_timed_step_leaves_no_live_timers() {
    let mut c = controller(GuardIntensity::Standard);
    c.intercept_launch().unwrap();
    ticks(&mut c, 10);
    c.pop().unwrap();
    assert!(c.session().is_none());
    assert_eq!(c.scheduler().live_count(), 0);

    c.open_session(SessionMode::SelfInitiated).unwrap();
    c.mark_done().unwrap();
    c.skip_reflection().unwrap();
    c.choose(Choice::Delay).unwrap();
    ticks(&mut c, 5);
    let events = c.exit();
    assert_eq!(closed_reason(&events), Some(CloseReason::NavigatedAway));
    assert_eq!(c.scheduler().live_count(), 0);
    assert!(ticks(&mut c, 200).is_empty());
}

#[test]
fn recover_returns_home_from_anywhere() {
    let mut c = controller(GuardIntensity::Standard);
    c.intercept_launch().unwrap();
    c.follow("settings").unwrap_err();
    ticks(&mut c, 3);
    let events = c.recover();
    assert_eq!(closed_reason(&events), Some(CloseReason::Reset));
    assert_eq!(c.navigator().depth(), 1);
    assert_eq!(c.navigator().top().frame, *c.navigator().catalog().root());
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn commands_deserialize_from_script_json() {
    let script = r#"[
        {"command": "intercept_launch"},
        {"command": "select_emotion", "emotion": "bored"},
        {"command": "choose", "choice": "delay"},
        {"command": "open", "frame": "4:2"}
    ]"#;
    let commands: Vec<Command> = serde_json::from_str(script).unwrap();
    assert_eq!(commands[0], Command::InterceptLaunch);
    assert!(matches!(commands[3], Command::Open { replace: false, .. }));
}

#[test]
fn handle_drives_a_whole_session() {
    let mut c = controller(GuardIntensity::Standard);
    c.handle(Command::InterceptLaunch).unwrap();
    ticks(&mut c, 90);
    c.handle(Command::SkipReflection).unwrap();
    c.advance(100);
    c.handle(Command::Choose {
        choice: Choice::Proceed,
    })
    .unwrap();

    // A second activation inside the debounce window is dropped.
    let now = c.scheduler().now_ms();
    c.scheduler_mut().set_now(now + 10);
    assert!(c.handle(Command::GoToTarget).unwrap().is_empty());
    assert_eq!(step(&c), SessionStep::ProceedInfo);

    c.scheduler_mut().set_now(now + 100);
    let events = c.handle(Command::GoToTarget).unwrap();
    assert_eq!(closed_reason(&events), Some(CloseReason::Proceeded));
}
