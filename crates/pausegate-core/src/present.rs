//! Screen descriptors for rendering.
//!
//! Each category maps to one pure view function. Nothing here mutates state;
//! a shell renders whatever [`describe`] returns and forwards user input back
//! to the controller.

use serde::{Deserialize, Serialize};

use crate::guard::{Affordance, SessionMode};
use crate::navigation::{Category, FrameDescriptor, FrameId, Navigator};
use crate::session::{BreathPhase, Choice, Emotion, SessionState, SessionStep};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenDescriptor {
    pub frame: FrameId,
    pub category: Category,
    pub depth: usize,
    /// Artwork and hotspots from the catalog, when it declares any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<FrameDescriptor>,
    /// Link labels that `follow` accepts on this frame.
    pub links: Vec<String>,
    pub view: View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceView {
    pub choice: Choice,
    pub affordance: Affordance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    Home,
    Settings,
    Stats,
    Breathing {
        remaining_seconds: u32,
        required_seconds: u32,
        progress: f64,
        phase: BreathPhase,
        phase_remaining: u32,
    },
    Checkin {
        emotions: Vec<Emotion>,
        selected: Option<Emotion>,
    },
    Decision {
        choices: Vec<ChoiceView>,
    },
    Delay {
        remaining_seconds: u32,
        total_seconds: u32,
    },
    ProceedInfo {
        mode: SessionMode,
        can_proceed: bool,
    },
    /// A session frame on screen with no session driving it.
    Static,
}

/// Describe the top of the stack.
///
/// `session` pairs the live session with the stack index of its frame.
pub fn describe(navigator: &Navigator, session: Option<(&SessionState, usize)>) -> ScreenDescriptor {
    let top = navigator.top();
    let category = navigator.current_category();
    let catalog = navigator.catalog();

    // Session views only apply while the session's own slot is on top.
    let session = session
        .filter(|(s, slot)| slot + 1 == navigator.depth() && s.step.category() == category)
        .map(|(s, _)| s);

    ScreenDescriptor {
        frame: top.frame.clone(),
        category,
        depth: navigator.depth(),
        descriptor: catalog.descriptor(&top.frame).cloned(),
        links: catalog
            .links_from(&top.frame)
            .iter()
            .map(|l| l.label.clone())
            .collect(),
        view: view_for(category, session),
    }
}

fn view_for(category: Category, session: Option<&SessionState>) -> View {
    match category {
        Category::Home => View::Home,
        Category::Settings => View::Settings,
        Category::Stats => View::Stats,
        Category::Breathing => session.map_or(View::Static, breathing),
        Category::Checkin => session.map_or(View::Static, checkin),
        Category::Decision => session.map_or(View::Static, decision),
        Category::Delay => session.map_or(View::Static, delay),
        Category::ProceedInfo => session.map_or(View::Static, proceed_info),
    }
}

fn breathing(state: &SessionState) -> View {
    View::Breathing {
        remaining_seconds: state.remaining_seconds,
        required_seconds: state.required_seconds,
        progress: state.action_progress(),
        phase: state.phase,
        phase_remaining: state.phase_remaining,
    }
}

fn checkin(state: &SessionState) -> View {
    View::Checkin {
        emotions: Emotion::ALL.to_vec(),
        selected: state.selected_emotion,
    }
}

fn decision(state: &SessionState) -> View {
    let mut choices = vec![
        ChoiceView {
            choice: Choice::Back,
            affordance: Affordance::Enabled,
        },
        ChoiceView {
            choice: Choice::Delay,
            affordance: Affordance::Enabled,
        },
    ];
    match state.proceed_affordance() {
        Affordance::Hidden => {}
        affordance => choices.push(ChoiceView {
            choice: Choice::Proceed,
            affordance,
        }),
    }
    View::Decision { choices }
}

fn delay(state: &SessionState) -> View {
    debug_assert_eq!(state.step, SessionStep::Delay);
    View::Delay {
        remaining_seconds: state.delay_remaining_seconds,
        total_seconds: state.delay_seconds,
    }
}

fn proceed_info(state: &SessionState) -> View {
    View::ProceedInfo {
        mode: state.mode,
        can_proceed: state.can_proceed(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::guard::GuardIntensity;
    use crate::navigation::{Catalog, OpenOptions};

    fn state(mode: SessionMode, intensity: GuardIntensity, step: SessionStep) -> SessionState {
        SessionState {
            id: Uuid::new_v4(),
            mode,
            intensity,
            step,
            required_seconds: 90,
            remaining_seconds: 45,
            phase: BreathPhase::Inhale,
            phase_remaining: 4,
            did_complete_action: false,
            selected_emotion: None,
            delay_seconds: 120,
            delay_remaining_seconds: 120,
            opened_at: Utc::now(),
        }
    }

    fn proceed(view: &View) -> Option<Affordance> {
        match view {
            View::Decision { choices } => choices
                .iter()
                .find(|c| c.choice == Choice::Proceed)
                .map(|c| c.affordance),
            other => panic!("expected decision view, got {other:?}"),
        }
    }

    #[test]
    fn home_lists_links() {
        let nav = Navigator::new(Catalog::builtin());
        let screen = describe(&nav, None);
        assert_eq!(screen.category, Category::Home);
        assert_eq!(screen.view, View::Home);
        assert!(screen.links.contains(&"settings".to_string()));
    }

    #[test]
    fn breathing_reports_progress() {
        let s = state(SessionMode::Intercepted, GuardIntensity::Standard, SessionStep::Action);
        match view_for(Category::Breathing, Some(&s)) {
            View::Breathing {
                remaining_seconds,
                progress,
                ..
            } => {
                assert_eq!(remaining_seconds, 45);
                assert!((progress - 0.5).abs() < f64::EPSILON);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn strict_interception_hides_proceed() {
        let s = state(SessionMode::Intercepted, GuardIntensity::Strict, SessionStep::Result);
        assert_eq!(proceed(&decision(&s)), None);
    }

    #[test]
    fn standard_interception_disables_until_complete() {
        let mut s = state(SessionMode::Intercepted, GuardIntensity::Standard, SessionStep::Result);
        assert_eq!(proceed(&decision(&s)), Some(Affordance::Disabled));
        s.did_complete_action = true;
        assert_eq!(proceed(&decision(&s)), Some(Affordance::Enabled));
    }

    #[test]
    fn session_frame_without_session_is_static() {
        let mut nav = Navigator::new(Catalog::builtin());
        nav.open(&FrameId::from("2:40"), OpenOptions::push()).unwrap();
        assert_eq!(describe(&nav, None).view, View::Static);
    }

    #[test]
    fn session_view_requires_its_own_slot_on_top() {
        let mut nav = Navigator::new(Catalog::builtin());
        nav.open(&FrameId::from("1:33"), OpenOptions::push()).unwrap();
        let s = state(SessionMode::Intercepted, GuardIntensity::Standard, SessionStep::Action);
        assert!(matches!(describe(&nav, Some((&s, 1))).view, View::Breathing { .. }));

        // Another breathing frame pushed above the session slot.
        nav.open(&FrameId::from("1:81"), OpenOptions::push()).unwrap();
        assert_eq!(describe(&nav, Some((&s, 1))).view, View::Static);
    }
}
