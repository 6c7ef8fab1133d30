//! # PauseGate Core Library
//!
//! This library provides the core logic for PauseGate, a tool that interrupts
//! the urge to open a distracting app with a short breathing exercise, an
//! emotion check-in and a deliberate choice. All behaviour is available
//! through the standalone CLI binary; any GUI shell is a renderer over the
//! same controller.
//!
//! ## Architecture
//!
//! - **Navigation**: a validated frame catalog, a stack of frames and a
//!   variant cursor that rotates artwork within a category
//! - **Session**: the intervention state machine (action, reflection, result,
//!   delay, proceed-info) driven by cancellable one-second ticks
//! - **Guard**: pure policy deciding whether a session may end in "proceed"
//! - **Timer**: a `Scheduler` trait with a virtual clock for tests and
//!   scripts plus a tokio-backed clock for live use
//! - **Storage**: TOML configuration and SQLite stats
//!
//! ## Key Components
//!
//! - [`Controller`]: owns navigation, the active session and the scheduler
//! - [`Event`]: everything the controller reports
//! - [`Config`]: application configuration management
//! - [`Database`]: stats counters and the session log

pub mod controller;
pub mod debounce;
pub mod error;
pub mod events;
pub mod guard;
pub mod navigation;
pub mod present;
pub mod session;
pub mod storage;
pub mod timer;

pub use controller::{Command, Controller, LogTargetApp, TargetApp};
pub use debounce::Debounce;
pub use error::{CatalogError, ConfigError, CoreError, DatabaseError, NavigationError, SessionError};
pub use events::{Event, StatsSignal};
pub use guard::{Affordance, GuardConfig, GuardIntensity, SessionMode};
pub use navigation::{Catalog, Category, FrameId, Navigator, OpenOptions};
pub use present::{ScreenDescriptor, View};
pub use session::{Choice, CloseReason, Emotion, SessionSettings, SessionState, SessionStep};
pub use storage::{Config, Database, Stats};
pub use timer::{ManualClock, Scheduler, TokioScheduler};
