//! Guard policy CLI commands.
//!
//! Evaluates the proceed rule for one combination or prints the full
//! truth table.

use clap::{Subcommand, ValueEnum};
use pausegate_core::guard::{self, GuardIntensity, SessionMode};
use serde_json::json;

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Intercepted,
    SelfInitiated,
}

impl From<ModeArg> for SessionMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Intercepted => SessionMode::Intercepted,
            ModeArg::SelfInitiated => SessionMode::SelfInitiated,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum IntensityArg {
    Standard,
    Strict,
}

impl From<IntensityArg> for GuardIntensity {
    fn from(arg: IntensityArg) -> Self {
        match arg {
            IntensityArg::Standard => GuardIntensity::Standard,
            IntensityArg::Strict => GuardIntensity::Strict,
        }
    }
}

#[derive(Subcommand)]
pub enum PolicyAction {
    /// Evaluate one combination
    Check {
        #[arg(long, value_enum)]
        mode: ModeArg,
        #[arg(long, value_enum)]
        intensity: IntensityArg,
        /// The pre-action countdown ran to completion
        #[arg(long)]
        completed: bool,
    },
    /// Print every combination
    Table,
}

fn row(mode: SessionMode, intensity: GuardIntensity, completed: bool) -> serde_json::Value {
    json!({
        "mode": mode,
        "intensity": intensity,
        "did_complete_action": completed,
        "can_proceed": guard::can_proceed(mode, intensity, completed),
        "affordance": guard::proceed_affordance(mode, intensity, completed),
    })
}

pub fn run(action: PolicyAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PolicyAction::Check {
            mode,
            intensity,
            completed,
        } => {
            let out = row(mode.into(), intensity.into(), completed);
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        PolicyAction::Table => {
            for mode in [SessionMode::Intercepted, SessionMode::SelfInitiated] {
                for intensity in [GuardIntensity::Standard, GuardIntensity::Strict] {
                    for completed in [false, true] {
                        println!("{}", serde_json::to_string(&row(mode, intensity, completed))?);
                    }
                }
            }
        }
    }
    Ok(())
}
