//! Deterministic replay of an input script on the virtual clock.
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   { "command": "intercept_launch" },
//!   { "advance_ms": 90000 },
//!   { "command": "skip_reflection" },
//!   { "advance_ms": 100 },
//!   { "command": "choose", "choice": "delay" }
//! ]
//! ```
//!
//! Inputs go through the debounce, so two commands at the same virtual time
//! need an `advance_ms` between them. Every event is printed as a JSON line,
//! followed by the final screen.

use std::path::PathBuf;

use clap::Args;
use pausegate_core::controller::{Command, Controller};
use pausegate_core::timer::ManualClock;
use pausegate_core::{Config, Debounce};
use serde::Deserialize;

use super::{load_catalog, print_events};

#[derive(Args)]
pub struct SimulateArgs {
    /// Script file
    script: PathBuf,
    /// Catalog file (defaults to the configured or built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Accept every input regardless of spacing
    #[arg(long)]
    no_debounce: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Step {
    Advance { advance_ms: u64 },
    Input(Command),
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let catalog = load_catalog(&config, args.catalog.as_deref())?;
    let script = std::fs::read_to_string(&args.script)?;
    let steps: Vec<Step> = serde_json::from_str(&script)?;

    let debounce_ms = if args.no_debounce {
        0
    } else {
        config.input.debounce_ms
    };
    let mut controller = Controller::new(
        catalog,
        config.guard.clone(),
        config.session.clone(),
        ManualClock::new(),
    )
    .with_debounce(Debounce::new(debounce_ms));

    for step in steps {
        let events = match step {
            Step::Advance { advance_ms } => controller.advance(advance_ms),
            Step::Input(command) => match controller.handle(command) {
                Ok(events) => events,
                Err(e) => {
                    eprintln!("warning: {e}");
                    Vec::new()
                }
            },
        };
        print_events(&events)?;
    }

    println!("{}", serde_json::to_string(&controller.screen())?);
    Ok(())
}
