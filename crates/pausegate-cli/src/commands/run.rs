//! Live session on the tokio scheduler.
//!
//! Reads one command per line from stdin and prints events as JSON lines
//! while the countdowns run in real time. Exits once the session closes.

use clap::Args;
use pausegate_core::controller::{Command, Controller};
use pausegate_core::guard::SessionMode;
use pausegate_core::navigation::FrameId;
use pausegate_core::session::{Choice, Emotion};
use pausegate_core::storage::Database;
use pausegate_core::timer::{Fired, TokioScheduler};
use pausegate_core::{Config, Debounce};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{load_catalog, print_events, record_events};

#[derive(Args)]
pub struct RunArgs {
    /// Start a voluntary pause instead of intercepting a launch
    #[arg(long)]
    self_initiated: bool,
}

#[derive(Debug, PartialEq)]
enum LineInput {
    Command(Command),
    Screen,
    Quit,
}

fn parse_line(line: &str) -> Result<LineInput, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty input".to_string());
    };
    let arg = words.next();
    let need = |what: &str| arg.map(str::to_string).ok_or_else(|| format!("'{head}' needs {what}"));

    let command = match head {
        "done" => Command::MarkDone,
        "emotion" => Command::SelectEmotion {
            emotion: need("an emotion")?.parse::<Emotion>()?,
        },
        "skip" => Command::SkipReflection,
        "back" => Command::Choose {
            choice: Choice::Back,
        },
        "delay" => Command::Choose {
            choice: Choice::Delay,
        },
        "proceed" => Command::Choose {
            choice: Choice::Proceed,
        },
        "go" => Command::GoToTarget,
        "close" => Command::CloseSession,
        "pop" => Command::Pop,
        "open" => Command::Open {
            frame: FrameId::new(need("a frame id")?),
            replace: false,
        },
        "follow" => Command::Follow {
            label: need("a link label")?,
        },
        "screen" => return Ok(LineInput::Screen),
        "quit" | "exit" => return Ok(LineInput::Quit),
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(LineInput::Command(command))
}

enum Input {
    Fired(Option<Fired>),
    Line(std::io::Result<Option<String>>),
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(run_live(args))
}

async fn run_live(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let catalog = load_catalog(&config, None)?;
    let db = match Database::open() {
        Ok(db) => Some(db),
        Err(e) => {
            tracing::warn!(error = %e, "stats unavailable; running without them");
            None
        }
    };

    let mut controller = Controller::new(
        catalog,
        config.guard.clone(),
        config.session.clone(),
        TokioScheduler::new(),
    )
    .with_debounce(Debounce::new(config.input.debounce_ms));

    let opened = if args.self_initiated {
        controller.open_session(SessionMode::SelfInitiated)?
    } else {
        controller.intercept_launch()?
    };
    emit(db.as_ref(), &opened)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while controller.session().is_some() {
        let input = tokio::select! {
            fired = controller.scheduler_mut().recv() => Input::Fired(fired),
            line = lines.next_line() => Input::Line(line),
        };

        let events = match input {
            Input::Fired(Some(fired)) => controller.on_fired(fired),
            Input::Fired(None) => break,
            Input::Line(line) => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_line(&line) {
                    Ok(LineInput::Command(command)) => match controller.handle(command) {
                        Ok(events) => events,
                        Err(e) => {
                            eprintln!("error: {e}");
                            Vec::new()
                        }
                    },
                    Ok(LineInput::Screen) => {
                        println!("{}", serde_json::to_string(&controller.screen())?);
                        Vec::new()
                    }
                    Ok(LineInput::Quit) => break,
                    Err(e) => {
                        eprintln!("error: {e}");
                        Vec::new()
                    }
                }
            }
        };
        emit(db.as_ref(), &events)?;
    }

    // Quitting mid-session still closes it so the log stays complete.
    let closing = controller.recover();
    emit(db.as_ref(), &closing)?;
    println!("{}", serde_json::to_string(&controller.screen())?);
    Ok(())
}

fn emit(db: Option<&Database>, events: &[pausegate_core::Event]) -> Result<(), serde_json::Error> {
    if let Some(db) = db {
        record_events(db, events);
    }
    print_events(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_inputs() {
        assert_eq!(parse_line("done"), Ok(LineInput::Command(Command::MarkDone)));
        assert_eq!(
            parse_line("emotion Stressed"),
            Ok(LineInput::Command(Command::SelectEmotion {
                emotion: Emotion::Stressed
            }))
        );
        assert_eq!(
            parse_line("  delay "),
            Ok(LineInput::Command(Command::Choose {
                choice: Choice::Delay
            }))
        );
        assert_eq!(parse_line("quit"), Ok(LineInput::Quit));
    }

    #[test]
    fn parses_navigation_inputs() {
        assert_eq!(
            parse_line("open 4:2"),
            Ok(LineInput::Command(Command::Open {
                frame: FrameId::from("4:2"),
                replace: false,
            }))
        );
        assert_eq!(
            parse_line("follow stats"),
            Ok(LineInput::Command(Command::Follow {
                label: "stats".to_string()
            }))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_line("emotion").is_err());
        assert!(parse_line("emotion joyful").is_err());
        assert!(parse_line("dance").is_err());
    }
}
