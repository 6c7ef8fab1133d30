pub mod catalog;
pub mod config;
pub mod policy;
pub mod run;
pub mod simulate;
pub mod stats;

use std::path::Path;

use pausegate_core::events::Event;
use pausegate_core::navigation::Catalog;
use pausegate_core::storage::Database;
use pausegate_core::Config;

/// The catalog named by `file`, else by the config, else the built-in one.
pub fn load_catalog(config: &Config, file: Option<&Path>) -> Result<Catalog, Box<dyn std::error::Error>> {
    let path = file.or(config.catalog_path.as_deref().map(Path::new));
    match path {
        Some(path) => Ok(Catalog::load(path)?),
        None => Ok(Catalog::builtin()),
    }
}

/// Print events as JSON lines on stdout.
pub fn print_events(events: &[Event]) -> Result<(), serde_json::Error> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

/// Feed signals and closed sessions into the stats database.
pub fn record_events(db: &Database, events: &[Event]) {
    for event in events {
        let result = match event {
            Event::Signal { signal, .. } => db.apply_signal(*signal),
            Event::SessionClosed { summary, .. } => db.log_session(summary),
            _ => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "stats: failed to record event");
        }
    }
}
