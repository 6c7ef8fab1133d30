use clap::Subcommand;
use pausegate_core::storage::Database;
use serde_json::json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Counters plus the most recent sessions
    Show {
        /// Number of logged sessions to include
        #[arg(long, default_value = "10")]
        recent: usize,
    },
    /// Zero the attempt and return counters
    Reset,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Show { recent } => {
            let stats = db.stats()?;
            let sessions = db.recent_sessions(recent)?;
            let out = json!({
                "attempts": stats.attempts,
                "returns": stats.returns,
                "return_rate": stats.return_rate(),
                "recent_sessions": sessions,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        StatsAction::Reset => {
            db.reset_stats()?;
            println!("stats reset");
        }
    }
    Ok(())
}
