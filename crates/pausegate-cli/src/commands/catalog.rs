use std::path::PathBuf;

use clap::Subcommand;
use pausegate_core::Config;

use super::load_catalog;

#[derive(Subcommand)]
pub enum CatalogAction {
    /// Print every category with its frames and links
    List {
        /// Catalog file (defaults to the configured or built-in catalog)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Validate a catalog and report the first problem
    Check {
        /// Catalog file (defaults to the configured or built-in catalog)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

pub fn run(action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        CatalogAction::List { file } => {
            let catalog = load_catalog(&config, file.as_deref())?;
            for (category, frames) in catalog.categories() {
                let ids: Vec<&str> = frames.iter().map(|f| f.as_str()).collect();
                println!("{category}: {}", ids.join(", "));
                for frame in frames {
                    for link in catalog.links_from(frame) {
                        let kind = if link.replace { "replace" } else { "push" };
                        println!("  {frame} --{}--> {} ({kind})", link.label, link.to);
                    }
                }
            }
        }
        CatalogAction::Check { file } => {
            let catalog = load_catalog(&config, file.as_deref())?;
            let frames: usize = catalog.categories().map(|(_, f)| f.len()).sum();
            println!("ok: {frames} frames, root {}", catalog.root());
        }
    }
    Ok(())
}
