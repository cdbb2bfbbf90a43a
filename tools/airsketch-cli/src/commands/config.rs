//! Print or initialize the session config.

use std::path::PathBuf;

use airsketch_common::config::{config_file_path, AppConfig};
use airsketch_pipeline::SessionConfig;

pub fn run(init: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = init {
        if path.exists() {
            anyhow::bail!("{} already exists, not overwriting", path.display());
        }
        SessionConfig::default().save(&path)?;
        println!("Wrote default session config to {}", path.display());
        return Ok(());
    }

    let app = AppConfig::load();
    let config = match &app.session_config {
        Some(path) => {
            eprintln!("# session config: {}", path.display());
            SessionConfig::from_file(path)?
        }
        None => {
            eprintln!(
                "# defaults (set session_config in {} to change)",
                config_file_path().display()
            );
            SessionConfig::default()
        }
    };
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
