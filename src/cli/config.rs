//! `inkboard config`

use anyhow::{Context, Result};
use std::path::Path;

/// Print the effective configuration, or save it to `output`
pub fn run(output: Option<&Path>) -> Result<()> {
    let mut config = inkboard::server::load_config()?;
    for user in &mut config.auth.users {
        user.token = "<redacted>".to_string();
    }

    match output {
        Some(path) => {
            config.save(path)?;
            println!("Configuration written to {}", path.display());
        }
        None => {
            let content =
                toml::to_string_pretty(&config).context("Failed to serialize config")?;
            print!("{}", content);
        }
    }
    Ok(())
}
