use std::path::PathBuf;

use clap::Subcommand;
use taskpulse_core::EngineConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective config as JSON
    Show {
        /// Config TOML to load; defaults when omitted
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Get a config value
    Get {
        /// Config key (e.g. "team.bottleneck_multiplier")
        key: String,
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Set a config value in a config file
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
        #[arg(long, default_value = "taskpulse.toml")]
        path: PathBuf,
    },
    /// Write a config file with default values
    Init {
        #[arg(long, default_value = "taskpulse.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check that a config file loads and is valid
    Validate {
        #[arg(long)]
        path: PathBuf,
    },
}

fn load(path: Option<&PathBuf>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    })
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show { path } => {
            let config = load(path.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key, path } => {
            let config = load(path.as_ref())?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value, path } => {
            let mut config = if path.exists() {
                EngineConfig::load(&path)?
            } else {
                EngineConfig::default()
            };
            config.set(&key, &value)?;
            config.save(&path)?;
            println!("ok");
        }
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                return Err(format!("{} already exists (use --force)", path.display()).into());
            }
            EngineConfig::default().save(&path)?;
            println!("wrote {}", path.display());
        }
        ConfigAction::Validate { path } => {
            EngineConfig::load(&path)?;
            println!("ok");
        }
    }
    Ok(())
}
