//! Subcommands and the settings they share.

pub mod batch;
pub mod config;
pub mod detect;
pub mod extract;
pub mod profiles;

use std::path::{Path, PathBuf};

use tracing::debug;

use livr_core::{DeliveryParser, LivrConfig, PageSelection, ProfileSet};

/// Load the configuration: an explicit file, else the user file if present,
/// else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<LivrConfig> {
    if let Some(path) = config_path {
        return Ok(LivrConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        Ok(LivrConfig::from_file(&default_path)?)
    } else {
        Ok(LivrConfig::default())
    }
}

/// Profile store path: the flag wins over the configuration.
pub fn profiles_path(flag: Option<&Path>, config: &LivrConfig) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(|| config.profiles.path.clone())
}

/// Page selection: the flag wins over the configuration.
pub fn page_selection(flag: Option<&str>, config: &LivrConfig) -> anyhow::Result<PageSelection> {
    let spec = flag.unwrap_or(&config.source.pages);
    Ok(spec.parse::<PageSelection>()?)
}

/// Compile the profile store and build a parser configured for it.
pub fn load_parser(profiles: &Path, config: &LivrConfig) -> anyhow::Result<DeliveryParser> {
    let set = ProfileSet::load(profiles)?;
    debug!("Loaded {} profiles from {}", set.len(), profiles.display());
    Ok(DeliveryParser::from_config(set, &config.extraction))
}
