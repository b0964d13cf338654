//! Profiles command - validate and list supplier profiles.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use livr_core::{CompiledProfile, ProfileSet, ProfileStore};

use super::{load_config, profiles_path};

/// Arguments for the profiles command.
#[derive(Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    command: ProfilesCommand,
}

#[derive(Subcommand)]
enum ProfilesCommand {
    /// Compile every profile and report the first broken one
    Validate {
        /// Profile store (default: from configuration)
        path: Option<PathBuf>,
    },

    /// List profiles with their extraction strategy
    List {
        /// Profile store (default: from configuration)
        path: Option<PathBuf>,
    },
}

pub async fn run(args: ProfilesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match args.command {
        ProfilesCommand::Validate { path } => {
            let path = profiles_path(path.as_deref(), &config);
            let store = ProfileStore::from_file(&path)?;
            let set = ProfileSet::compile(&store)?;
            println!(
                "{} {} profiles valid in {}",
                style("✓").green(),
                set.len(),
                path.display()
            );
        }
        ProfilesCommand::List { path } => {
            let path = profiles_path(path.as_deref(), &config);
            let set = ProfileSet::load(&path)?;
            if set.is_empty() {
                println!("{} No profiles in {}", style("ℹ").blue(), path.display());
            }
            for profile in set.iter() {
                println!("{}", describe(profile));
            }
        }
    }

    Ok(())
}

fn describe(profile: &CompiledProfile) -> String {
    let patterns = if profile.detection_patterns.is_empty() {
        "-".to_string()
    } else {
        profile.detection_patterns.join(" | ")
    };
    format!(
        "{:<20} {:<12} {}",
        profile.name,
        profile.strategy.kind(),
        patterns
    )
}
