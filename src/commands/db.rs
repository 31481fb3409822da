//! Database management commands

use std::path::Path;

use crate::cli::DbCommands;
use crate::config::MassactConfig;
use crate::{MassactError, Result};

fn unknown(name: &str) -> MassactError {
    MassactError::InvalidInput(format!("Database '{name}' does not exist"))
}

/// Handle `massact db ...`
///
/// # Errors
/// Returns `MassactError` if the name is unknown or already taken, or the
/// configuration cannot be saved.
pub fn execute(mut config: MassactConfig, command: &DbCommands, quiet: bool) -> Result<()> {
    match command {
        DbCommands::Add { name, path } => {
            if config.get_database(name).is_some() {
                return Err(MassactError::InvalidInput(format!(
                    "Database '{name}' already exists"
                )));
            }

            let resolved = if path.components().count() == 1 {
                dirs::data_local_dir()
                    .ok_or_else(|| {
                        MassactError::InvalidInput("Could not determine data directory".into())
                    })?
                    .join("massact")
                    .join(path)
            } else {
                path.clone()
            };

            config.add_database(name.clone(), resolved.clone())?;
            if !resolved.exists() {
                std::fs::create_dir_all(&resolved)?;
            }
            if !quiet {
                println!("Database '{name}' added at {}", resolved.display());
            }

            if config.databases.len() == 1 {
                config.set_default_database(name.clone())?;
                if !quiet {
                    println!("Set '{name}' as default database");
                }
            }
        }
        DbCommands::List => {
            if config.databases.is_empty() {
                if !quiet {
                    println!("No databases configured.");
                    println!("Add one with: massact db add <name> <path>");
                }
                return Ok(());
            }
            if !quiet {
                println!("Configured databases:");
            }
            let default = config.default_database.as_deref();
            for name in config.list_databases() {
                let Some(path) = config.get_database(name) else {
                    continue;
                };
                if quiet {
                    println!("{name}");
                } else {
                    let marker = if default == Some(name.as_str()) { " (default)" } else { "" };
                    println!("  {name} -> {}{marker}", path.display());
                }
            }
        }
        DbCommands::Remove { name, delete_files } => {
            if config.get_database(name).is_none() {
                return Err(unknown(name));
            }
            if config.default_database.as_deref() == Some(name.as_str()) && !quiet {
                println!("Warning: Removing the default database. You'll need to set a new default.");
            }

            if let Some(path) = config.remove_database(name)? {
                if !quiet {
                    println!("Database '{name}' removed from configuration");
                }
                if *delete_files {
                    remove_files(&path, quiet);
                } else if !quiet {
                    println!("Note: Database files at {} were NOT deleted", path.display());
                }
            }
        }
        DbCommands::SetDefault { name } => {
            if config.get_database(name).is_none() {
                return Err(unknown(name));
            }
            config.set_default_database(name.clone())?;
            if !quiet {
                println!("Set '{name}' as default database");
            }
        }
    }
    Ok(())
}

fn remove_files(path: &Path, quiet: bool) {
    if !path.exists() {
        if !quiet {
            println!("Database files at {} do not exist (already deleted)", path.display());
        }
        return;
    }
    match std::fs::remove_dir_all(path) {
        Ok(()) if !quiet => println!("Database files deleted from {}", path.display()),
        Ok(()) => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to delete database files");
            if !quiet {
                eprintln!("Warning: Failed to delete database files: {e}");
            }
        }
    }
}
