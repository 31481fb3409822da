//! Interactive setup wizard for first-time configuration

use super::MassactConfig;
use config::ConfigError;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use std::path::PathBuf;

/// Interactive first-time setup - prompts for database name, location and stealth support
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The system data directory cannot be determined
/// - User input cannot be read
/// - The configuration cannot be saved
pub fn first_time_setup() -> Result<MassactConfig, ConfigError> {
    println!("Welcome to massact! Let's set up your first course database.\n");

    let default_data_dir = dirs::data_local_dir()
        .ok_or_else(|| ConfigError::Message("Could not determine data directory".to_string()))?
        .join("massact");

    let db_name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Database name")
        .default("default".to_string())
        .interact_text()
        .map_err(|e| ConfigError::Message(format!("Failed to read input: {e}")))?;

    let default_path = default_data_dir.join(&db_name);
    let db_path_str: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Database location")
        .default(default_path.to_string_lossy().to_string())
        .interact_text()
        .map_err(|e| ConfigError::Message(format!("Failed to read input: {e}")))?;

    let allow_stealth = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Allow modules to be available but hidden on the course page?")
        .default(false)
        .interact()
        .map_err(|e| ConfigError::Message(format!("Failed to read input: {e}")))?;

    let mut config = MassactConfig::default();
    config.databases.insert(db_name.clone(), PathBuf::from(db_path_str));
    config.default_database = Some(db_name);
    config.allow_stealth = allow_stealth;

    config.save()?;

    println!("\nConfiguration saved successfully!");
    Ok(config)
}
