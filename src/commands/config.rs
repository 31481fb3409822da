//! Configuration commands

use crate::cli::ConfigCommands;
use crate::config::MassactConfig;
use crate::{MassactError, Result};

const KEYS: &str = "quiet, allow_stealth, max_sections, acting_user";

/// Split a `key=value` argument
///
/// # Errors
/// Returns `MassactError::InvalidInput` when there is no `=`.
pub fn parse_setting(setting: &str) -> Result<(&str, &str)> {
    setting
        .split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| {
            MassactError::InvalidInput("Invalid format. Use: massact config set key=value".into())
        })
}

/// Handle `massact config ...`
///
/// # Errors
/// Returns `MassactError` for unknown keys, unparsable values or a failed save.
pub fn execute(mut config: MassactConfig, command: &ConfigCommands, quiet: bool) -> Result<()> {
    match command {
        ConfigCommands::Set { setting } => {
            let (key, value) = parse_setting(setting)?;
            config.set_value(key, value).map_err(|e| match e {
                ::config::ConfigError::NotFound(_) => MassactError::InvalidInput(format!(
                    "Unknown configuration key: '{key}'. Available keys: {KEYS}"
                )),
                other => other.into(),
            })?;
            config.save()?;
            if !quiet {
                println!("Set {key} = {value}");
            }
        }
        ConfigCommands::Get { key } => {
            let value = config.get_value(key).ok_or_else(|| {
                MassactError::InvalidInput(format!(
                    "Unknown configuration key: '{key}'. Available keys: {KEYS}, default_database"
                ))
            })?;
            println!("{value}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setting() {
        assert_eq!(parse_setting("max_sections = 10").unwrap(), ("max_sections", "10"));
        assert_eq!(parse_setting("a=b=c").unwrap(), ("a", "b=c"));
        assert!(parse_setting("quiet").is_err());
    }
}
