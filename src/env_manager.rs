use log::debug;
use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Selects the storage slot holding the event collection.
pub const STORAGE_KEY_VAR: &str = "CALGRID_STORAGE_KEY";
/// Directory holding the JSON slot files.
pub const STATE_DIR_VAR: &str = "CALGRID_STATE_DIR";
/// Log filter used by the terminal binary.
pub const LOG_LEVEL_VAR: &str = "CALGRID_LOG_LEVEL";

// Names of optional environment variables
pub const OPTIONAL_ENV_VARS: &[&str] = &[STORAGE_KEY_VAR, STATE_DIR_VAR, LOG_LEVEL_VAR];

/// Loads `.env` into the process environment, returning the file used.
///
/// Runs before the logger exists, so callers log the result themselves.
pub fn load_env_file() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) => {
            debug!("No .env file found or error loading it: {}", e);
            None
        }
    }
}

/// Value of `name`, or `None` when unset or blank.
pub fn get_env_var(name: &str) -> Option<String> {
    non_blank(env::var(name).ok())
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Writes a commented `.env` listing the recognised variables, unless one exists.
pub fn create_env_template(env_path: &Path) -> io::Result<bool> {
    // Don't overwrite existing .env file
    if env_path.exists() {
        return Ok(false);
    }

    let mut file = File::create(env_path)?;
    for var in OPTIONAL_ENV_VARS {
        writeln!(file, "# {}=", var)?;
    }
    Ok(true)
}
