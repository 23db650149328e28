//! Reading plan documents from disk.

use std::path::Path;

use log::debug;

use crate::{
    error::{ProjectError, Result},
    models::Plan,
};

/// Loads a plan from a file.
///
/// Files ending in `.json` are parsed as JSON; everything else as YAML.
///
/// # Errors
///
/// Returns `ProjectError::FileSystem` if the file cannot be read, or a
/// serialization error if the document does not describe a plan.
pub fn load_plan(path: impl AsRef<Path>) -> Result<Plan> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| ProjectError::FileSystem {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    debug!("Loading plan from {} (json: {is_json})", path.display());

    parse_plan(&contents, is_json)
}

/// Parses a plan document held in memory.
pub fn parse_plan(contents: &str, is_json: bool) -> Result<Plan> {
    if is_json {
        Ok(serde_json::from_str(contents)?)
    } else {
        Ok(serde_yaml::from_str(contents)?)
    }
}
