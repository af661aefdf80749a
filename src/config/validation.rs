//! Configuration validation.
//!
//! Hard errors stop the daemon before any accessory is created. Values that
//! are legal but probably unintended only produce warnings.

use anyhow::Result;
use std::collections::{HashMap, HashSet};

use super::Config;
use crate::constants::OFFSET_WARNING_MINUTES;
use crate::geo::Location;
use crate::state::state_file_name;

pub fn validate_config(config: &Config) -> Result<()> {
    if config.accessories.is_empty() {
        anyhow::bail!("No accessories configured; add at least one [[accessory]] entry");
    }

    // Display names address bridge writes, file names address saved state
    let mut names: HashSet<&str> = HashSet::new();
    let mut files: HashMap<String, &str> = HashMap::new();

    for (position, accessory) in config.accessories.iter().enumerate() {
        let name = accessory.name.as_str();

        if name.trim().is_empty() {
            anyhow::bail!("Accessory #{} has an empty name", position + 1);
        }

        if !names.insert(name) {
            anyhow::bail!("Accessory name '{name}' is used more than once");
        }

        let file = state_file_name(name);
        if let Some(other) = files.insert(file.clone(), name) {
            anyhow::bail!(
                "Accessories '{other}' and '{name}' would share the state file {file}; rename one"
            );
        }

        if let Some(version) = &accessory.version
            && version.trim().is_empty()
        {
            anyhow::bail!("Accessory '{name}': version must not be empty when given");
        }

        let (latitude, longitude) = (
            accessory.location.latitude(),
            accessory.location.longitude(),
        );
        if let Err(e) = Location::new(latitude, longitude) {
            anyhow::bail!("Accessory '{name}': {e}");
        }

        if let Some(offset) = accessory.offset
            && offset.unsigned_abs() > OFFSET_WARNING_MINUTES.unsigned_abs()
        {
            log_warning!(
                "Accessory '{name}': offset of {offset} minutes is more than a week away from the event"
            );
        }
    }

    Ok(())
}
