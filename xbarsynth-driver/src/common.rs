// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Writes `content` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&String>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("writing {}", path))?;
            log::info!("wrote {}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Parses `a=1,b=0` (also `true`/`false`) into an evaluation instance.
pub fn parse_instance(text: &str) -> anyhow::Result<HashMap<String, bool>> {
    let mut instance = HashMap::new();
    for binding in text.split(',').map(str::trim).filter(|b| !b.is_empty()) {
        let Some((name, value)) = binding.split_once('=') else {
            anyhow::bail!("binding '{}' is not of the form NAME=VALUE", binding);
        };
        let value = match value.trim() {
            "1" | "true" => true,
            "0" | "false" => false,
            other => anyhow::bail!("value '{}' for '{}' is not a boolean", other, name),
        };
        instance.insert(name.trim().to_string(), value);
    }
    Ok(instance)
}
