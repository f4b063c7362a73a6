// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::Context;
use clap::ArgMatches;
use serde::Deserialize;
use xbarsynth::SynthConfig;

/// Layout of an `xbarsynth.toml` file. Every key under `[synth]` is
/// optional; missing keys take the library defaults.
#[derive(Debug, Default, Deserialize)]
pub struct XbarsynthToml {
    #[serde(default)]
    pub synth: SynthConfig,
}

pub fn load_synth_toml(path: &Path) -> anyhow::Result<SynthConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let parsed: XbarsynthToml =
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(parsed.synth)
}

fn parse_flag<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    // Not every subcommand defines every flag.
    let Ok(Some(raw)) = matches.try_get_one::<String>(name) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| anyhow::anyhow!("invalid --{} value '{}': {}", name, raw, e))
}

/// Command-line flags win over the config file, which wins over defaults.
pub fn resolve_synth_config(
    matches: &ArgMatches,
    base: &SynthConfig,
) -> anyhow::Result<SynthConfig> {
    let mut config = base.clone();
    if let Some(gamma) = parse_flag::<f64>(matches, "gamma")? {
        config.gamma = gamma;
    }
    if let Some(io_constraints) = parse_flag::<bool>(matches, "io_constraints")? {
        config.io_constraints = io_constraints;
    }
    if let Some(secs) = parse_flag::<f64>(matches, "time_limit")? {
        config.time_limit_secs = Some(secs);
    }
    if let Some(layers) = parse_flag::<usize>(matches, "layers")? {
        config.layers = layers;
    }
    if let Some(capacity) = parse_flag::<usize>(matches, "capacity")? {
        config.capacity = Some(capacity);
    }
    config.validate().map_err(|msg| anyhow::anyhow!(msg))?;
    log::debug!("resolved synthesis config: {:?}", config);
    Ok(config)
}
