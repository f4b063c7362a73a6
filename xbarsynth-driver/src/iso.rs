// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::Context;
use clap::ArgMatches;
use xbarsynth::{DiagramTopology, SynthConfig, schedule_patterns};

use crate::common::{read_json, write_output};

/// Reads a multi-output design as JSON and prints the pattern-sharing report
/// (pattern classes, costs and the load/evaluate schedule) as JSON.
pub fn handle_iso(matches: &ArgMatches, config: &SynthConfig) -> anyhow::Result<()> {
    let input = matches
        .get_one::<String>("design")
        .context("design argument is required")?;
    let mut topology: DiagramTopology = read_json(Path::new(input))?;
    if topology.dependencies.is_empty() {
        topology = DiagramTopology::from_diagrams(topology.diagrams);
    }
    let name = Path::new(input)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "design".to_string());

    let report = schedule_patterns(&name, &topology, config.capacity)?;
    let json = serde_json::to_string_pretty(&report)? + "\n";
    write_output(matches.get_one::<String>("output"), &json)
}
