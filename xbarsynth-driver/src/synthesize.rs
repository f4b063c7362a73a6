// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::Context;
use clap::ArgMatches;
use xbarsynth::{BranchAndBound, DecisionDiagram, SynthConfig, SynthesisMethod, synthesize};

use crate::common::{read_json, write_output};

/// Runs one synthesis flow on the diagram named by the `diagram` argument
/// and writes the crossbar (or topology) text. With `--report`, the
/// synthesis report goes there as JSON.
pub fn handle_synthesize(
    method: SynthesisMethod,
    matches: &ArgMatches,
    config: &SynthConfig,
) -> anyhow::Result<()> {
    let input = matches
        .get_one::<String>("diagram")
        .context("diagram argument is required")?;
    let diagram: DecisionDiagram = read_json(Path::new(input))?;

    let diagrams = if matches
        .get_one::<String>("split")
        .is_some_and(|v| v == "true")
    {
        diagram.split()?.into_values().collect()
    } else {
        vec![diagram]
    };

    let solver = BranchAndBound::new();
    let mut text = String::new();
    let mut reports = Vec::with_capacity(diagrams.len());
    for diagram in &diagrams {
        let synthesis = synthesize(diagram, method, config, &solver)
            .with_context(|| format!("synthesizing '{}' with {}", diagram.name, method))?;
        text.push_str(&synthesis.component.to_text());
        reports.push(synthesis.report);
    }
    write_output(matches.get_one::<String>("output"), &text)?;

    if let Some(report_path) = matches.get_one::<String>("report") {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(report_path, json)
            .with_context(|| format!("writing report {}", report_path))?;
    }
    Ok(())
}
