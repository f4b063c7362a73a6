// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use clap::ArgMatches;
use xbarsynth::{Component, Crossbar, Topology};

use crate::common::parse_instance;

pub fn read_component(text: &str) -> anyhow::Result<Component> {
    let is_topology = text.lines().any(|line| line.trim() == ".topo");
    if is_topology {
        Ok(Component::Topology(Topology::from_text(text)?))
    } else {
        Ok(Component::Crossbar(Crossbar::from_text(text)?))
    }
}

/// Evaluates a crossbar or topology text file under one instance and prints
/// the output values as JSON.
pub fn handle_eval(matches: &ArgMatches) -> anyhow::Result<()> {
    let input = matches
        .get_one::<String>("xbar")
        .context("xbar argument is required")?;
    let text = std::fs::read_to_string(input).with_context(|| format!("reading {}", input))?;
    let component = read_component(&text).with_context(|| format!("parsing {}", input))?;

    let instance = match matches.get_one::<String>("instance") {
        Some(bindings) => parse_instance(bindings)?,
        None => Default::default(),
    };
    let input_function = matches
        .get_one::<String>("input_function")
        .map(String::as_str)
        .unwrap_or("1");
    let outputs = component.evaluate(&instance, input_function)?;
    println!("{}", serde_json::to_string(&outputs)?);
    Ok(())
}
