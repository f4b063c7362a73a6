// SPDX-License-Identifier: Apache-2.0

//! Command line driver over the crossbar synthesis library.
//!
//! Commands are given like:
//!
//! ```text
//! xbarsynth-driver <global-options> <command> <command-args-and-options>
//! ```
//!
//! Commands are:
//!
//! - compact: ILP labeling plus geometric placement onto one crossbar.
//! - direct: one row per node, one column per edge.
//! - path: bipartite partitioning into a selector-crossbar topology.
//! - iso: pattern sharing and load/evaluate scheduling for a multi-output
//!   design.
//! - eval: evaluates a crossbar or topology text file under one instance.
//!
//! Sample usage:
//!
//! ```shell
//! $ cargo run -- --config=xbarsynth.toml compact adder.json --gamma=1.0
//! $ cargo run -- iso design.json --capacity=64
//! $ cargo run -- eval adder.xbar --instance a=1,b=0
//! ```

mod common;
mod eval;
mod iso;
mod report_cli_error;
mod synth_config;
mod synthesize;

use clap::{Arg, ArgAction};
use report_cli_error::{report_cli_error_and_exit, report_error_chain_and_exit};
use xbarsynth::{SynthConfig, SynthesisMethod};

trait AppExt {
    fn add_bool_arg(self, long: &'static str, help: &'static str) -> Self;
    fn add_synth_config_args(self) -> Self;
    fn add_output_arg(self) -> Self;
}

impl AppExt for clap::Command {
    fn add_bool_arg(self, long: &'static str, help: &'static str) -> Self {
        (self as clap::Command).arg(
            Arg::new(long)
                .long(long)
                .value_name("BOOL")
                .action(ArgAction::Set)
                .value_parser(["true", "false"])
                .num_args(1)
                .help(help),
        )
    }

    fn add_synth_config_args(self) -> Self {
        (self as clap::Command)
            .arg(
                Arg::new("gamma")
                    .long("gamma")
                    .value_name("GAMMA")
                    .help("Weight of the semiperimeter against the maximum dimension, in [0, 1]")
                    .action(ArgAction::Set),
            )
            .add_bool_arg(
                "io_constraints",
                "Keep roots and terminals on row wires of layer 0",
            )
            .arg(
                Arg::new("time_limit")
                    .long("time_limit")
                    .value_name("SECONDS")
                    .help("Wall-clock limit for the labeling solve")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("layers")
                    .long("layers")
                    .value_name("LAYERS")
                    .help("Number of memristor layers; more than 1 selects the layered flow")
                    .action(ArgAction::Set),
            )
    }

    fn add_output_arg(self) -> Self {
        (self as clap::Command).arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("PATH")
                .help("Write the result here instead of stdout")
                .action(ArgAction::Set),
        )
    }
}

fn synthesis_command(name: &'static str, about: &'static str) -> clap::Command {
    clap::Command::new(name)
        .about(about)
        .arg(
            Arg::new("diagram")
                .help("Decision diagram as JSON")
                .required(true)
                .index(1),
        )
        .add_synth_config_args()
        .add_output_arg()
        .add_bool_arg("split", "Synthesize each output cone separately")
        .arg(
            Arg::new("report")
                .long("report")
                .value_name("PATH")
                .help("Write the synthesis report as JSON")
                .action(ArgAction::Set),
        )
}

fn main() {
    let _ = env_logger::try_init();

    log::info!(
        "xbarsynth-driver starting; version: {}",
        env!("CARGO_PKG_VERSION")
    );

    let matches = clap::Command::new("xbarsynth-driver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Synthesizes decision diagrams onto memristor crossbars")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("CONFIG")
                .help("Path to an xbarsynth.toml file")
                .action(ArgAction::Set),
        )
        .subcommand(clap::Command::new("version").about("Prints the version of the driver"))
        .subcommand(synthesis_command(
            "compact",
            "Labels the diagram with an ILP and places it on one crossbar",
        ))
        .subcommand(synthesis_command(
            "direct",
            "Maps the diagram with one row per node and one column per edge",
        ))
        .subcommand(synthesis_command(
            "path",
            "Partitions the diagram into a topology of selector crossbars",
        ))
        .subcommand(
            clap::Command::new("iso")
                .about("Shares isomorphic sub-diagrams and schedules them under a capacity budget")
                .arg(
                    Arg::new("design")
                        .help("Multi-output design (sub-diagrams and dependencies) as JSON")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("capacity")
                        .long("capacity")
                        .value_name("D")
                        .help("Square hardware budget; every pattern is fixed when absent")
                        .action(ArgAction::Set),
                )
                .add_output_arg(),
        )
        .subcommand(
            clap::Command::new("eval")
                .about("Evaluates a crossbar or topology text file")
                .arg(
                    Arg::new("xbar")
                        .help("Crossbar or topology text file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("instance")
                        .long("instance")
                        .value_name("BINDINGS")
                        .help("Comma-separated NAME=0|1 bindings")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("input_function")
                        .long("input_function")
                        .value_name("NAME")
                        .help("Input rail receiving current (default: 1)")
                        .action(ArgAction::Set),
                ),
        )
        .get_matches();

    let mut toml_path: Option<String> = matches.get_one::<String>("config").cloned();

    // With no --config flag, an xbarsynth.toml in the current directory is
    // picked up.
    if toml_path.is_none() {
        if let Ok(cwd) = std::env::current_dir() {
            let cwd_toml_path = cwd.join("xbarsynth.toml");
            if cwd_toml_path.exists() {
                log::info!(
                    "Using xbarsynth.toml in current directory: {}",
                    cwd_toml_path.display()
                );
                toml_path = Some(cwd_toml_path.display().to_string());
            }
        }
    }

    let base_config = match toml_path {
        Some(path) => {
            if !std::path::Path::new(&path).exists() {
                report_cli_error_and_exit(
                    "config toml file does not exist",
                    None,
                    vec![("path", &path)],
                );
            }
            synth_config::load_synth_toml(std::path::Path::new(&path))
                .unwrap_or_else(|e| report_error_chain_and_exit(&e, "config"))
        }
        None => SynthConfig::default(),
    };

    let Some((subcommand, sub_matches)) = matches.subcommand() else {
        report_cli_error_and_exit("No valid subcommand provided.", None, vec![]);
    };
    let result = match subcommand {
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "compact" | "direct" | "path" => {
            let method = match subcommand {
                "compact" => SynthesisMethod::Compact,
                "direct" => SynthesisMethod::Direct,
                _ => SynthesisMethod::Path,
            };
            synth_config::resolve_synth_config(sub_matches, &base_config).and_then(|config| {
                synthesize::handle_synthesize(method, sub_matches, &config)
            })
        }
        "iso" => synth_config::resolve_synth_config(sub_matches, &base_config)
            .and_then(|config| iso::handle_iso(sub_matches, &config)),
        "eval" => eval::handle_eval(sub_matches),
        _ => report_cli_error_and_exit("No valid subcommand provided.", None, vec![]),
    };
    if let Err(e) = result {
        report_error_chain_and_exit(&e, subcommand);
    }
}
