// SPDX-License-Identifier: Apache-2.0

//! Driver error reporting: a colored headline on stderr naming the failing
//! subcommand, indented `key: value` details, then exit status 1.

use colored::Colorize;

const PROGRAM: &str = "xbarsynth-driver";

fn headline(message: &str, subcommand: Option<&str>) -> String {
    match subcommand {
        Some(subcommand) => format!("{}: {}: {}", PROGRAM, subcommand, message.red().bold()),
        None => format!("{}: {}", PROGRAM, message.red().bold()),
    }
}

/// Messages of every error underneath the outermost one.
fn causes(error: &anyhow::Error) -> Vec<String> {
    error.chain().skip(1).map(|cause| cause.to_string()).collect()
}

pub fn report_cli_error_and_exit(
    message: &str,
    subcommand: Option<&str>,
    details: Vec<(&str, &str)>,
) -> ! {
    eprintln!("{}", headline(message, subcommand));
    for (key, value) in details {
        eprintln!("  {}: {}", key, value);
    }
    std::process::exit(1);
}

/// Reports `error` as the headline and each underlying cause as a
/// `caused by` detail.
pub fn report_error_chain_and_exit(error: &anyhow::Error, subcommand: &str) -> ! {
    let causes = causes(error);
    let details = causes.iter().map(|cause| ("caused by", cause.as_str())).collect();
    report_cli_error_and_exit(&error.to_string(), Some(subcommand), details)
}
