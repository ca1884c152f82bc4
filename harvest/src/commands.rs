use clap::{arg, command};
use url::Url;

pub const DEFAULT_DB_PATH: &str = "~/.config/harvest/harvest.db";

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn db_arg() -> clap::Arg {
    arg!(-d --"db" <PATH>)
        .required(false)
        .help("Location of the queue database")
        .default_value(DEFAULT_DB_PATH)
}

/// Arguments shared by `run` and `visit`
fn harvest_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-u --"url" <URL>)
            .required(true)
            .help("The directory or profile page to load")
            .value_parser(clap::value_parser!(Url)),
    )
    .arg(db_arg())
    .arg(
        arg!(-o --"out" <DIR>)
            .required(false)
            .help("Directory to write the CSV exports into")
            .value_parser(clap::value_parser!(std::path::PathBuf))
            .default_value("."),
    )
    .arg(
        arg!(--"legacy-header")
            .required(false)
            .help("Write the old header with the name and company labels swapped")
            .action(clap::ArgAction::SetTrue),
    )
    .arg(
        arg!(--"fast")
            .required(false)
            .help("Skip the settle waits between pages")
            .action(clap::ArgAction::SetTrue),
    )
    .arg(
        arg!(--"fingerprint" <KIND>)
            .required(false)
            .help("How page contents are fingerprinted for duplicate detection")
            .value_parser(["base64", "sha256"])
            .default_value("base64"),
    )
    .arg(
        arg!(-t --"timeout" <SECONDS>)
            .required(false)
            .help("HTTP request timeout")
            .value_parser(clap::value_parser!(u64))
            .default_value("20"),
    )
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("harvest")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("harvest")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Show per-page detail in the log")
                .required(false)
                .conflicts_with("quiet"),
        )
        .subcommand_required(false)
        .subcommand(harvest_args(command!("run").about(
            "Load a page and keep following navigations until every queued company \
            has been exported.",
        )))
        .subcommand(harvest_args(command!("visit").about(
            "Handle a single page load and print where the traversal goes next.",
        )))
        .subcommand(
            command!("status")
                .about("Show the persisted company queue")
                .arg(db_arg()),
        )
        .subcommand(
            command!("reset")
                .about("Delete the persisted company queue")
                .arg(db_arg())
                .arg(
                    arg!(-f --"force")
                        .required(false)
                        .help("Remove the whole database file instead of just the queue"),
                ),
        )
}
