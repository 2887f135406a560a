//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(u64))
        .help("Entity id")
}

/// Build the `hnforge` command
#[must_use]
pub fn command() -> Command {
    Command::new("hnforge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Deterministic collectible renderer and resumable uploader")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file; built-in defaults when omitted"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("backfill")
                .about("Regenerate and upload every pending entity of an id range")
                .arg(
                    Arg::new("from")
                        .long("from")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("First id (inclusive)"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("Last id (exclusive)"),
                )
                .arg(
                    Arg::new("concurrency")
                        .long("concurrency")
                        .value_parser(value_parser!(usize))
                        .help("Entities in flight; overrides the config"),
                )
                .arg(
                    Arg::new("max-attempts")
                        .long("max-attempts")
                        .value_parser(value_parser!(u32))
                        .help("Dispatches per id in this run; overrides the config"),
                )
                .arg(
                    Arg::new("metadata-only")
                        .long("metadata-only")
                        .action(ArgAction::SetTrue)
                        .help("Skip image composition"),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Regenerate entities as contract events arrive"),
        )
        .subcommand(
            Command::new("render")
                .about("Compose images locally without uploading")
                .arg(id_arg())
                .arg(
                    Arg::new("level")
                        .long("level")
                        .value_parser(value_parser!(u8).range(1..=5))
                        .help("Single level; every level when omitted"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output directory"),
                ),
        )
        .subcommand(
            Command::new("derive")
                .about("Print the derived traits and layer order of an entity")
                .arg(id_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                )
                .arg(
                    Arg::new("live")
                        .long("live")
                        .action(ArgAction::SetTrue)
                        .help("Also read the current level and live attributes"),
                ),
        )
}
