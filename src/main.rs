use std::path::PathBuf;
use std::process::ExitCode;

use clap::{command, value_parser, Arg, ArgAction, Command};
use phantom_ammo::config::DEFAULT_CONFIG_FILE;
use phantom_ammo::execute::{create_template, generate_ammo};
use phantom_ammo::logging;
use tracing::{error, Level};

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Path to configuration file, ex: config.json")
        .value_parser(value_parser!(PathBuf))
        .default_value(DEFAULT_CONFIG_FILE)
        .action(ArgAction::Set)
}

fn main() -> ExitCode {
    let cmd = Command::new("phantom-ammo")
        .author(clap::crate_authors!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("generate")
                .about("write the ammo file described by a configuration file")
                .arg(config_arg()),
        )
        .subcommand(
            command!("template")
                .about("create a configuration file template")
                .arg(config_arg()),
        );

    let matches = cmd.get_matches();
    let result = match matches.subcommand() {
        Some(("generate", matches)) => {
            generate_ammo(matches.get_one::<PathBuf>("config").unwrap()).map(|_| ())
        }
        Some(("template", matches)) => create_template(matches.get_one::<PathBuf>("config").unwrap()),
        _ => unreachable!("this should've been prevented"),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // config errors can fail before logging is set up
            logging::init(Level::ERROR, "%H:%M:%S");
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
