//! `kvs-console` command line

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use kvs_console::{replay, telemetry, ConsoleConfig, PostSaveAction, Scenario, WriterTransport};

fn cli() -> Command {
    Command::new("kvs-console")
        .version(kvs_console::VERSION)
        .about("Settings console for key-value configured devices")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Console configuration (.toml, .yaml or .yml)"),
        )
        .subcommand(
            Command::new("replay")
                .about("Replay a scenario and print every wire request")
                .arg(
                    Arg::new("scenario")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Scenario file (.json, .yaml or .yml)"),
                )
                .arg(
                    Arg::new("summary")
                        .long("summary")
                        .action(ArgAction::SetTrue)
                        .help("Print follow-ups and rejections after the requests"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as TOML"))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ConsoleConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConsoleConfig::default(),
    };
    telemetry::init(&config)?;

    match matches.subcommand() {
        Some(("replay", args)) => {
            let path = args
                .get_one::<PathBuf>("scenario")
                .context("missing scenario path")?;
            let scenario = Scenario::load(path)?;

            let stdout = std::io::stdout();
            let mut transport = WriterTransport::new(stdout.lock());
            let report = replay(&scenario, config, &mut transport)?;

            if args.get_flag("summary") {
                for (step, message) in &report.rejections {
                    println!("rejected step {step}: {message}");
                }
                for follow_up in &report.follow_ups {
                    if *follow_up != PostSaveAction::None {
                        println!("follow-up: {follow_up:?}");
                    }
                }
                println!(
                    "{} requests, {} fields still dirty",
                    report.patches.len(),
                    report.counters.changed
                );
            }
        }
        Some(("config", _)) => {
            print!("{}", config.to_toml_string()?);
        }
        _ => unreachable!("subcommand required"),
    }

    Ok(())
}
