//! formctl: command-line access to Formwright documents

mod commands;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use commands::{IdScheme, Outcome};
use form_core::FormwrightConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("formctl")
        .version(form_core::VERSION)
        .about("Inspect, edit and validate Formwright form documents")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (.toml, .yaml or .yml)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("check")
                .about("Decode a persisted document and summarize it")
                .arg(
                    Arg::new("document")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Persisted document (JSON array of sections)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("apply")
                .about("Apply mutation commands atomically and print the new document")
                .arg(
                    Arg::new("document")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Persisted document"),
                )
                .arg(
                    Arg::new("commands")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Command file: one command object or an array"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the result here instead of stdout"),
                )
                .arg(
                    Arg::new("sequential-ids")
                        .long("sequential-ids")
                        .action(ArgAction::SetTrue)
                        .help("Assign field-N / section-N ids instead of ULIDs"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate submitted answers against a document")
                .arg(
                    Arg::new("document")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Persisted document"),
                )
                .arg(
                    Arg::new("answers")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Answers file: object of field id to string"),
                ),
        )
        .subcommand(Command::new("schema").about("Print the mutation command JSON Schema"))
}

fn init_logging(config: &FormwrightConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn path(args: &ArgMatches, name: &str) -> PathBuf {
    args.get_one::<PathBuf>(name).cloned().unwrap_or_default()
}

fn run(matches: &ArgMatches) -> Result<Outcome> {
    match matches.subcommand() {
        Some(("check", args)) => commands::check(&path(args, "document"), args.get_flag("json")),
        Some(("apply", args)) => {
            let ids = if args.get_flag("sequential-ids") {
                IdScheme::Sequential
            } else {
                IdScheme::Ulid
            };
            let outcome = commands::apply(&path(args, "document"), &path(args, "commands"), ids)?;
            match args.get_one::<PathBuf>("output") {
                Some(output) => {
                    std::fs::write(output, &outcome.output)?;
                    Ok(Outcome {
                        output: format!("wrote {}", output.display()),
                        success: true,
                    })
                }
                None => Ok(outcome),
            }
        }
        Some(("validate", args)) => {
            commands::validate(&path(args, "document"), &path(args, "answers"))
        }
        Some(("schema", _)) => commands::schema(),
        _ => anyhow::bail!("unknown subcommand"),
    }
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => FormwrightConfig::load(path)?,
        None => FormwrightConfig::default(),
    };
    if matches.get_flag("log-json") {
        config = config.with_log_json(true);
    }
    init_logging(&config);

    let outcome = run(&matches)?;
    println!("{}", outcome.output);
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}
