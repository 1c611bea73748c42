//! Print a generated demo snapshot as JSON.
//!
//! The output is a database root (`{"users": …, "transactions": …}`) that
//! can be imported into a real-time database or split into the files the
//! backend's `snapshot-report` tool reads.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use demo_data::{SeedRegistry, generate_demo_snapshot};

const USAGE: &str = concat!(
    "Usage: demo-data-snapshot --registry <path> --seed <name> [options]\n",
    "\n",
    "Options:\n",
    "  --registry <path>    Path to the seed registry JSON file\n",
    "  --seed <name>        Seed name to generate\n",
    "  --users <n>          Override the seed's user count\n",
    "  -h, --help           Print this help output\n",
);

struct Options {
    registry: PathBuf,
    seed: String,
    users: Option<usize>,
}

enum ParseOutcome {
    Help,
    Options(Options),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            if let Err(write_err) = writeln!(io::stderr().lock(), "{message}") {
                drop(write_err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let options = match parse_args(env::args().skip(1))? {
        ParseOutcome::Help => {
            write_stdout(USAGE);
            return Ok(());
        }
        ParseOutcome::Options(options) => options,
    };

    let registry = SeedRegistry::from_file(&options.registry).map_err(|err| err.to_string())?;
    let seed_def = registry
        .find_seed(&options.seed)
        .map_err(|err| err.to_string())?;
    let seed_def = options
        .users
        .map_or_else(|| seed_def.clone(), |users| seed_def.with_user_count(users));
    let snapshot = generate_demo_snapshot(&registry, &seed_def).map_err(|err| err.to_string())?;
    let rendered =
        serde_json::to_string_pretty(&snapshot.into_tree()).map_err(|err| err.to_string())?;
    write_stdout(&format!("{rendered}\n"));
    Ok(())
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<ParseOutcome, String> {
    let mut registry = None;
    let mut seed = None;
    let mut users = None;
    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(ParseOutcome::Help),
            "--registry" => registry = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "--seed" => seed = Some(value_for(&arg, args.next())?),
            "--users" => {
                let raw = value_for(&arg, args.next())?;
                users = Some(
                    raw.parse::<usize>()
                        .map_err(|_| format!("--users expects a count, got '{raw}'"))?,
                );
            }
            other => return Err(format!("unknown argument '{other}'\n\n{USAGE}")),
        }
    }

    Ok(ParseOutcome::Options(Options {
        registry: registry.ok_or_else(|| format!("--registry is required\n\n{USAGE}"))?,
        seed: seed.ok_or_else(|| format!("--seed is required\n\n{USAGE}"))?,
        users,
    }))
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, String> {
    value.ok_or_else(|| format!("{flag} expects a value"))
}

fn write_stdout(text: &str) {
    if let Err(err) = io::stdout().lock().write_all(text.as_bytes()) {
        drop(err);
    }
}
