//! `dsl-run`: evaluate a program file and print the result as JSON.
//!
//! Usage:
//!   dsl-run [--env <env.json>] [--config <host.toml>] [--wait] <program.yaml|program.json>
//!
//! The program runs against a fresh environment, seeded from `--env` when
//! given. With `--wait` the process stays alive after printing so timers
//! started by the program keep ticking.

use dsl_core::{Environment, Program, Value};
use dsl_host::config::HostConfig;
use dsl_host::store::MemoryStore;
use dsl_host::{logging, yaml, HostError};
use std::path::PathBuf;
use std::sync::Arc;

struct Options {
    program: PathBuf,
    env: Option<PathBuf>,
    config: Option<PathBuf>,
    wait: bool,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut program: Option<PathBuf> = None;
    let mut env: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut wait = false;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--env" => env = Some(iter.next().ok_or("--env needs a file")?.into()),
            "--config" => config = Some(iter.next().ok_or("--config needs a file")?.into()),
            "--wait" => wait = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag {flag}")),
            path if program.is_none() => program = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument {extra}")),
        }
    }
    Ok(Options {
        program: program.ok_or("missing program file")?,
        env,
        config,
        wait,
    })
}

fn run(options: &Options) -> Result<Value, HostError> {
    let config = HostConfig::load(options.config.as_deref())?;
    let registry = dsl_host::registry(&config, Arc::new(MemoryStore::new()));
    let form = yaml::load_program(&options.program)?;
    let env = match &options.env {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|err| HostError::Io {
                path: path.clone(),
                source: err,
            })?;
            Environment::from_json(&serde_json::from_str(&text)?)
        }
        None => Environment::new(),
    };
    Ok(Program::with_registry(form, registry).run(&env)?)
}

fn main() {
    logging::init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("usage: dsl-run [--env <env.json>] [--config <host.toml>] [--wait] <program>");
            std::process::exit(2);
        }
    };

    match run(&options) {
        Ok(result) => {
            println!("{}", result.to_json());
            if options.wait {
                loop {
                    std::thread::park();
                }
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
