use std::env;
use std::ffi::OsString;
use std::process;

use exec_stub::config::{self, Config};
use exec_stub::launcher::{self, Outcome};
use exec_stub::{logging, Error, UsageError};

fn print_usage() {
    eprintln!("Usage: exec-stub -o <output> -c <command> [args...]");
    eprintln!();
    eprintln!("  -o <output>     Path of the proxy executable to write");
    eprintln!("  -c <command>    Everything after -c becomes the embedded command");
    eprintln!();
    eprintln!("Running the written proxy executes the embedded command through the");
    eprintln!("shell, followed by any arguments given to the proxy.");
}

fn main() {
    let config = Config::from_env();
    logging::init(&config);
    config::warn_unknown_reader();

    let args: Vec<OsString> = env::args_os().skip(1).collect();

    let code = match launcher::launch(&config, &args) {
        Ok(Outcome::Built(output)) => {
            eprintln!("File written successfully: {}", output.display());
            0
        }
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("Error: {err}");
            match &err {
                Error::Usage(UsageError::MissingCommand) => print_usage(),
                Error::Write { path, .. } => {
                    eprintln!("The partially written file {} should be deleted.", path.display());
                }
                _ => {}
            }
            err.exit_code()
        }
    };

    process::exit(code);
}
