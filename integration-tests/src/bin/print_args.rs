//! Demo program: print the received arguments
//!
//! Usage: print-args [args...]
//! Outputs: ARGS:<json array of args, program name excluded>
//!
//! Lets the test runner see exactly how the shell split a proxy's command line.

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    match serde_json::to_string(&args) {
        Ok(json) => {
            println!("ARGS:{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error encoding arguments: {}", e);
            ExitCode::from(1)
        }
    }
}
