//! Demo program: exit with the status given as first argument
//!
//! Usage: exit-with <code> [ignored ...]
//! Outputs: EXIT:<code>

use std::env;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    let Some(code) = args.get(1) else {
        eprintln!("Usage: {} <code>", args[0]);
        process::exit(2);
    };

    match code.parse::<i32>() {
        Ok(code) => {
            println!("EXIT:{}", code);
            process::exit(code);
        }
        Err(e) => {
            eprintln!("Error parsing '{}' as exit code: {}", code, e);
            process::exit(2);
        }
    }
}
