//! Demo program: SHA-256 of a single file
//!
//! Usage: hash-file <path>
//! Outputs: SHA256:<hex_hash>
//!
//! Exactly one argument is accepted, so a path containing spaces only works
//! if the proxy quoted it.

use sha2::{Digest, Sha256};
use std::env;
use std::fs::File;
use std::io;
use std::process::ExitCode;

fn hash(path: &str) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <file_path> (got {} arguments)", args[0], args.len() - 1);
        return ExitCode::from(1);
    }

    match hash(&args[1]) {
        Ok(digest) => {
            println!("SHA256:{}", digest);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error hashing '{}': {}", args[1], e);
            ExitCode::from(1)
        }
    }
}
