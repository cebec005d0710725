//! atvars binary

use atvars::{AtVarsError, EnhancedCli};
use std::process;

fn main() {
    let mut cli = EnhancedCli::new();

    match cli.run() {
        Ok(()) => {}
        Err(AtVarsError::Io(e)) => {
            eprintln!("IO Error: {}", e);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Processing failed: {}", e);
            process::exit(1);
        }
    }
}
