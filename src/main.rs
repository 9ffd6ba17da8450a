//! taskchain - Dependency tracking between tasks

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = taskchain::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
