//! dealdates - Deal milestone timelines from the command line

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = dealdates::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
