//! # Khata Ledger Entry Point
//!
//! ## Usage
//! ```bash
//! khata                      # invoice list
//! khata invoice <ID>         # one invoice with its payments
//! khata statement <ID>       # khata statement
//! ```
//!
//! The actual setup is in lib.rs for better testability.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match khata_app::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
