//! finquest CLI entry point
//!
//! All logic is delegated to the CLI module. Failures are reported as a
//! JSON error line and a non-zero exit code.

use finquest::cli;

fn main() {
    if let Err(e) = cli::run() {
        let _ = cli::write_error(e.code_str(), e.message());
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
