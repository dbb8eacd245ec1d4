//! gotw binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match gotw::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            gotw::ui::output::error(format!("{:#}", err));
            ExitCode::from(gotw::cli::exit_code(&err).clamp(1, 255) as u8)
        }
    }
}
