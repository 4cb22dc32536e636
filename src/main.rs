use std::process::ExitCode;

fn main() -> ExitCode {
    match tagvault::cli::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
