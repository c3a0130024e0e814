use std::process::ExitCode;

fn main() -> ExitCode {
    garden_cli::run()
}
