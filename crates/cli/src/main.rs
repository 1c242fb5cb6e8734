use std::process::ExitCode;

fn main() -> ExitCode {
    slashbot_cli::run()
}
