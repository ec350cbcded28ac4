use std::process::ExitCode;

fn main() -> ExitCode {
    facebot_cli::run()
}
