pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "facebot",
    about = "Facebot operator CLI",
    long_about = "Inspect facebot configuration, run readiness checks, and debug command tokenization.",
    after_help = "Examples:\n  facebot doctor --json\n  facebot config\n  facebot parse -- \"/face count -u @alice\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Print the effective configuration, with each value's source and secrets redacted")]
    Config,
    #[command(about = "Run deployment readiness checks")]
    Doctor {
        #[arg(long, help = "Emit the report as JSON")]
        json: bool,
    },
    #[command(about = "Tokenize a command line and print the argument stream as JSON")]
    Parse {
        #[arg(long, default_value = "/", help = "Command prefix to recognize")]
        prefix: String,
        #[arg(long, help = "Treat the line as a mention-triggered invocation")]
        mention: bool,
        #[arg(help = "The raw message text, e.g. \"/face count -u @alice\"")]
        line: String,
    },
}

impl Command {
    fn execute(self) -> commands::CommandResult {
        match self {
            Self::Config => {
                commands::CommandResult { exit_code: 0, output: commands::config::run() }
            }
            Self::Doctor { json } => commands::doctor::run(json),
            Self::Parse { prefix, mention, line } => commands::parse::run(&line, mention, &prefix),
        }
    }
}

pub fn run() -> ExitCode {
    let outcome = Cli::parse().command.execute();
    println!("{}", outcome.output);
    ExitCode::from(outcome.exit_code)
}
