use facebot_core::command::{Argument, CommandReader, MarkupOracle};
use serde::Serialize;

use super::{escape_json, CommandResult};

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ParsedArgument {
    Named { name: String, value: String },
    NameOnly { name: String },
    ValueOnly { value: String },
}

#[derive(Debug, Serialize)]
struct ParseReport {
    command: String,
    developer: bool,
    mention: bool,
    arguments: Vec<ParsedArgument>,
    enumerated_all: bool,
}

/// Runs the command reader over one line and prints what the dispatcher
/// would see. Stops at the first token the argument stream cannot consume.
pub fn run(line: &str, mention: bool, prefix: &str) -> CommandResult {
    let oracle = MarkupOracle;
    let Some(mut reader) = CommandReader::try_new(line, mention, prefix, &oracle) else {
        return CommandResult {
            exit_code: 1,
            output: format!(
                "{{\"error\":\"not a command\",\"detail\":\"input does not start with `{}`\"}}",
                escape_json(prefix)
            ),
        };
    };

    let mut arguments = Vec::new();
    while let Some(argument) = reader.next_argument() {
        arguments.push(match argument {
            Argument::Named { name, value } => {
                ParsedArgument::Named { name: name.to_owned(), value: value.to_owned() }
            }
            Argument::NameOnly { name } => ParsedArgument::NameOnly { name: name.to_owned() },
            Argument::ValueOnly { value } => {
                ParsedArgument::ValueOnly { value: value.to_owned() }
            }
        });
    }

    let report = ParseReport {
        command: reader.command_name().to_owned(),
        developer: reader.is_developer_command(),
        mention: reader.is_mention_triggered(),
        arguments,
        enumerated_all: reader.enumerated_all(),
    };

    let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
        format!("{{\"error\":\"serialization failed\",\"detail\":\"{}\"}}", escape_json(&error.to_string()))
    });
    CommandResult { exit_code: 0, output }
}
