//! `help` - top-level command listing.

use facebot_core::command::CommandReader;

use super::{CommandError, CommandOutcome};

const HELP_TEXT: &str = r#"```plain
Usage: /<COMMAND>

    Execute a command.
    Type `/<COMMAND> --help` to display help of a command.

Commands:
    face    Face-score bookkeeping (count, rank, update).
    hello   Greeting.
    help    Displays this help message.
    join    Joins the current channel.
    leave   Leaves the current channel.
    rmmsg   Deletes a message. Requires permission.
    status  Displays component health.
```"#;

pub fn parse(reader: &mut CommandReader<'_>) -> Option<()> {
    reader.enumerated_all().then_some(())
}

pub async fn run() -> Result<CommandOutcome, CommandError> {
    Ok(CommandOutcome::message(HELP_TEXT))
}
