//! `hello` - greets the sender back, mention included.

use facebot_core::command::CommandReader;
use facebot_core::markup;

use super::{CommandContext, CommandError, CommandOutcome};

pub fn parse(reader: &mut CommandReader<'_>) -> Option<()> {
    (!reader.has_any_arguments()).then_some(())
}

pub async fn run(ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
    let mention = markup::user_mention(ctx.sender.id, &ctx.sender.name);
    Ok(CommandOutcome::message(format!("Hello! {mention}")))
}
