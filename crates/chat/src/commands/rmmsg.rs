//! `rmmsg <MESSAGE>` - admin-only message deletion.

use facebot_core::command::CommandReader;
use uuid::Uuid;

use super::{parse_message_id, CommandContext, CommandError, CommandOutcome};

pub fn parse(reader: &mut CommandReader<'_>) -> Option<Uuid> {
    let value = reader.next_value_only()?;
    let message_id = parse_message_id(value)?;
    reader.enumerated_all().then_some(message_id)
}

pub async fn run(
    message_id: Uuid,
    ctx: &CommandContext<'_>,
) -> Result<CommandOutcome, CommandError> {
    if ctx.sender.id != ctx.admin_user_id {
        return Err(CommandError::PermissionDenied);
    }

    ctx.api.delete_message(message_id).await?;
    Ok(CommandOutcome::stamp(ctx.stamps.ack))
}
