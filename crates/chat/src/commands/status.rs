//! `status` - component health rendered as a table.

use facebot_core::command::CommandReader;

use super::{CommandContext, CommandError, CommandOutcome};

pub fn parse(reader: &mut CommandReader<'_>) -> Option<()> {
    reader.enumerated_all().then_some(())
}

pub async fn run(ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
    let components = ctx.health.check().await;

    let mut table = String::from("| Name | Status | Description |\n| :--- | :----: | :---------- |");
    for component in components {
        table.push_str(&format!(
            "\n| `{}` | {} | {} |",
            component.name,
            component.status.badge(),
            component.detail,
        ));
    }

    Ok(CommandOutcome::message(table))
}
