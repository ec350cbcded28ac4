//! The `face` command.
//!
//! ```text
//! face {-h|--help}
//! face cancel <MESSAGE>
//! face count [{-u|--user} <USER>]
//! face rank [-a|--all | {-t|--take} <COUNT>] [-b|--include-bots]
//!           [-d|--include-suspended] [-i|--inv]
//! face update {phrase|reaction} <MESSAGE> [--add <COUNT>] [--sub <COUNT>]
//! ```

use facebot_core::command::{Argument, CommandReader};
use facebot_core::ledger::MessageFaceScore;
use facebot_core::markup::{self, EmbeddingKind};
use uuid::Uuid;

use super::{parse_message_id, CommandContext, CommandError, CommandOutcome};

const RANK_TAKE_DEFAULT: usize = 10;

const HELP_TEXT: &str = r#"```plain
Usage[0]: /face {-h|--help}

    Displays this help message.

Usage[1]: /face cancel <MESSAGE>

    Cancels the face count of the specified message.
    This command requires permission.

Arguments:
    <MESSAGE>  The id or url of the message to cancel the face count of.

Usage[2]: /face count [{-u|--user} <USER>]

    Displays the face count of the specified user.
    If no user is specified, the face count of the sender is displayed.

Usage[3]: /face rank [OPTIONS]

    Displays the face ranking of all users.

Options:
    -a, --all                Lists every user instead of the top 10.
    -t, --take <COUNT>       Limits the ranking to <COUNT> users.
    -b, --include-bots       Includes bots in the ranking.
    -d, --include-suspended  Includes suspended users in the ranking.
    -i, --inv                Displays the ranking in reverse order.

Usage[4]: /face update {phrase|reaction} <MESSAGE> [--add <COUNT>] [--sub <COUNT>]

    Rewrites the stored face counts of the specified message.
    This command requires permission.
```"#;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaceArgs {
    Help,
    Cancel { message: String },
    Count { user: Option<String> },
    Rank(RankArgs),
    Update(UpdateArgs),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RankArgs {
    pub all: bool,
    pub take: Option<usize>,
    pub include_bots: bool,
    pub include_suspended: bool,
    pub inverse: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateArgs {
    pub record: RecordKind,
    pub message: String,
    pub add: Option<u32>,
    pub sub: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Phrase,
    Reaction,
}

/// Reads the full `face` grammar from the argument stream. Any leftover
/// input fails the parse.
pub fn parse(reader: &mut CommandReader<'_>) -> Option<FaceArgs> {
    if let Some(name) = reader.next_argument_name_only() {
        if matches!(name, "-h" | "--help") && reader.enumerated_all() {
            return Some(FaceArgs::Help);
        }
        return None;
    }

    let subcommand = reader.next_value_only()?;
    let args = match subcommand {
        "cancel" => FaceArgs::Cancel { message: reader.next_value_only()?.to_owned() },
        "count" => {
            let mut user = None;
            if let Some(named) = reader.next_named_argument() {
                if !matches!(named.name, "-u" | "--user") {
                    return None;
                }
                user = Some(named.value.to_owned());
            }
            FaceArgs::Count { user }
        }
        "rank" => {
            let mut rank = RankArgs::default();
            while let Some(argument) = reader.next_argument() {
                match argument {
                    Argument::Named { name: "-t" | "--take", value } => {
                        // (-t|--take) and (-a|--all) are mutually exclusive.
                        if rank.all || rank.take.is_some() {
                            return None;
                        }
                        rank.take = Some(value.parse().ok()?);
                    }
                    Argument::NameOnly { name: "-a" | "--all" } => {
                        if rank.take.is_some() {
                            return None;
                        }
                        rank.all = true;
                    }
                    Argument::NameOnly { name: "-b" | "--include-bots" } => {
                        rank.include_bots = true;
                    }
                    Argument::NameOnly { name: "-d" | "--include-suspended" } => {
                        rank.include_suspended = true;
                    }
                    Argument::NameOnly { name: "-i" | "--inv" } => rank.inverse = true,
                    _ => return None,
                }
            }
            FaceArgs::Rank(rank)
        }
        "update" => {
            let record = match reader.next_value_only()? {
                "phrase" => RecordKind::Phrase,
                "reaction" => RecordKind::Reaction,
                _ => return None,
            };
            let message = reader.next_value_only()?.to_owned();

            let mut add = None;
            let mut sub = None;
            while let Some(named) = reader.next_named_argument() {
                let count: u32 = named.value.parse().ok()?;
                match named.name {
                    "--add" => {
                        if add.replace(count).is_some() {
                            return None;
                        }
                    }
                    "--sub" => {
                        if sub.replace(count).is_some() {
                            return None;
                        }
                    }
                    _ => return None,
                }
            }
            FaceArgs::Update(UpdateArgs { record, message, add, sub })
        }
        _ => return None,
    };

    reader.enumerated_all().then_some(args)
}

pub async fn run(
    args: FaceArgs,
    ctx: &CommandContext<'_>,
) -> Result<CommandOutcome, CommandError> {
    match args {
        FaceArgs::Help => Ok(CommandOutcome::message(HELP_TEXT)),
        FaceArgs::Cancel { message } => cancel(&message, ctx).await,
        FaceArgs::Count { user } => count(user.as_deref(), ctx).await,
        FaceArgs::Rank(rank) => rank_table(rank, ctx).await,
        FaceArgs::Update(update) => apply_update(update, ctx).await,
    }
}

async fn count(
    user: Option<&str>,
    ctx: &CommandContext<'_>,
) -> Result<CommandOutcome, CommandError> {
    let (user_id, username) = match user {
        None => (ctx.sender.id, ctx.sender.name.clone()),
        Some(argument) => resolve_user(argument, ctx).await?,
    };

    let aggregate = ctx.ledger.user_face_count(user_id).await?;
    let message = if aggregate.has_any_changes() {
        format!(
            ":@{username}: {username} currently has **{}** face(s).\n\
             - :dotted_line_face: lost {} time(s)\n\
             - :star_struck: gained {} time(s)",
            aggregate.total_score,
            aggregate.negative_total(),
            aggregate.positive_total(),
        )
    } else {
        format!(
            ":@{username}: {username} currently has **{}** face(s).\n\
             No face changes have been recorded yet.",
            aggregate.total_score,
        )
    };
    Ok(CommandOutcome::message(message))
}

/// `<USER>` is a user-mention embedding covering the whole token, or a plain
/// username resolved through the api.
async fn resolve_user(
    argument: &str,
    ctx: &CommandContext<'_>,
) -> Result<(Uuid, String), CommandError> {
    if let Some(embedding) = markup::parse_head(argument) {
        if embedding.raw.len() == argument.len() {
            if embedding.kind != EmbeddingKind::UserMention {
                return Err(CommandError::invalid("the embedding does not mention a user"));
            }
            return Ok((embedding.id, embedding.display_name().to_owned()));
        }
    }

    match ctx.api.user_by_name(argument).await? {
        Some(profile) => Ok((profile.id, profile.name)),
        None => Err(CommandError::Internal(format!("user not found: {argument}"))),
    }
}

async fn rank_table(
    args: RankArgs,
    ctx: &CommandContext<'_>,
) -> Result<CommandOutcome, CommandError> {
    let mut counts = ctx.ledger.user_face_counts().await?;
    if counts.is_empty() {
        return Ok(CommandOutcome::message("Nobody has gained or lost a face yet."));
    }

    if args.inverse {
        counts.sort_by_key(|count| count.total_score);
    } else {
        counts.sort_by_key(|count| std::cmp::Reverse(count.total_score));
    }

    let limit = if args.all { counts.len() } else { args.take.unwrap_or(RANK_TAKE_DEFAULT) };

    let mut table = String::from("Face ranking\n| Rank | User | Faces |\n| ---: | :--- | ----: |");
    let mut rank = 1usize;
    let mut emitted = 0usize;
    let mut previous_score = None::<i64>;

    for count in counts {
        if emitted >= limit {
            break;
        }
        let profile = ctx.api.user(count.user_id).await?;
        if profile.is_bot && !args.include_bots {
            continue;
        }
        if profile.suspended && !args.include_suspended {
            continue;
        }

        let shown_rank = if previous_score == Some(count.total_score) {
            "-".to_owned()
        } else {
            rank.to_string()
        };
        table.push_str(&format!(
            "\n| {shown_rank} | :@{name}: {name} | {score} |",
            name = profile.name,
            score = count.total_score,
        ));
        previous_score = Some(count.total_score);
        rank += 1;
        emitted += 1;
    }

    Ok(CommandOutcome::message(table))
}

async fn cancel(message: &str, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
    if ctx.sender.id != ctx.admin_user_id {
        return Err(CommandError::PermissionDenied);
    }
    let message_id = parse_message_id(message)
        .ok_or_else(|| CommandError::invalid(format!("invalid message id or url: {message}")))?;
    clear_record(message_id, ctx).await
}

async fn apply_update(
    args: UpdateArgs,
    ctx: &CommandContext<'_>,
) -> Result<CommandOutcome, CommandError> {
    if ctx.sender.id != ctx.admin_user_id {
        return Err(CommandError::PermissionDenied);
    }
    let message_id = parse_message_id(&args.message).ok_or_else(|| {
        CommandError::invalid(format!("invalid message id or url: {}", args.message))
    })?;

    let (add, sub) = (args.add.unwrap_or(0), args.sub.unwrap_or(0));
    if add == 0 && sub == 0 {
        // Nothing left to record: drop the record entirely.
        return clear_record(message_id, ctx).await;
    }

    let mut score = match ctx.ledger.message_face_score(message_id).await? {
        Some(existing) => existing,
        None => {
            let summary = ctx.api.message(message_id).await?;
            MessageFaceScore::new(message_id, summary.author_id)
        }
    };
    match args.record {
        RecordKind::Phrase => {
            score.positive_phrase_count = add;
            score.negative_phrase_count = sub;
        }
        RecordKind::Reaction => {
            score.positive_reaction_count = add;
            score.negative_reaction_count = sub;
        }
    }
    let positive = score.positive_total();
    let negative = score.negative_total();
    ctx.ledger.upsert_message_face_score(score).await?;

    remove_score_stamps(message_id, ctx).await?;
    if positive > 0 && !ctx.stamps.face_positive.is_nil() {
        ctx.api.add_stamp(message_id, ctx.stamps.face_positive, positive as u32).await?;
    }
    if negative > 0 && !ctx.stamps.face_negative.is_nil() {
        ctx.api.add_stamp(message_id, ctx.stamps.face_negative, negative as u32).await?;
    }

    Ok(CommandOutcome::stamp(ctx.stamps.ack))
}

async fn clear_record(
    message_id: Uuid,
    ctx: &CommandContext<'_>,
) -> Result<CommandOutcome, CommandError> {
    ctx.ledger.delete_message_face_score(message_id).await?;
    remove_score_stamps(message_id, ctx).await?;
    Ok(CommandOutcome::stamp(ctx.stamps.ack))
}

async fn remove_score_stamps(
    message_id: Uuid,
    ctx: &CommandContext<'_>,
) -> Result<(), CommandError> {
    for stamp in [ctx.stamps.face_positive, ctx.stamps.face_negative] {
        if !stamp.is_nil() {
            ctx.api.remove_stamp(message_id, stamp).await?;
        }
    }
    Ok(())
}
