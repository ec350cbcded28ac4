use facebot_core::config::StampConfig;
use uuid::Uuid;

/// What to do with a non-command message that matched a reaction pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reaction {
    pub message: Option<String>,
    pub stamp: Option<Uuid>,
}

impl Reaction {
    fn reply(text: &str) -> Self {
        Self { message: Some(text.to_owned()), stamp: None }
    }

    fn stamp(id: Uuid) -> Self {
        Self { message: None, stamp: Some(id) }
    }
}

const TRAILING_DECORATION: &[char] =
    &['.', '。', '、', ',', '～', '~', 'ー', '-', '！', '!'];

/// Matches the tail of a message against the auto-reaction table. Decorative
/// punctuation is ignored before matching.
pub fn tail_reaction(text: &str, stamps: &StampConfig) -> Option<Reaction> {
    let tail = text.trim_end().trim_end_matches(TRAILING_DECORATION).trim_end();

    if tail.ends_with("しにたい") || tail.ends_with("死にたい") || tail.ends_with("ﾀﾋにたい") {
        return Some(Reaction::reply("しぬな！"));
    }

    if (tail.ends_with("どね") && !tail.ends_with("けどね") && !tail.ends_with("などね"))
        || tail.ends_with(":done:")
    {
        return Some(Reaction::stamp(stamps.clap));
    }

    if tail.ends_with("おわ") {
        return Some(Reaction::stamp(stamps.cheer));
    }

    None
}
