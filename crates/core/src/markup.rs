//! Inline message markup.
//!
//! The chat platform encodes rich references inside plain message text as
//! `!{"type":"user","raw":"@alice","id":"<uuid>"}` literals. This module
//! recognizes those literals, tiles a message into plain-text and embedded
//! runs, and renders the human-readable form of a message.

use std::borrow::Cow;

use serde::Deserialize;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingKind {
    UserMention,
    GroupMention,
    Channel,
}

/// A decoded embedding literal. `raw` is the exact source text, `!{` through
/// the closing brace, and borrows from the message buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Embedding<'a> {
    pub kind: EmbeddingKind,
    pub raw: &'a str,
    pub display: Cow<'a, str>,
    pub id: Uuid,
}

impl Embedding<'_> {
    /// Display text without the leading sigil (`@name` -> `name`).
    pub fn display_name(&self) -> &str {
        self.display.strip_prefix(['@', '#']).unwrap_or(&self.display)
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingPayload<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(borrow)]
    raw: Cow<'a, str>,
    id: Uuid,
}

/// Recognizes an embedding literal at the head of `text`. Anything that is
/// not a complete, well-formed literal of a known kind is plain text.
pub fn parse_head(text: &str) -> Option<Embedding<'_>> {
    if !text.starts_with("!{") {
        return None;
    }

    let json = balanced_object(&text[1..])?;
    let raw = &text[..1 + json.len()];

    let payload: EmbeddingPayload<'_> = serde_json::from_str(json).ok()?;
    let kind = match payload.kind {
        "user" => EmbeddingKind::UserMention,
        "group" => EmbeddingKind::GroupMention,
        "channel" => EmbeddingKind::Channel,
        _ => return None,
    };

    Some(Embedding { kind, raw, display: payload.raw, id: payload.id })
}

/// Builds the embedding literal for a user mention.
pub fn user_mention(id: Uuid, name: &str) -> String {
    let payload = serde_json::json!({ "type": "user", "raw": format!("@{name}"), "id": id });
    format!("!{payload}")
}

/// Returns the `{...}` slice at the head of `text`, honoring string and
/// escape boundaries so braces inside JSON strings do not count.
fn balanced_object(text: &str) -> Option<&str> {
    if !text.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Length of the plain-text run at the head of `text`: everything up to the
/// next position where a valid embedding literal begins. A lone `!` that
/// does not open a literal stays plain.
pub(crate) fn plain_run_len(text: &str) -> usize {
    for (i, ch) in text.char_indices() {
        if i == 0 {
            continue;
        }
        if ch == '!' && parse_head(&text[i..]).is_some() {
            return i;
        }
    }
    text.len()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageElement<'a> {
    Text(&'a str),
    Embedding(Embedding<'a>),
}

/// Iterator tiling a message into alternating text and embedding runs.
pub struct MessageElements<'a> {
    rest: &'a str,
}

pub fn elements(text: &str) -> MessageElements<'_> {
    MessageElements { rest: text }
}

impl<'a> Iterator for MessageElements<'a> {
    type Item = MessageElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        if let Some(embedding) = parse_head(self.rest) {
            self.rest = &self.rest[embedding.raw.len()..];
            return Some(MessageElement::Embedding(embedding));
        }
        let len = plain_run_len(self.rest);
        let run = &self.rest[..len];
        self.rest = &self.rest[len..];
        Some(MessageElement::Text(run))
    }
}

/// Renders a message with every embedding replaced by its display text.
pub fn display_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for element in elements(text) {
        match element {
            MessageElement::Text(run) => out.push_str(run),
            MessageElement::Embedding(embedding) => out.push_str(&embedding.display),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{
        display_text, elements, parse_head, user_mention, EmbeddingKind, MessageElement,
    };

    const USER_ID: &str = "20b9ce06-5e0d-4b0c-a3e7-8a1b3e2b7b10";

    fn mention(name: &str) -> String {
        format!(r#"!{{"type":"user","raw":"@{name}","id":"{USER_ID}"}}"#)
    }

    #[test]
    fn parses_user_mention_at_head() {
        let text = mention("alice") + " hello";
        let embedding = parse_head(&text).expect("mention should parse");

        assert_eq!(embedding.kind, EmbeddingKind::UserMention);
        assert_eq!(embedding.display, "@alice");
        assert_eq!(embedding.display_name(), "alice");
        assert_eq!(embedding.id, Uuid::parse_str(USER_ID).expect("uuid"));
        assert_eq!(embedding.raw, &text[..text.len() - " hello".len()]);
    }

    #[test]
    fn parses_group_and_channel_kinds() {
        let group = format!(r#"!{{"type":"group","raw":"@devs","id":"{USER_ID}"}}"#);
        let channel = format!(r##"!{{"type":"channel","raw":"#general","id":"{USER_ID}"}}"##);

        assert_eq!(parse_head(&group).expect("group").kind, EmbeddingKind::GroupMention);
        let channel_embedding = parse_head(&channel).expect("channel");
        assert_eq!(channel_embedding.kind, EmbeddingKind::Channel);
        assert_eq!(channel_embedding.display_name(), "general");
    }

    #[test]
    fn rejects_unknown_kind_and_malformed_payloads() {
        let unknown = format!(r#"!{{"type":"stamp","raw":"x","id":"{USER_ID}"}}"#);
        assert!(parse_head(&unknown).is_none());
        assert!(parse_head("!{not json}").is_none());
        assert!(parse_head(r#"!{"type":"user","raw":"@a","id":"not-a-uuid"}"#).is_none());
        assert!(parse_head(r#"!{"type":"user","raw":"@a""#).is_none());
        assert!(parse_head("plain text").is_none());
    }

    #[test]
    fn brace_matching_ignores_braces_inside_strings() {
        let text = format!(r#"!{{"type":"user","raw":"@a}}b","id":"{USER_ID}"}}tail"#);
        let embedding = parse_head(&text).expect("literal with brace in string");

        assert_eq!(embedding.display, "@a}b");
        assert!(embedding.raw.ends_with('}'));
        assert_eq!(&text[embedding.raw.len()..], "tail");
    }

    #[test]
    fn brace_matching_honors_escaped_quotes() {
        let text = format!(r#"!{{"type":"user","raw":"@a\"b","id":"{USER_ID}"}}"#);
        let embedding = parse_head(&text).expect("literal with escaped quote");
        assert_eq!(embedding.display, "@a\"b");
    }

    #[test]
    fn elements_tile_the_whole_message() {
        let text = format!("before {} after", mention("bob"));
        let tiles: Vec<_> = elements(&text).collect();

        assert_eq!(tiles.len(), 3);
        assert_eq!(tiles[0], MessageElement::Text("before "));
        assert!(matches!(&tiles[1], MessageElement::Embedding(e) if e.display == "@bob"));
        assert_eq!(tiles[2], MessageElement::Text(" after"));
    }

    #[test]
    fn display_text_replaces_embeddings() {
        let text = format!("hi {}!", mention("carol"));
        assert_eq!(display_text(&text), "hi @carol!");
    }

    #[test]
    fn user_mention_round_trips_through_parse_head() {
        let id = Uuid::parse_str(USER_ID).expect("uuid");
        let literal = user_mention(id, "dave");
        let embedding = parse_head(&literal).expect("generated mention should parse");

        assert_eq!(embedding.kind, EmbeddingKind::UserMention);
        assert_eq!(embedding.display, "@dave");
        assert_eq!(embedding.id, id);
        assert_eq!(embedding.raw.len(), literal.len());
    }
}
