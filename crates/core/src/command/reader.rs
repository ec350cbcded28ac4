use super::{Argument, NamedArgument, Segment, SegmentOracle};

/// Marker character distinguishing developer command names (`/_face ...`).
pub const DEVELOPER_MARKER: char = '_';

/// Cursor-based tokenizer over one chat message's command text.
///
/// The reader borrows the caller's buffer for its whole life: every returned
/// argument is a subslice of the original input and nothing is copied. One
/// reader is built per incoming message and discarded after dispatch.
pub struct CommandReader<'a> {
    command_name: &'a str,
    raw_arguments: &'a str,
    oracle: &'a dyn SegmentOracle,
    index: usize,
    is_developer_command: bool,
    is_mention_triggered: bool,
}

impl<'a> CommandReader<'a> {
    /// Recognizes `raw` as a command invocation.
    ///
    /// Mention-triggered input always succeeds with an empty command name and
    /// the whole trimmed text as the argument region, so a bare @-mention
    /// still reaches the dispatcher. Otherwise the input must start with
    /// `prefix`; the first whitespace ends the command token and everything
    /// after it is the argument region.
    pub fn try_new(
        raw: &'a str,
        is_mention_triggered: bool,
        prefix: &str,
        oracle: &'a dyn SegmentOracle,
    ) -> Option<Self> {
        let trimmed = raw.trim();
        if is_mention_triggered {
            return Some(Self::from_parts("", trimmed, true, oracle));
        }

        if trimmed.is_empty() {
            return None;
        }
        let rest = trimmed.strip_prefix(prefix)?;
        match rest.find(char::is_whitespace) {
            Some(split) => Some(Self::from_parts(&rest[..split], &rest[split..], false, oracle)),
            None => Some(Self::from_parts(rest, "", false, oracle)),
        }
    }

    fn from_parts(
        raw_name: &'a str,
        raw_arguments: &'a str,
        is_mention_triggered: bool,
        oracle: &'a dyn SegmentOracle,
    ) -> Self {
        let (command_name, is_developer_command) = match raw_name.strip_prefix(DEVELOPER_MARKER) {
            Some(stripped) => (stripped, true),
            None => (raw_name, false),
        };
        Self {
            command_name,
            raw_arguments: raw_arguments.trim(),
            oracle,
            index: 0,
            is_developer_command,
            is_mention_triggered,
        }
    }

    pub fn command_name(&self) -> &'a str {
        self.command_name
    }

    pub fn is_developer_command(&self) -> bool {
        self.is_developer_command
    }

    pub fn is_mention_triggered(&self) -> bool {
        self.is_mention_triggered
    }

    pub fn has_any_arguments(&self) -> bool {
        !self.raw_arguments.is_empty()
    }

    /// True once all non-whitespace content has been consumed. Trailing
    /// whitespace is swallowed by the check so repeated queries agree.
    pub fn enumerated_all(&mut self) -> bool {
        let rest = &self.raw_arguments[self.index..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            self.index = self.raw_arguments.len();
            true
        } else {
            self.index += rest.len() - trimmed.len();
            false
        }
    }

    /// Next `-`-leading flag token, without any following value. When the
    /// upcoming token is not a flag, only leading whitespace is consumed.
    pub fn next_argument_name_only(&mut self) -> Option<&'a str> {
        let arguments: &'a str = self.raw_arguments;
        let rest = &arguments[self.index..];
        let trimmed = rest.trim_start();
        let leading = rest.len() - trimmed.len();
        if !trimmed.starts_with('-') {
            self.index += leading;
            return None;
        }

        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        self.index += leading + end;
        Some(&trimmed[..end])
    }

    /// Next positional value: an embedded span taken whole, a quoted run, or
    /// an unquoted run ending at the first whitespace outside any embedded
    /// span. Flag-shaped tokens (leading `-`) are never values; retrieve them
    /// through [`Self::next_argument_name_only`]. An unterminated quote fails
    /// without consuming anything.
    pub fn next_value_only(&mut self) -> Option<&'a str> {
        let arguments: &'a str = self.raw_arguments;
        let rest = &arguments[self.index..];
        let trimmed = rest.trim_start();
        let leading = rest.len() - trimmed.len();
        if trimmed.is_empty() {
            self.index += leading;
            return None;
        }

        match self.oracle.next_segment(trimmed) {
            Segment::Embedded(raw) => {
                self.index += leading + raw.len();
                Some(&trimmed[..raw.len()])
            }
            Segment::Text(text) if text.starts_with('"') => {
                let close = find_closing_quote(trimmed, self.oracle)?;
                self.index += leading + close + 1;
                Some(&trimmed[1..close])
            }
            Segment::Text(text) if text.starts_with('-') => {
                self.index += leading;
                None
            }
            Segment::Text(_) => match find_unquoted_end(trimmed, self.oracle) {
                Some((end, delimiter_len)) => {
                    self.index += leading + end + delimiter_len;
                    Some(&trimmed[..end])
                }
                None => {
                    self.index += leading + trimmed.len();
                    Some(trimmed)
                }
            },
        }
    }

    /// A flag immediately followed by a value. When the value is missing the
    /// flag consumption is rolled back, so the flag can still be read through
    /// [`Self::next_argument_name_only`] or [`Self::next_argument`].
    pub fn next_named_argument(&mut self) -> Option<NamedArgument<'a>> {
        let saved = self.index;
        let name = self.next_argument_name_only()?;
        match self.next_value_only() {
            Some(value) => Some(NamedArgument { name, value }),
            None => {
                self.index = saved;
                None
            }
        }
    }

    /// Next argument of any shape: name+value, then value-only, then
    /// name-only. `None` only once the input is exhausted.
    pub fn next_argument(&mut self) -> Option<Argument<'a>> {
        if let Some(NamedArgument { name, value }) = self.next_named_argument() {
            return Some(Argument::Named { name, value });
        }
        if let Some(value) = self.next_value_only() {
            return Some(Argument::ValueOnly { value });
        }
        self.next_argument_name_only().map(|name| Argument::NameOnly { name })
    }
}

/// Byte offset of the unescaped closing quote, scanning across segments.
/// Embedded spans between the quotes are skipped whole and never terminate
/// the value; escape state resets at each plain-text segment boundary.
fn find_closing_quote(text: &str, oracle: &dyn SegmentOracle) -> Option<usize> {
    let mut offset = 0;
    while offset < text.len() {
        match oracle.next_segment(&text[offset..]) {
            Segment::Embedded(raw) => offset += raw.len(),
            Segment::Text(segment) => {
                let skip = if offset == 0 { 1 } else { 0 };
                let mut escaping = false;
                for (i, ch) in segment.char_indices() {
                    if i < skip {
                        continue;
                    }
                    if escaping {
                        escaping = false;
                    } else if ch == '\\' {
                        escaping = true;
                    } else if ch == '"' {
                        return Some(offset + i);
                    }
                }
                offset += segment.len();
            }
        }
    }
    None
}

/// End of an unquoted value: offset of the first whitespace character in
/// plain text (embedded spans are opaque) plus that delimiter's width, or
/// `None` when the value runs to end of input.
fn find_unquoted_end(text: &str, oracle: &dyn SegmentOracle) -> Option<(usize, usize)> {
    let mut offset = 0;
    while offset < text.len() {
        match oracle.next_segment(&text[offset..]) {
            Segment::Embedded(raw) => offset += raw.len(),
            Segment::Text(segment) => {
                if let Some((i, ch)) =
                    segment.char_indices().find(|(_, ch)| ch.is_whitespace())
                {
                    return Some((offset + i, ch.len_utf8()));
                }
                offset += segment.len();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::super::MarkupOracle;
    use super::CommandReader;

    fn reader<'a>(args: &'a str, oracle: &'a MarkupOracle) -> CommandReader<'a> {
        let raw = format!("/x {args}");
        // Leak keeps borrows simple inside unit tests; each leaks a few bytes.
        let raw: &'a str = Box::leak(raw.into_boxed_str());
        CommandReader::try_new(raw, false, "/", oracle).expect("reader")
    }

    #[test]
    fn name_only_probe_leaves_non_flag_tokens_alone() {
        let oracle = MarkupOracle;
        let mut r = reader("  count", &oracle);

        assert_eq!(r.next_argument_name_only(), None);
        assert_eq!(r.next_value_only(), Some("count"));
        assert!(r.enumerated_all());
    }

    #[test]
    fn value_only_consumes_the_delimiting_whitespace() {
        let oracle = MarkupOracle;
        let mut r = reader("a b", &oracle);

        assert_eq!(r.next_value_only(), Some("a"));
        assert_eq!(r.next_value_only(), Some("b"));
        assert_eq!(r.next_value_only(), None);
    }

    #[test]
    fn value_only_handles_wide_whitespace_delimiters() {
        let oracle = MarkupOracle;
        let mut r = reader("a\u{3000}b", &oracle);

        assert_eq!(r.next_value_only(), Some("a"));
        assert_eq!(r.next_value_only(), Some("b"));
        assert!(r.enumerated_all());
    }

    #[test]
    fn flag_shaped_tokens_are_not_values() {
        let oracle = MarkupOracle;
        let mut r = reader("-b", &oracle);

        assert_eq!(r.next_value_only(), None);
        assert_eq!(r.next_argument_name_only(), Some("-b"));
    }

    #[test]
    fn quoted_flag_shaped_token_is_still_a_value() {
        let oracle = MarkupOracle;
        let mut r = reader(r#""-b""#, &oracle);

        assert_eq!(r.next_value_only(), Some("-b"));
        assert!(r.enumerated_all());
    }

    #[test]
    fn named_argument_rollback_restores_the_cursor_exactly() {
        let oracle = MarkupOracle;
        let mut r = reader("  -u", &oracle);

        assert_eq!(r.next_named_argument(), None);
        assert_eq!(r.next_argument_name_only(), Some("-u"));
        assert!(r.enumerated_all());
    }

    #[test]
    fn unterminated_quote_consumes_nothing() {
        let oracle = MarkupOracle;
        let mut r = reader(r#""open ended"#, &oracle);

        assert_eq!(r.next_value_only(), None);
        // The cursor did not move: the same failure repeats.
        assert_eq!(r.next_value_only(), None);
        assert!(!r.enumerated_all());
    }

    #[test]
    fn empty_prefix_never_matches_empty_input() {
        let oracle = MarkupOracle;
        assert!(CommandReader::try_new("   ", false, "", &oracle).is_none());
    }
}
