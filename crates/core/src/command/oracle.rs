use crate::markup;

/// One classified run at the head of a text span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Ordinary characters up to the next recognized markup boundary.
    Text(&'a str),
    /// An inline rich-text span; consumed atomically, raw source included.
    Embedded(&'a str),
}

impl<'a> Segment<'a> {
    pub fn raw(&self) -> &'a str {
        match self {
            Self::Text(raw) | Self::Embedded(raw) => raw,
        }
    }
}

/// Classifies the head of a text span. Implementations must be deterministic,
/// side-effect free, and total: any non-empty input yields a non-empty
/// segment.
pub trait SegmentOracle: Sync {
    fn next_segment<'t>(&self, text: &'t str) -> Segment<'t>;
}

/// The platform-markup oracle: embedding literals are embedded spans,
/// everything else is plain text.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkupOracle;

impl SegmentOracle for MarkupOracle {
    fn next_segment<'t>(&self, text: &'t str) -> Segment<'t> {
        if let Some(embedding) = markup::parse_head(text) {
            return Segment::Embedded(&text[..embedding.raw.len()]);
        }
        Segment::Text(&text[..markup::plain_run_len(text)])
    }
}

#[cfg(test)]
mod tests {
    use super::{MarkupOracle, Segment, SegmentOracle};

    const MENTION: &str =
        r#"!{"type":"user","raw":"@alice","id":"20b9ce06-5e0d-4b0c-a3e7-8a1b3e2b7b10"}"#;

    #[test]
    fn classifies_embedding_head_as_embedded() {
        let text = format!("{MENTION} tail");
        match MarkupOracle.next_segment(&text) {
            Segment::Embedded(raw) => assert_eq!(raw, MENTION),
            other => panic!("expected embedded segment, got {other:?}"),
        }
    }

    #[test]
    fn plain_run_stops_where_an_embedding_begins() {
        let text = format!("count {MENTION}");
        match MarkupOracle.next_segment(&text) {
            Segment::Text(run) => assert_eq!(run, "count "),
            other => panic!("expected text segment, got {other:?}"),
        }
    }

    #[test]
    fn segments_tile_the_input() {
        let text = format!("a{MENTION}b");
        let mut offset = 0;
        let mut kinds = Vec::new();
        while offset < text.len() {
            let segment = MarkupOracle.next_segment(&text[offset..]);
            assert!(!segment.raw().is_empty(), "oracle must be total");
            kinds.push(matches!(segment, Segment::Embedded(_)));
            offset += segment.raw().len();
        }
        assert_eq!(kinds, [false, true, false]);
    }

    #[test]
    fn bare_bang_is_plain_text() {
        match MarkupOracle.next_segment("!important note") {
            Segment::Text(run) => assert_eq!(run, "!important note"),
            other => panic!("expected text segment, got {other:?}"),
        }
    }
}
