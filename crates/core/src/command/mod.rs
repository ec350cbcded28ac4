//! Command-line reading over chat message text.
//!
//! A message like `/face count -u @alice` is tokenized by [`CommandReader`]
//! into a command name and a pull-based stream of arguments. Embedded markup
//! spans (see [`crate::markup`]) are atomic tokens: their interior never
//! participates in quoting or whitespace splitting.

mod oracle;
mod reader;

pub use oracle::{MarkupOracle, Segment, SegmentOracle};
pub use reader::{CommandReader, DEVELOPER_MARKER};

/// A flag immediately followed by its value, e.g. `-u @alice`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamedArgument<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

/// One argument pulled from the stream, tagged by shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Argument<'a> {
    Named { name: &'a str, value: &'a str },
    NameOnly { name: &'a str },
    ValueOnly { value: &'a str },
}

impl<'a> Argument<'a> {
    pub fn has_name(&self) -> bool {
        matches!(self, Self::Named { .. } | Self::NameOnly { .. })
    }

    pub fn has_value(&self) -> bool {
        matches!(self, Self::Named { .. } | Self::ValueOnly { .. })
    }

    pub fn name(&self) -> Option<&'a str> {
        match self {
            Self::Named { name, .. } | Self::NameOnly { name } => Some(name),
            Self::ValueOnly { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&'a str> {
        match self {
            Self::Named { value, .. } | Self::ValueOnly { value } => Some(value),
            Self::NameOnly { .. } => None,
        }
    }
}
