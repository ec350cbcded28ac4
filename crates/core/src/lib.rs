pub mod command;
pub mod config;
pub mod ledger;
pub mod markup;

pub use command::{Argument, CommandReader, MarkupOracle, NamedArgument, Segment, SegmentOracle};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use ledger::{
    FaceScoreRepository, InMemoryFaceScoreRepository, MessageFaceScore, StoreError, UserFaceCount,
};
pub use markup::{Embedding, EmbeddingKind, MessageElement};
