#![warn(unreachable_pub)]
#![warn(dead_code)]

pub mod address;
pub mod combinators;
pub mod config;
pub mod cursor;
pub mod error;
pub mod fuzzy;
pub mod hammer;
pub mod mealy;
pub mod parser;
pub mod tables;
pub mod tracing;

// Re-export common types
pub use address::{Address, RawAddress, CHECKSUM_IGNORE};
pub use config::HammerConfig;
pub use error::{HammerError, ParseError, Result};
pub use hammer::{merge_duplicates, Hammer, RecordInput};
pub use parser::{smart_batch, tokenize, Parser};
